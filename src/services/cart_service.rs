use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::cart::{AddToCartRequest, CartItemDto, CartList},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
};

pub async fn list_cart(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    let items: Vec<CartItemDto> = sqlx::query_as(
        r#"
        SELECT c.listing_id, l.title, l.price, l.stock, c.quantity
        FROM cart_items c
        JOIN listings l ON l.id = c.listing_id
        WHERE c.user_id = $1
        ORDER BY c.created_at DESC
        "#,
    )
    .bind(user.user_id)
    .fetch_all(pool)
    .await?;

    let total = items
        .iter()
        .map(|i| i.price * (i.quantity as i64))
        .sum::<i64>();

    Ok(ApiResponse::success(
        "Cart",
        CartList { items, total },
        Some(Meta::empty()),
    ))
}

pub async fn add_to_cart(
    pool: &DbPool,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest("Quantity must be positive".into()));
    }

    let listing: Option<(Uuid, String)> =
        sqlx::query_as("SELECT seller_id, status FROM listings WHERE id = $1")
            .bind(payload.listing_id)
            .fetch_optional(pool)
            .await?;
    let (seller_id, status) = match listing {
        Some(row) => row,
        None => return Err(AppError::NotFound),
    };
    if status != "active" {
        return Err(AppError::BadRequest("Listing is not active".into()));
    }
    if seller_id == user.user_id {
        return Err(AppError::BadRequest("Cannot add your own listing".into()));
    }

    sqlx::query(
        r#"
        INSERT INTO cart_items (id, user_id, listing_id, quantity)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, listing_id) DO UPDATE SET quantity = EXCLUDED.quantity
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(payload.listing_id)
    .bind(payload.quantity)
    .execute(pool)
    .await?;

    Ok(ApiResponse::success(
        "Added to cart",
        serde_json::json!({ "listing_id": payload.listing_id, "quantity": payload.quantity }),
        Some(Meta::empty()),
    ))
}

pub async fn remove_from_cart(
    pool: &DbPool,
    user: &AuthUser,
    listing_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND listing_id = $2")
        .bind(user.user_id)
        .bind(listing_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
