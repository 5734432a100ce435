use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::wishlist::{AddWishlistRequest, WishlistEntryDto, WishlistList},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
};

pub async fn list_wishlist(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<WishlistList>> {
    let items: Vec<WishlistEntryDto> = sqlx::query_as(
        r#"
        SELECT w.listing_id, l.title, l.game, l.price, l.stock, l.status AS listing_status
        FROM wishlist_items w
        JOIN listings l ON l.id = w.listing_id
        WHERE w.user_id = $1
        ORDER BY w.created_at DESC
        "#,
    )
    .bind(user.user_id)
    .fetch_all(pool)
    .await?;

    Ok(ApiResponse::success(
        "Wishlist",
        WishlistList { items },
        Some(Meta::empty()),
    ))
}

/// Uniqueness on (user_id, listing_id); adding twice is a no-op.
pub async fn add_to_wishlist(
    pool: &DbPool,
    user: &AuthUser,
    payload: AddWishlistRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let listing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM listings WHERE id = $1")
        .bind(payload.listing_id)
        .fetch_optional(pool)
        .await?;
    if listing.is_none() {
        return Err(AppError::NotFound);
    }

    sqlx::query(
        r#"
        INSERT INTO wishlist_items (id, user_id, listing_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, listing_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(payload.listing_id)
    .execute(pool)
    .await?;

    Ok(ApiResponse::success(
        "Added to wishlist",
        serde_json::json!({ "listing_id": payload.listing_id }),
        Some(Meta::empty()),
    ))
}

pub async fn remove_from_wishlist(
    pool: &DbPool,
    user: &AuthUser,
    listing_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM wishlist_items WHERE user_id = $1 AND listing_id = $2")
        .bind(user.user_id)
        .bind(listing_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Removed from wishlist",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
