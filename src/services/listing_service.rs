use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::listings::{CreateListingRequest, ListingList, UpdateListingRequest},
    entity::listings::{
        ActiveModel as ListingActive, Column as ListingCol, Entity as Listings,
        Model as ListingModel,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Listing, is_admin_role},
    response::{ApiResponse, Meta},
    routes::params::{ListingQuery, ListingSortBy, SortOrder},
    state::AppState,
};

const CATEGORIES: [&str; 3] = ["item", "gold", "service"];

pub async fn list_listings(
    state: &AppState,
    query: ListingQuery,
) -> AppResult<ApiResponse<ListingList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all().add(ListingCol::Status.eq("active"));
    if let Some(q) = query.q.as_ref().filter(|q| !q.is_empty()) {
        condition = condition.add(ListingCol::Title.contains(q.clone()));
    }
    if let Some(game) = query.game.as_ref().filter(|g| !g.is_empty()) {
        condition = condition.add(ListingCol::Game.eq(game.clone()));
    }
    if let Some(category) = query.category.as_ref().filter(|c| !c.is_empty()) {
        condition = condition.add(ListingCol::Category.eq(category.clone()));
    }
    if let Some(min) = query.min_price {
        condition = condition.add(ListingCol::Price.gte(min));
    }
    if let Some(max) = query.max_price {
        condition = condition.add(ListingCol::Price.lte(max));
    }

    let sort_by = query.sort_by.unwrap_or(ListingSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Listings::find().filter(condition);
    let col = match sort_by {
        ListingSortBy::CreatedAt => ListingCol::CreatedAt,
        ListingSortBy::Price => ListingCol::Price,
        ListingSortBy::Title => ListingCol::Title,
    };
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(col),
        SortOrder::Desc => finder.order_by_desc(col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(listing_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Listings",
        ListingList { items },
        Some(meta),
    ))
}

pub async fn get_listing(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Listing>> {
    let listing = Listings::find_by_id(id).one(&state.orm).await?;
    match listing {
        Some(l) => Ok(ApiResponse::success("Listing", listing_from_entity(l), None)),
        None => Err(AppError::NotFound),
    }
}

pub async fn create_listing(
    state: &AppState,
    user: &AuthUser,
    payload: CreateListingRequest,
) -> AppResult<ApiResponse<Listing>> {
    validate_listing_fields(payload.price, payload.stock, &payload.category)?;
    if payload.title.trim().is_empty() {
        return Err(AppError::BadRequest("Title must not be empty".into()));
    }

    let listing = ListingActive {
        id: Set(Uuid::new_v4()),
        seller_id: Set(user.user_id),
        title: Set(payload.title),
        description: Set(payload.description),
        game: Set(payload.game),
        category: Set(payload.category),
        price: Set(payload.price),
        stock: Set(payload.stock),
        status: Set("active".into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Listing created",
        listing_from_entity(listing),
        Some(Meta::empty()),
    ))
}

pub async fn update_listing(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateListingRequest,
) -> AppResult<ApiResponse<Listing>> {
    let existing = Listings::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(l) => l,
        None => return Err(AppError::NotFound),
    };
    if existing.seller_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    let price = payload.price.unwrap_or(existing.price);
    let stock = payload.stock.unwrap_or(existing.stock);
    let category = payload.category.clone().unwrap_or(existing.category.clone());
    validate_listing_fields(price, stock, &category)?;

    let mut active: ListingActive = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(game) = payload.game {
        active.game = Set(game);
    }
    active.category = Set(category);
    active.price = Set(price);
    active.stock = Set(stock);
    active.updated_at = Set(Utc::now().into());
    let listing = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Listing updated",
        listing_from_entity(listing),
        Some(Meta::empty()),
    ))
}

pub async fn delete_listing(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = Listings::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(l) => l,
        None => return Err(AppError::NotFound),
    };
    if existing.seller_id != user.user_id && !is_admin_role(&user.role) {
        return Err(AppError::Forbidden);
    }

    Listings::delete_by_id(id).exec(&state.orm).await?;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn validate_listing_fields(price: i64, stock: i32, category: &str) -> Result<(), AppError> {
    if price <= 0 {
        return Err(AppError::BadRequest("Price must be positive".into()));
    }
    if stock < 0 {
        return Err(AppError::BadRequest("Stock cannot be negative".into()));
    }
    if !CATEGORIES.contains(&category) {
        return Err(AppError::BadRequest(format!(
            "Category must be one of: {}",
            CATEGORIES.join(", ")
        )));
    }
    Ok(())
}

pub fn listing_from_entity(model: ListingModel) -> Listing {
    Listing {
        id: model.id,
        seller_id: model.seller_id,
        title: model.title,
        description: model.description,
        game: model.game,
        category: model.category,
        price: model.price,
        stock: model.stock,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_listing_fields() {
        assert!(validate_listing_fields(0, 1, "item").is_err());
        assert!(validate_listing_fields(100, -1, "gold").is_err());
        assert!(validate_listing_fields(100, 1, "weapon").is_err());
        assert!(validate_listing_fields(100, 0, "service").is_ok());
    }
}
