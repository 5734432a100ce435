use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddWishlistRequest {
    pub listing_id: Uuid,
}

/// Wishlist row joined with its listing for display.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct WishlistEntryDto {
    pub listing_id: Uuid,
    pub title: String,
    pub game: String,
    pub price: i64,
    pub stock: i32,
    pub listing_status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WishlistList {
    pub items: Vec<WishlistEntryDto>,
}
