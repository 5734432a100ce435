use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub listing_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct CartItemDto {
    pub listing_id: Uuid,
    pub title: String,
    pub price: i64,
    pub stock: i32,
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartList {
    pub items: Vec<CartItemDto>,
    pub total: i64,
}
