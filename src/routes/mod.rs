use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod cart;
pub mod disputes;
pub mod doc;
pub mod health;
pub mod listings;
pub mod params;
pub mod reviews;
pub mod transactions;
pub mod webhooks;
pub mod wishlist;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/listings", listings::router())
        .nest("/cart", cart::router())
        .nest("/wishlist", wishlist::router())
        .nest("/transactions", transactions::router())
        .nest("/webhooks", webhooks::router())
        .nest("/reviews", reviews::router())
        .nest("/disputes", disputes::router())
        .nest("/admin", admin::router())
}
