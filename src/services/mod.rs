pub mod admin_service;
pub mod auth_service;
pub mod cart_service;
pub mod dispute_service;
pub mod listing_service;
pub mod review_service;
pub mod transaction_service;
pub mod wishlist_service;
