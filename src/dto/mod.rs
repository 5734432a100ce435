pub mod auth;
pub mod cart;
pub mod disputes;
pub mod listings;
pub mod reviews;
pub mod transactions;
pub mod wishlist;
