pub mod audit_logs;
pub mod cart_items;
pub mod disputes;
pub mod listings;
pub mod notifications;
pub mod reviews;
pub mod transactions;
pub mod users;
pub mod wishlist_items;

pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use disputes::Entity as Disputes;
pub use listings::Entity as Listings;
pub use notifications::Entity as Notifications;
pub use reviews::Entity as Reviews;
pub use transactions::Entity as Transactions;
pub use users::Entity as Users;
pub use wishlist_items::Entity as WishlistItems;
