use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth as auth_dto,
        cart::{AddToCartRequest, CartItemDto, CartList},
        disputes::{CreateDisputeRequest, DisputeList, ResolveDisputeRequest},
        listings::{CreateListingRequest, ListingList, UpdateListingRequest},
        reviews::{CreateReviewRequest, ReviewList},
        transactions::{
            CreateTransactionRequest, InvoiceUrlResponse, TransactionList, WebhookAck,
            WebhookPayload,
        },
        wishlist::{AddWishlistRequest, WishlistEntryDto, WishlistList},
    },
    models::{Dispute, Listing, Review, Transaction, User},
    response::{ApiResponse, Meta},
    routes::{admin, auth, cart, disputes, health, listings, params, reviews, transactions,
        webhooks, wishlist},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::me,
        auth::update_me,
        listings::list_listings,
        listings::get_listing,
        listings::create_listing,
        listings::update_listing,
        listings::delete_listing,
        cart::cart_list,
        cart::add_to_cart,
        cart::remove_from_cart,
        wishlist::list_wishlist,
        wishlist::add_wishlist,
        wishlist::remove_wishlist,
        transactions::list_transactions,
        transactions::create_transaction,
        transactions::get_transaction,
        transactions::request_invoice,
        transactions::deliver,
        transactions::confirm,
        transactions::approve,
        webhooks::payment_callback,
        reviews::create_review,
        reviews::list_for_user,
        disputes::create_dispute,
        disputes::list_own_disputes,
        admin::list_all_transactions,
        admin::get_transaction_admin,
        admin::list_disputes,
        admin::resolve_dispute,
        admin::ban_user,
        admin::set_listing_status
    ),
    components(
        schemas(
            User,
            Listing,
            Transaction,
            Dispute,
            Review,
            auth_dto::RegisterRequest,
            auth_dto::LoginRequest,
            auth_dto::LoginResponse,
            auth_dto::UpdateProfileRequest,
            CreateListingRequest,
            UpdateListingRequest,
            ListingList,
            AddToCartRequest,
            CartItemDto,
            CartList,
            AddWishlistRequest,
            WishlistEntryDto,
            WishlistList,
            CreateTransactionRequest,
            TransactionList,
            InvoiceUrlResponse,
            WebhookPayload,
            WebhookAck,
            CreateReviewRequest,
            ReviewList,
            CreateDisputeRequest,
            ResolveDisputeRequest,
            DisputeList,
            admin::BanUserRequest,
            admin::ListingStatusRequest,
            params::Pagination,
            params::ListingQuery,
            params::TransactionListQuery,
            params::DisputeListQuery,
            Meta,
            ApiResponse<Listing>,
            ApiResponse<ListingList>,
            ApiResponse<Transaction>,
            ApiResponse<TransactionList>,
            ApiResponse<DisputeList>,
            ApiResponse<ReviewList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication and profile endpoints"),
        (name = "Listings", description = "Virtual-goods listing endpoints"),
        (name = "Cart", description = "Shopping cart endpoints"),
        (name = "Wishlist", description = "Wishlist endpoints"),
        (name = "Transactions", description = "Checkout and escrow state machine"),
        (name = "Webhooks", description = "Payment gateway callbacks"),
        (name = "Reviews", description = "Post-transaction reviews"),
        (name = "Disputes", description = "Dispute submission"),
        (name = "Admin", description = "Back-office endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
