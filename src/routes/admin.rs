use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::disputes::{DisputeList, ResolveDisputeRequest},
    dto::transactions::TransactionList,
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Dispute, Listing, Transaction},
    response::ApiResponse,
    routes::params::{DisputeListQuery, TransactionListQuery},
    services::admin_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(list_all_transactions))
        .route("/transactions/{id}", get(get_transaction_admin))
        .route("/disputes", get(list_disputes))
        .route("/disputes/{id}", patch(resolve_dispute))
        .route("/users/{id}/ban", patch(ban_user))
        .route("/listings/{id}/status", patch(set_listing_status))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BanUserRequest {
    pub banned: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListingStatusRequest {
    pub status: String,
}

#[utoipa::path(
    get,
    path = "/api/admin/transactions",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by order status")
    ),
    responses(
        (status = 200, description = "All transactions", body = ApiResponse<TransactionList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_all_transactions(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<TransactionListQuery>,
) -> AppResult<Json<ApiResponse<TransactionList>>> {
    let resp = admin_service::list_all_transactions(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/transactions/{id}",
    params(("id" = Uuid, Path, description = "Transaction ID")),
    responses(
        (status = 200, description = "Any transaction", body = ApiResponse<Transaction>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_transaction_admin(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Transaction>>> {
    let resp = admin_service::get_transaction_admin(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/disputes",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "pending, resolved or refunded")
    ),
    responses(
        (status = 200, description = "All disputes", body = ApiResponse<DisputeList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_disputes(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<DisputeListQuery>,
) -> AppResult<Json<ApiResponse<DisputeList>>> {
    let resp = admin_service::list_disputes(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/disputes/{id}",
    params(("id" = Uuid, Path, description = "Dispute ID")),
    request_body = ResolveDisputeRequest,
    responses(
        (status = 200, description = "Dispute adjudicated", body = ApiResponse<Dispute>),
        (status = 400, description = "Invalid status or already adjudicated"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn resolve_dispute(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ResolveDisputeRequest>,
) -> AppResult<Json<ApiResponse<Dispute>>> {
    let resp = admin_service::resolve_dispute(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/users/{id}/ban",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = BanUserRequest,
    responses(
        (status = 200, description = "Ban state updated"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn ban_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<BanUserRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = admin_service::set_user_banned(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/listings/{id}/status",
    params(("id" = Uuid, Path, description = "Listing ID")),
    request_body = ListingStatusRequest,
    responses(
        (status = 200, description = "Listing moderated", body = ApiResponse<Listing>),
        (status = 400, description = "Invalid status"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn set_listing_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ListingStatusRequest>,
) -> AppResult<Json<ApiResponse<Listing>>> {
    let resp = admin_service::set_listing_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
