use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::transactions::{CreateTransactionRequest, InvoiceUrlResponse, TransactionList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Transaction,
    response::ApiResponse,
    routes::params::TransactionListQuery,
    services::transaction_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_transactions))
        .route("/", post(create_transaction))
        .route("/{id}", get(get_transaction))
        .route("/{id}/invoice", post(request_invoice))
        .route("/{id}/deliver", post(deliver))
        .route("/{id}/confirm", post(confirm))
        .route("/{id}/approve", post(approve))
}

#[utoipa::path(
    get,
    path = "/api/transactions",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by order status")
    ),
    responses(
        (status = 200, description = "Own transactions as buyer or seller", body = ApiResponse<TransactionList>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<TransactionListQuery>,
) -> AppResult<Json<ApiResponse<TransactionList>>> {
    let resp = transaction_service::list_transactions(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/transactions",
    request_body = CreateTransactionRequest,
    responses(
        (status = 200, description = "Pending transaction created, stock decremented", body = ApiResponse<Transaction>),
        (status = 400, description = "Insufficient stock or invalid request"),
        (status = 404, description = "Listing not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn create_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateTransactionRequest>,
) -> AppResult<Json<ApiResponse<Transaction>>> {
    let resp = transaction_service::create_transaction(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/transactions/{id}",
    params(("id" = Uuid, Path, description = "Transaction ID")),
    responses(
        (status = 200, description = "Transaction detail", body = ApiResponse<Transaction>),
        (status = 403, description = "Not a party to this transaction"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn get_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Transaction>>> {
    let resp = transaction_service::get_transaction(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/transactions/{id}/invoice",
    params(("id" = Uuid, Path, description = "Transaction ID")),
    responses(
        (status = 200, description = "Hosted payment page URL", body = ApiResponse<InvoiceUrlResponse>),
        (status = 403, description = "Not the buyer"),
        (status = 404, description = "Transaction or listing not found"),
        (status = 502, description = "Gateway error")
    ),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn request_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<InvoiceUrlResponse>>> {
    let resp = transaction_service::request_invoice(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/transactions/{id}/deliver",
    params(("id" = Uuid, Path, description = "Transaction ID")),
    responses(
        (status = 200, description = "Marked delivered", body = ApiResponse<Transaction>),
        (status = 400, description = "Order not paid"),
        (status = 403, description = "Not the seller")
    ),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn deliver(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Transaction>>> {
    let resp = transaction_service::deliver(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/transactions/{id}/confirm",
    params(("id" = Uuid, Path, description = "Transaction ID")),
    responses(
        (status = 200, description = "Confirmed by buyer", body = ApiResponse<Transaction>),
        (status = 400, description = "Order not delivered yet"),
        (status = 403, description = "Not the buyer")
    ),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn confirm(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Transaction>>> {
    let resp = transaction_service::confirm(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/transactions/{id}/approve",
    params(("id" = Uuid, Path, description = "Transaction ID")),
    responses(
        (status = 200, description = "Approved, terminal state", body = ApiResponse<Transaction>),
        (status = 400, description = "Order not confirmed by buyer"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn approve(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Transaction>>> {
    let resp = transaction_service::approve(&state, &user, id).await?;
    Ok(Json(resp))
}
