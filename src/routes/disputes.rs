use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::disputes::{CreateDisputeRequest, DisputeList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Dispute,
    response::ApiResponse,
    services::dispute_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_dispute))
        .route("/", get(list_own_disputes))
}

#[utoipa::path(
    post,
    path = "/api/disputes",
    request_body = CreateDisputeRequest,
    responses(
        (status = 200, description = "Dispute submitted", body = ApiResponse<Dispute>),
        (status = 400, description = "Reason too short or invalid evidence URL"),
        (status = 403, description = "Not a party to this transaction"),
        (status = 404, description = "Transaction not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Disputes"
)]
pub async fn create_dispute(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateDisputeRequest>,
) -> AppResult<Json<ApiResponse<Dispute>>> {
    let resp = dispute_service::create_dispute(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/disputes",
    responses(
        (status = 200, description = "Own disputes", body = ApiResponse<DisputeList>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Disputes"
)]
pub async fn list_own_disputes(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<DisputeList>>> {
    let resp = dispute_service::list_own_disputes(&state, &user).await?;
    Ok(Json(resp))
}
