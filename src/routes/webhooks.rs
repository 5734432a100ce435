use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    routing::post,
};

use crate::{
    dto::transactions::{WebhookAck, WebhookPayload},
    error::{AppError, AppResult},
    response::ApiResponse,
    services::transaction_service,
    state::AppState,
};

const CALLBACK_TOKEN_HEADER: &str = "x-callback-token";

pub fn router() -> Router<AppState> {
    Router::new().route("/payment", post(payment_callback))
}

#[utoipa::path(
    post,
    path = "/api/webhooks/payment",
    request_body = WebhookPayload,
    responses(
        (status = 200, description = "Acknowledged", body = ApiResponse<WebhookAck>),
        (status = 400, description = "Malformed external_id"),
        (status = 401, description = "Bad callback token")
    ),
    tag = "Webhooks"
)]
pub async fn payment_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<WebhookPayload>,
) -> AppResult<Json<ApiResponse<WebhookAck>>> {
    // Token check only applies when a token is configured; the gateway
    // sandbox does not send one.
    if let Some(expected) = state.config.gateway_callback_token.as_deref() {
        let presented = headers
            .get(CALLBACK_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());
        if presented != Some(expected) {
            return Err(AppError::Unauthorized);
        }
    }

    let resp = transaction_service::handle_webhook(&state, payload).await?;
    Ok(Json(resp))
}
