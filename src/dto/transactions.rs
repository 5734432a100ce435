use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Transaction;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTransactionRequest {
    pub listing_id: Uuid,
    pub quantity: i32,
    /// Client-generated key. Resubmitting the same key returns the original
    /// transaction instead of creating and decrementing a second time.
    #[serde(default)]
    pub idempotency_key: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionList {
    pub items: Vec<Transaction>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceUrlResponse {
    pub payment_url: String,
}

/// Asynchronous payment-status callback from the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct WebhookPayload {
    pub external_id: String,
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookAck {
    pub success: bool,
}
