use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Dispute;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDisputeRequest {
    pub transaction_id: Uuid,
    pub reason: String,
    pub evidence_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResolveDisputeRequest {
    /// Either "resolved" or "refunded".
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DisputeList {
    pub items: Vec<Dispute>,
}
