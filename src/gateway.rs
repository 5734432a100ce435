use std::sync::Arc;

use reqwest::{
    Client,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Prefix of the deterministic external reference sent to the gateway.
/// Re-requesting an invoice for the same transaction reuses the same
/// reference, so gateway-side retries are naturally idempotent.
pub const EXTERNAL_ID_PREFIX: &str = "trx-";

pub fn external_id_for(transaction_id: Uuid) -> String {
    format!("{EXTERNAL_ID_PREFIX}{transaction_id}")
}

/// Extract the transaction id from a webhook `external_id`. Rejects payloads
/// without the `trx-` prefix or with a malformed uuid.
pub fn parse_external_id(external_id: &str) -> Result<Uuid, AppError> {
    let raw = external_id
        .strip_prefix(EXTERNAL_ID_PREFIX)
        .ok_or_else(|| AppError::BadRequest("invalid external_id prefix".into()))?;
    Uuid::parse_str(raw)
        .map_err(|_| AppError::BadRequest("invalid transaction id in external_id".into()))
}

#[derive(Debug, Serialize)]
pub struct CreateInvoiceRequest {
    pub external_id: String,
    pub payer_email: String,
    pub description: String,
    pub amount: i64,
    pub success_redirect_url: String,
    pub failure_redirect_url: String,
    pub callback_url: String,
}

#[derive(Debug, Deserialize)]
pub struct InvoiceResponse {
    pub invoice_url: String,
}

/// Thin client for the hosted-invoice API of the payment gateway.
#[derive(Clone)]
pub struct PaymentGateway {
    base_url: String,
    client: Arc<Client>,
}

impl PaymentGateway {
    pub fn new(base_url: String, secret_key: String) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::with_capacity(2);
        let auth = HeaderValue::from_str(&format!("Bearer {secret_key}"))
            .map_err(|e| anyhow::anyhow!("invalid gateway secret key: {e}"))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Arc::new(client),
        })
    }

    /// Create a hosted invoice and return its payment page URL.
    pub async fn create_invoice(
        &self,
        req: &CreateInvoiceRequest,
    ) -> Result<InvoiceResponse, AppError> {
        let url = format!("{}/v2/invoices", self.base_url);
        tracing::debug!(external_id = %req.external_id, amount = req.amount, "creating gateway invoice");
        let response = self
            .client
            .post(url)
            .json(req)
            .send()
            .await
            .map_err(|e| AppError::Gateway {
                status: 0,
                detail: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            response.json::<InvoiceResponse>().await.map_err(|e| {
                AppError::Gateway {
                    status: status.as_u16(),
                    detail: format!("invalid invoice response: {e}"),
                }
            })
        } else {
            let detail = response.text().await.unwrap_or_default();
            Err(AppError::Gateway {
                status: status.as_u16(),
                detail,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_id_round_trips() {
        let id = Uuid::new_v4();
        assert_eq!(parse_external_id(&external_id_for(id)).unwrap(), id);
    }

    #[test]
    fn external_id_rejects_bad_prefix() {
        assert!(parse_external_id("order-123").is_err());
        assert!(parse_external_id("").is_err());
    }

    #[test]
    fn external_id_rejects_bad_uuid() {
        assert!(parse_external_id("trx-not-a-uuid").is_err());
    }
}
