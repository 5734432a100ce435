use serde::Serialize;
use utoipa::ToSchema;

/// Pagination block attached to list responses. Absent fields mean the
/// endpoint does not paginate.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
        }
    }

    pub fn empty() -> Self {
        Self {
            page: None,
            per_page: None,
            total: None,
        }
    }
}

/// The envelope every endpoint returns, success or failure: a human-readable
/// message, the payload, and optional pagination. Machine handling keys off
/// the HTTP status, not the message text.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }
}

/// Payload slot of an error envelope. Mirrors the message so clients that
/// only look at `data` still see the failure.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorData {
    pub error: String,
}
