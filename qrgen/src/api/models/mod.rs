//! API request and response models.
//!
//! - [`qr_codes`]: QR code creation requests, list queries and record responses
//! - [`pagination`]: page-based pagination parameters
//!
//! Every JSON response is wrapped in [`ApiResponse`] (or [`MessageResponse`]
//! when there is no payload); errors use [`ErrorResponse`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

pub mod pagination;
pub mod qr_codes;

/// Success envelope around a response payload.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiResponse<T: ToSchema> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T: ToSchema> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data,
        }
    }
}

/// Success envelope without a payload.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}
