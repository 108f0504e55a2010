use crate::db::errors::DbError;
use crate::qr::{encoder::EncodeError, payload::PayloadError};
use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid request data
    #[error("{message}")]
    BadRequest { message: String },

    /// Request body exceeded the configured limit
    #[error("Request body is too large")]
    PayloadTooLarge,

    /// Requested resource not found
    #[error("{resource} not found")]
    NotFound { resource: String, id: String },

    /// A collaborator (encoder or store) failed
    #[error("Failed to {operation}: {message}")]
    Dependency { operation: String, message: String },

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Error::BadRequest { message: message.into() }
    }

    pub fn qr_code_not_found(id: impl Into<String>) -> Self {
        Error::NotFound {
            resource: "QR code".to_string(),
            id: id.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Dependency { .. } | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the message sent to clients
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { message } => message.clone(),
            Error::PayloadTooLarge => self.to_string(),
            Error::NotFound { resource, .. } => format!("{resource} not found"),
            Error::Dependency { message, .. } => message.clone(),
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details - different log levels based on severity
        match &self {
            Error::Dependency { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::BadRequest { .. } | Error::PayloadTooLarge => {
                tracing::debug!("Client error: {}", self);
            }
            Error::NotFound { id, .. } => {
                tracing::debug!(id = %id, "Client error: {}", self);
            }
        }

        let body = json!({
            "success": false,
            "error": self.user_message(),
        });
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<PayloadError> for Error {
    fn from(err: PayloadError) -> Self {
        Error::bad_request(err.to_string())
    }
}

impl From<EncodeError> for Error {
    fn from(err: EncodeError) -> Self {
        Error::Dependency {
            operation: "generate QR code".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<DbError> for Error {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => Error::NotFound {
                resource: "QR code".to_string(),
                id: "unknown".to_string(),
            },
            DbError::CheckViolation { constraint, .. } => Error::bad_request(format!(
                "Invalid data provided{}",
                constraint.map(|c| format!(" ({c})")).unwrap_or_default()
            )),
            DbError::CorruptRow { table, message } => Error::Dependency {
                operation: "read QR code".to_string(),
                message: format!("Corrupt row in {table}: {message}"),
            },
            DbError::Other(e) => Error::Dependency {
                operation: "access the database".to_string(),
                message: format!("Database error: {e}"),
            },
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Error::PayloadTooLarge;
        }
        Error::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::bad_request(rejection.body_text())
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
