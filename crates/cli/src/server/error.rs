//! Error responses for the HTTP surface

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Unknown operation id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing upload, malformed form field or invalid parameter
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Upload exceeded the configured body limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// The tool ran but did not succeed
    #[error("Zeo++ failed")]
    ToolFailed { reason: &'static str, stderr: String },

    /// The tool succeeded but its output could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<zeorun_core::Error> for ApiError {
    fn from(e: zeorun_core::Error) -> Self {
        match e {
            zeorun_core::Error::InvalidInput { .. } => ApiError::BadRequest(e.to_string()),
            zeorun_core::Error::Decode { .. } | zeorun_core::Error::MissingOutput { .. } => {
                ApiError::Decode(e.to_string())
            }
            _ => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(e.body_text())
        } else {
            ApiError::BadRequest(e.body_text())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::ToolFailed { .. } | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Decode(_) => StatusCode::BAD_GATEWAY,
        };

        let message = self.to_string();
        let body = match self {
            ApiError::ToolFailed { reason, stderr } => {
                tracing::warn!(status = %status, reason, "tool run failed");
                json!({
                    "success": false,
                    "message": message,
                    "reason": reason,
                    "stderr": stderr,
                })
            }
            ApiError::Internal(_) | ApiError::Decode(_) => {
                tracing::error!(status = %status, error = %message, "server error");
                json!({ "success": false, "message": message })
            }
            _ => {
                tracing::warn!(status = %status, error = %message, "client error");
                json!({ "success": false, "message": message })
            }
        };

        (status, Json(body)).into_response()
    }
}
