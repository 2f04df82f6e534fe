//! Error handling for the YieldForecast dashboard
//!
//! Forecast-flow failures are caught inside the dashboard operations and turned
//! into a status message plus a notification; only request-level failures are
//! rendered through [`IntoResponse`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Input errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    // Backend answered 200 but reported a failure in the body
    #[error("{0}")]
    Domain(String),

    // Backend answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    // Request never completed (connection refused, timeout, ...)
    #[error("Network error: {0}")]
    Transport(String),

    // Response body was not the JSON we expected
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Status line shown to the user
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation { message, .. } => message.clone(),
            AppError::Domain(message) => message.clone(),
            AppError::Http { status: 401, .. } => {
                "Not authenticated. Please log in first.".to_string()
            }
            AppError::Http { status, .. } => format!("Server returned an error: {}", status),
            AppError::Transport(_) => {
                "Network error. Please check your connection and try again.".to_string()
            }
            AppError::Parse(_) => "Error parsing data from server".to_string(),
            AppError::NotFound(resource) => format!("{} not found", resource),
            AppError::Configuration(_) | AppError::Internal(_) => {
                "An internal error occurred".to_string()
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by_key(|(field, _)| *field);
        match fields.first() {
            Some((field, errs)) => {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid {}", field));
                AppError::validation(field, message)
            }
            None => AppError::validation("form", "Invalid input"),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, field) = match &self {
            AppError::Validation { field, .. } => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", Some(field.clone()))
            }
            AppError::Domain(_) => (StatusCode::UNPROCESSABLE_ENTITY, "BACKEND_REJECTED", None),
            AppError::Http { status, .. } => {
                // Client errors from the backend pass through; anything else is a bad gateway
                let status = StatusCode::from_u16(*status)
                    .ok()
                    .filter(|s| s.is_client_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY);
                (status, "BACKEND_ERROR", None)
            }
            AppError::Transport(_) => (StatusCode::BAD_GATEWAY, "BACKEND_UNREACHABLE", None),
            AppError::Parse(_) => (StatusCode::BAD_GATEWAY, "BACKEND_INVALID_RESPONSE", None),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", None),
            AppError::Configuration(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR", None)
            }
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", None),
        };

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::warn!("Request failed: {}", self);
        }

        let detail = ErrorDetail {
            code: code.to_string(),
            message: self.user_message(),
            field,
        };
        (status, Json(ErrorResponse { error: detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
