// SPDX-License-Identifier: MIT

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Duplicate value for unique '{0}' field")]
    Duplicate(String),

    #[error("Maps API error: {0}")]
    MapsApi(String),

    #[error("Missing required configuration: {0}")]
    Config(&'static str),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Duplicate(field) => (
                StatusCode::BAD_REQUEST,
                "duplicate_value",
                Some(format!(
                    "Duplicate value entered for unique '{}' field, please use a different value",
                    field
                )),
            ),
            AppError::MapsApi(msg) => {
                tracing::error!(error = %msg, "Maps API error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "maps_error",
                    Some(msg.clone()),
                )
            }
            AppError::Config(name) => {
                tracing::error!(name, "Missing configuration");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "configuration_error",
                    None,
                )
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        if let Some(field) = duplicate_key_field(&err) {
            return AppError::Duplicate(field);
        }
        AppError::Database(err.to_string())
    }
}

/// Extract the offending field name from a duplicate-key (E11000) write error.
fn duplicate_key_field(err: &mongodb::error::Error) -> Option<String> {
    use mongodb::error::{ErrorKind, WriteFailure};

    const DUPLICATE_KEY: i32 = 11000;

    let message = match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == DUPLICATE_KEY => &we.message,
        ErrorKind::BulkWrite(bulk) => {
            let we = bulk
                .write_errors
                .values()
                .find(|we| we.code == DUPLICATE_KEY)?;
            &we.message
        }
        _ => return None,
    };

    // Server message contains "... dup key: { <field>: <value> }"
    let field = message
        .split("dup key: {")
        .nth(1)
        .and_then(|rest| rest.split(':').next())
        .map(|f| f.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    Some(field)
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_of(AppError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AppError::InvalidToken), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_of(AppError::NotFound("plan".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::BadRequest("bad".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Duplicate("email".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::MapsApi("down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(AppError::Config("GOOGLE_MAPS_API_KEY")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_config_error_distinct_from_upstream() {
        // Operators must be able to tell "we're broken" from "they're down".
        let config = AppError::Config("GOOGLE_MAPS_API_KEY").to_string();
        let upstream = AppError::MapsApi("HTTP 500".into()).to_string();
        assert!(config.contains("configuration"));
        assert!(upstream.contains("Maps API"));
    }
}
