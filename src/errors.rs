use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid credential")]
    Authentication,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("recognition failed: {0}")]
    Recognition(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Map a unique-constraint violation onto `Conflict`. The vehicle
    /// registry relies on this: the partial unique index on active plates
    /// is the authority on duplicates under concurrent registration.
    pub fn conflict_on_unique(err: sqlx::Error, msg: &str) -> AppError {
        if let sqlx::Error::Database(ref db) = err {
            if db.is_unique_violation() {
                return AppError::Conflict(msg.to_string());
            }
        }
        AppError::Database(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            AppError::Validation(m) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_request_error",
                "validation_failed",
                m.clone(),
            ),
            AppError::Authentication => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "invalid_credential",
                "invalid or missing credential".to_string(),
            ),
            AppError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                "not_found_error",
                "not_found",
                format!("{} not found", what),
            ),
            AppError::Conflict(m) => (
                StatusCode::CONFLICT,
                "conflict_error",
                "duplicate_resource",
                m.clone(),
            ),
            AppError::Recognition(m) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "recognition_error",
                "unprocessable_image",
                m.clone(),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        (status, body).into_response()
    }
}
