//! Handler error type, modeled on `http-rpc-gateway::AppError`: one enum,
//! one `IntoResponse` impl, every client-visible error shaped as
//! `{"error": {"code": ..., "message": ...}}`. Internal errors are logged
//! with full detail and never echoed to the caller.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use rt_metrics_storage::StorageError;

pub enum AppError {
    BadRequest(String),
    NotFound(String),
    WrongType(String),
    Forbidden(String),
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, msg, code) = match self {
            AppError::BadRequest(s) => (StatusCode::BAD_REQUEST, s, "BAD_REQUEST"),
            AppError::NotFound(s) => (StatusCode::NOT_FOUND, s, "NOT_FOUND"),
            AppError::WrongType(s) => (StatusCode::NOT_IMPLEMENTED, s, "WRONG_TYPE"),
            AppError::Forbidden(s) => (StatusCode::FORBIDDEN, s, "FORBIDDEN"),
            AppError::Internal(e) => {
                tracing::error!(error = ?e, "internal error handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                    "INTERNAL_ERROR",
                )
            }
        };
        (
            status,
            Json(serde_json::json!({ "error": { "code": code, "message": msg } })),
        )
            .into_response()
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { id, kind } => {
                AppError::NotFound(format!("{kind} metric {id} not found"))
            }
            StorageError::InvalidValue { .. } | StorageError::Record(_) => {
                AppError::BadRequest(err.to_string())
            }
            other => AppError::Internal(other.into()),
        }
    }
}
