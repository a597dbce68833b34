use std::backtrace::Backtrace;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::ModelError;

/// AppError
///
/// The error type returned by handlers and the inner middleware. Client-facing variants
/// render the canonical status text; everything else is an infrastructure failure and
/// becomes a 500 whose detail is reported by the outermost panic/error boundary
/// (`middleware::recover`).
#[derive(Debug, Error)]
pub enum AppError {
    /// 4xx answered with the status text only (bad form encoding, CSRF failure, ...).
    #[error("client error: {0}")]
    Client(StatusCode),

    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    #[error("{0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

/// ServerError
///
/// Attached to 500 responses as a response extension. Never serialized; the recovery
/// boundary takes it out, logs it with the request's method and URI, and decides whether
/// the client may see it.
#[derive(Debug, Clone)]
pub struct ServerError {
    pub message: String,
    pub trace: String,
}

impl ServerError {
    pub fn capture(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            trace: Backtrace::force_capture().to_string(),
        }
    }

    /// Builds the generic 500 response carrying `self` as an extension.
    pub fn into_response(self) -> Response {
        let mut response = status_text_response(StatusCode::INTERNAL_SERVER_ERROR);
        response.extensions_mut().insert(self);
        response
    }
}

pub fn status_text_response(status: StatusCode) -> Response {
    let text = status.canonical_reason().unwrap_or("Unknown Status");
    (status, text.to_string()).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Client(status) => status_text_response(status),
            AppError::NotFound => status_text_response(StatusCode::NOT_FOUND),
            other => ServerError::capture(other.to_string()).into_response(),
        }
    }
}
