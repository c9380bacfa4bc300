use std::fmt::Display;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::observability::SERVER_ERRORS_TOTAL;

/// Handler failures. Client errors carry a message meant for the caller;
/// server errors carry a generic message and keep the cause for the log only.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound,
    Internal { message: &'static str, source: String },
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(message: &'static str, source: impl Display) -> Self {
        Self::Internal { message, source: source.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::NotFound => StatusCode::NOT_FOUND.into_response(),
            ApiError::Internal { message, source } => {
                error!(error = %source, "{message}");
                SERVER_ERRORS_TOTAL.with_label_values(&[message]).inc();
                (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
