use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use school_core::error::{Classify, ErrorKind};
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `NOT_FOUND`,
    /// `CONFLICT`, `ILLEGAL_STATE`, `INTERNAL_ERROR`.
    pub code: &'static str,
    /// Human-readable error description.
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    NotFound(String),
    Conflict(String),
    IllegalState(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            // Duplicates are reported as 400.
            AppError::Conflict(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "CONFLICT",
                    message: msg,
                },
            ),
            AppError::IllegalState(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "ILLEGAL_STATE",
                    message: msg,
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

/// Renders an error with its whole `source()` chain, for logs.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

impl<E> From<E> for AppError
where
    E: Classify + std::error::Error,
{
    fn from(err: E) -> Self {
        match err.kind() {
            ErrorKind::NotFound => AppError::NotFound(err.to_string()),
            ErrorKind::Conflict => AppError::Conflict(err.to_string()),
            ErrorKind::IllegalState => AppError::IllegalState(err.to_string()),
            ErrorKind::InvalidInput | ErrorKind::EmptyInput => {
                AppError::Validation(err.to_string())
            }
            ErrorKind::IoFailure | ErrorKind::Internal => AppError::Internal(error_chain(&err)),
        }
    }
}

pub fn multipart_error(err: MultipartError) -> AppError {
    AppError::Validation(format!("Multipart error: {err}"))
}
