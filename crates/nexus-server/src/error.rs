//! HTTP mapping for desk errors.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{debug, error};

use nexus_core::DeskError;

pub type ApiResult<T> = Result<T, ApiError>;

/// JSON error body: a stable machine-readable code and a client-safe message.
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn unauthenticated() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", "authentication required")
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION", message)
    }

    /// Logged in full, reported to the client as a bare 500.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        error!(detail = %detail, "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", "internal error")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<DeskError> for ApiError {
    fn from(e: DeskError) -> Self {
        if e.is_client_error() {
            debug!(kind = e.kind(), "request rejected");
        }
        match e {
            DeskError::Unauthenticated => Self::unauthenticated(),
            DeskError::Forbidden(reason) => Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", reason),
            DeskError::NotFound(what) => {
                Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", format!("{what} not found"))
            }
            DeskError::Conflict(what) => Self::new(StatusCode::CONFLICT, "CONFLICT", what),
            DeskError::Validation(detail) => Self::validation(detail),
            DeskError::Storage(detail) => {
                error!(detail = %detail, "storage failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", "internal error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            code: self.code,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
