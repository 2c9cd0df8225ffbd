//! The single error boundary of the HTTP API.
//!
//! Handlers return [`ApiError`] for anything that is not a regular envelope
//! response. Its `IntoResponse` only sets the status code and stashes the
//! failure in the response extensions; [`normalize_errors`] runs around every
//! request, picks the failure up again and writes the canonical body. Panics
//! are caught there as well.
//!
//! | Failure | Status | Body |
//! |---------|--------|------|
//! | [`ApiError::Problem`] | 400 | envelope, `errors = {"Error": [detail]}` |
//! | [`ApiError::Storage`] | 500 | envelope, `message = "Database Error"`, `errors = {"Database": [classified]}` |
//! | [`ApiError::Unexpected`] / panic | 500 | problem details with the request path as `instance` |

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Request, rejection::JsonRejection},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use corpreg_core::{ApiResult, DomainError, ErrorMap};
use corpreg_infra::repository::{DATABASE_ERROR_KEY, StorageError};

use crate::app::services::ServiceError;

pub const DATABASE_ERROR_MESSAGE: &str = "Database Error";
pub const INTERNAL_ERROR_TITLE: &str = "Internal Server Error";
pub const INTERNAL_ERROR_DETAIL: &str = "An unexpected error occurred.";

#[derive(Debug, Error)]
pub enum ApiError {
    /// A declared problem; rendered as a 400 envelope.
    #[error("{title}: {detail}")]
    Problem { title: String, detail: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl ApiError {
    pub fn problem(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Problem {
            title: title.into(),
            detail: detail.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Problem { .. } => StatusCode::BAD_REQUEST,
            Self::Storage(_) | Self::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::problem(err.title(), err.detail())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::problem("Invalid request body", rejection.body_text())
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Storage(e) => Self::Storage(e),
            ServiceError::NotFound => {
                Self::Unexpected(anyhow::anyhow!("not-found outcome reached the error boundary"))
            }
        }
    }
}

/// Marker left in the response extensions for [`normalize_errors`].
#[derive(Clone)]
struct RaisedFailure(Arc<ApiError>);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = self.status().into_response();
        response.extensions_mut().insert(RaisedFailure(Arc::new(self)));
        response
    }
}

/// RFC 7807 style body used for unclassified failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDetails {
    pub title: String,
    pub detail: String,
    pub status: u16,
    pub instance: String,
}

/// Wraps every request and writes the body for any raised failure.
pub async fn normalize_errors(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();

    let mut response = match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            tracing::error!(
                path = %path,
                panic = %panic_message(panic.as_ref()),
                "request handler panicked"
            );
            return unexpected_response(&path);
        }
    };

    match response.extensions_mut().remove::<RaisedFailure>() {
        Some(RaisedFailure(failure)) => render(&failure, &path),
        None => response,
    }
}

fn render(failure: &ApiError, path: &str) -> Response {
    match failure {
        ApiError::Problem { title, detail } => {
            tracing::warn!(path = %path, title = %title, detail = %detail, "request problem");
            let body = ApiResult::<()>::problem(
                title.clone(),
                detail.clone(),
                StatusCode::BAD_REQUEST.as_u16(),
            );
            (StatusCode::BAD_REQUEST, Json(body)).into_response()
        }
        ApiError::Storage(err) => {
            tracing::error!(
                path = %path,
                code = err.code,
                message = %err.message,
                "storage failure"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, Json(storage_failure_body(err))).into_response()
        }
        ApiError::Unexpected(err) => {
            tracing::error!(path = %path, error = ?err, "unhandled failure");
            unexpected_response(path)
        }
    }
}

/// Envelope for a storage failure; the engine text is replaced by its classification.
pub fn storage_failure_body(err: &StorageError) -> ApiResult<()> {
    let mut errors = ErrorMap::new();
    errors.insert(DATABASE_ERROR_KEY.to_string(), vec![err.client_message()]);
    ApiResult::failure_with_errors(
        DATABASE_ERROR_MESSAGE,
        errors,
        Some(StatusCode::INTERNAL_SERVER_ERROR.as_u16()),
    )
}

fn unexpected_response(path: &str) -> Response {
    let body = ProblemDetails {
        title: INTERNAL_ERROR_TITLE.to_string(),
        detail: INTERNAL_ERROR_DETAIL.to_string(),
        status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        instance: path.to_string(),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
