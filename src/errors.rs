//! HTTP-facing error types.
//!
//! Every endpoint answers JSON, failures included: a human-readable
//! `message` plus an `error` detail string. [`ApiError`] is the single
//! response-side error type; domain errors from the service layer convert
//! into it with the status mapping below.

use crate::services::drive_service::DriveError;
use crate::storage::StoreError;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for request failures that keeps the message local.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub detail: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            detail: None,
        }
    }

    fn with_detail(status: StatusCode, message: impl Into<String>, detail: String) -> Self {
        Self {
            status,
            message: message.into(),
            detail: Some(detail),
        }
    }

    /// Shortcut for a 400 Bad Request.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// Shortcut for a 401 Unauthorized.
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = self.detail.unwrap_or_else(|| self.message.clone());
        let body = Json(json!({
            "message": self.message,
            "error": detail,
        }));

        (self.status, body).into_response()
    }
}

impl From<DriveError> for ApiError {
    fn from(err: DriveError) -> Self {
        let detail = err.to_string();
        match err {
            DriveError::Validation(msg) => Self::bad_request(msg),
            DriveError::NotFound(_) => {
                Self::with_detail(StatusCode::NOT_FOUND, "File not found", detail)
            }
            DriveError::PayloadTooLarge { .. } => {
                Self::with_detail(StatusCode::PAYLOAD_TOO_LARGE, "Upload too large", detail)
            }
            DriveError::SuffixesExhausted { .. } => Self::with_detail(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not allocate a free key",
                detail,
            ),
            DriveError::RelocationIncomplete { .. } => Self::with_detail(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Relocation partially completed",
                detail,
            ),
            DriveError::Store(StoreError::NotFound(_)) => {
                Self::with_detail(StatusCode::NOT_FOUND, "File not found", detail)
            }
            DriveError::Store(_) => Self::with_detail(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Storage operation failed",
                detail,
            ),
        }
    }
}

/// JSON body extractor that keeps rejections in the same `{message, error}`
/// shape instead of axum's plain-text default.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                ApiError::bad_request(format!("invalid request body: {}", rejection.body_text()))
            })?;
        Ok(ValidatedJson(inner))
    }
}
