//! Write-endpoint access gate.
//!
//! Access posture is configuration, not code: when no admin token is
//! configured, write endpoints stay open (the public-drafts posture);
//! when one is set, mutating requests must carry it in `x-admin-token`.
//! Read endpoints never go through this guard.

use crate::errors::ApiError;
use crate::services::drive_service::DriveService;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Header carrying the shared admin token.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Extractor that admits a request to a write endpoint.
#[derive(Debug, Clone, Copy)]
pub struct AdminGuard;

impl FromRequestParts<DriveService> for AdminGuard {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &DriveService,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.admin_token() else {
            return Ok(AdminGuard);
        };

        let given = parts
            .headers
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());

        if given == Some(expected) {
            Ok(AdminGuard)
        } else {
            Err(ApiError::unauthorized("Admin token required"))
        }
    }
}
