//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that checks object-store connectivity

use crate::services::drive_service::DriveService;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::collections::HashMap;

/// `GET /healthz`
///
/// Very small liveness probe — always returns 200 OK with a plain JSON body.
/// This endpoint should be cheap and never perform I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Readiness probe that HEADs a throwaway key in the bucket. Whether the
/// probe key exists is irrelevant; any answer at all proves the store is
/// reachable and credentials resolve. HTTP 200 when the check passes,
/// HTTP 503 when it fails.
pub async fn readyz(State(service): State<DriveService>) -> impl IntoResponse {
    let store_check = match service.readiness_probe().await {
        Ok(()) => (true, None::<String>),
        Err(e) => (false, Some(format!("error: {}", e))),
    };

    let store_ok = store_check.0;

    let mut checks = HashMap::new();
    checks.insert(
        "store",
        CheckStatus {
            ok: store_ok,
            error: store_check.1,
        },
    );

    let body = ReadyResponse {
        status: if store_ok { "ok".into() } else { "error".into() },
        checks,
    };

    let status = if store_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}
