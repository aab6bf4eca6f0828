//! Defines routes for the file-manager API.
//!
//! ## Structure
//! - **File endpoints**
//!   - `POST   /upload` — store a new object (multipart `document` + `folder`)
//!   - `GET    /files` — list one page (supports folder, limit, continuationToken)
//!   - `DELETE /files` — remove an object by key
//!   - `GET    /files/download` — issue a signed download URL
//!   - `PUT    /files/rename` — rename within the current folder
//!   - `PUT    /files/move` — relocate to another folder
//!
//! - **Health endpoints**
//!   - `GET /healthz` — liveness
//!   - `GET /readyz` — store-connectivity readiness
//!
//! Write endpoints admit requests through the admin-token guard; read
//! endpoints are open. CORS is wide open so the static consoles can call
//! the API from anywhere.

use crate::{
    handlers::{
        file_handlers::{
            delete_file, download_file, list_files, move_file, rename_file, upload_document,
        },
        health_handlers::{healthz, readyz},
    },
    services::drive_service::DriveService,
};
use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;

/// Build and return the router for all file-manager routes.
///
/// The router carries shared state (`DriveService`) to all handlers; the
/// caller finishes it with `.with_state(service)`.
pub fn routes() -> Router<DriveService> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // file endpoints
        .route("/upload", post(upload_document))
        .route("/files", get(list_files).delete(delete_file))
        .route("/files/download", get(download_file))
        .route("/files/rename", put(rename_file))
        .route("/files/move", put(move_file))
        .layer(CorsLayer::permissive())
}
