use anyhow::Result;
use axum::{Router, extract::DefaultBodyLimit};
use std::{io::ErrorKind, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod keys;
mod models;
mod routes;
mod services;
mod storage;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config ---
    let cfg = config::AppConfig::from_env_and_args()?;

    tracing::info!(
        bucket = %cfg.bucket,
        region = %cfg.region,
        public_read = cfg.public_read,
        "Starting study-drive"
    );

    // --- Initialize the object-store client ---
    let store = storage::s3::S3Store::new(
        cfg.bucket.clone(),
        cfg.region.clone(),
        cfg.endpoint_url.clone(),
        cfg.public_read,
    )
    .await;

    // --- Initialize core service ---
    let cfg = Arc::new(cfg);
    let drive = services::drive_service::DriveService::new(Arc::new(store), cfg.clone());

    // --- Build router ---
    // The body limit sits above the per-file ceiling so oversized uploads
    // reach the service layer and come back as a clean 413 instead of an
    // opaque multipart read error.
    let app: Router = routes::routes::routes()
        .with_state(drive)
        .layer(DefaultBodyLimit::max(cfg.max_upload_bytes * 2));

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
