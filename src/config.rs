use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments; CLI wins.
///
/// AWS credentials are not configured here — the S3 client picks them up
/// from the ambient environment (env vars, profile, instance role).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Destination bucket. Required; there is no useful default.
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible providers (MinIO, Spaces, ...).
    pub endpoint_url: Option<String>,
    /// Access posture: serve public object URLs instead of signed ones and
    /// upload with a public-read ACL. Default is private + signed URLs.
    pub public_read: bool,
    /// Lifetime of issued signed URLs, in seconds.
    pub url_expiry_secs: u64,
    /// Upload byte ceiling, enforced per file.
    pub max_upload_bytes: usize,
    /// Listing-cache TTL in seconds; 0 disables the cache.
    pub list_cache_ttl_secs: u64,
    /// Shared token gating write endpoints; unset leaves them open.
    pub admin_token: Option<String>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Study Drive file-manager API over object storage")]
pub struct Args {
    /// Host to bind to (overrides STUDY_DRIVE_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides STUDY_DRIVE_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Destination bucket (overrides STUDY_DRIVE_BUCKET)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Bucket region (overrides STUDY_DRIVE_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Custom S3-compatible endpoint URL (overrides STUDY_DRIVE_ENDPOINT_URL)
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// Serve public object URLs instead of signed ones
    #[arg(long)]
    pub public_read: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into an AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("STUDY_DRIVE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = parse_env("STUDY_DRIVE_PORT", 4000u16)?;
        let env_region = env::var("STUDY_DRIVE_REGION").unwrap_or_else(|_| "us-east-1".into());
        let env_endpoint = env::var("STUDY_DRIVE_ENDPOINT_URL").ok();
        let env_public_read = env::var("STUDY_DRIVE_PUBLIC_READ")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        let url_expiry_secs = parse_env("STUDY_DRIVE_URL_EXPIRY_SECS", 3600u64)?;
        let max_upload_bytes = parse_env("STUDY_DRIVE_MAX_UPLOAD_BYTES", 25 * 1024 * 1024usize)?;
        let list_cache_ttl_secs = parse_env("STUDY_DRIVE_LIST_CACHE_TTL_SECS", 10u64)?;
        let admin_token = env::var("STUDY_DRIVE_ADMIN_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());

        // --- Merge ---
        let bucket = args
            .bucket
            .or_else(|| env::var("STUDY_DRIVE_BUCKET").ok())
            .filter(|b| !b.is_empty())
            .context("no destination bucket configured; set STUDY_DRIVE_BUCKET or pass --bucket")?;

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            bucket,
            region: args.region.unwrap_or(env_region),
            endpoint_url: args.endpoint_url.or(env_endpoint),
            public_read: args.public_read || env_public_read,
            url_expiry_secs,
            max_upload_bytes,
            list_cache_ttl_secs,
            admin_token,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Read an env var and parse it, falling back to `default` when unset.
fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", name)),
    }
}
