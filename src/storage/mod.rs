//! Object-store collaborator interface.
//!
//! The service layer only ever talks to the store through [`ObjectStore`],
//! so the actual backend (S3 in production, an in-memory map in tests) is
//! swappable behind one seam. The trait mirrors the handful of primitives
//! the store has to offer: put, existence probe, one-page listing, copy,
//! delete, and presigned-URL generation.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

pub mod s3;

#[cfg(test)]
pub mod memory;

/// Errors surfaced by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object `{0}` not found")]
    NotFound(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage client misconfigured: {0}")]
    Config(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One entry from a paged listing. Listing never carries content types;
/// the store only reports those on upload and HEAD.
#[derive(Debug, Clone)]
pub struct StoreEntry {
    pub key: String,
    pub size: i64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// One page of a listing plus the cursor for the next page, if any.
#[derive(Debug, Clone)]
pub struct ListChunk {
    pub entries: Vec<StoreEntry>,
    pub next_cursor: Option<String>,
}

/// Backend-agnostic object store operations.
///
/// The continuation cursor is an opaque capability owned by the backend;
/// callers pass it back verbatim and assume nothing about its contents.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `bytes` under `key`, overwriting any existing object.
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> StoreResult<()>;

    /// HEAD probe: does an object exist under `key`?
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Fetch one page of keys under `prefix`, at most `limit` entries.
    async fn list(
        &self,
        prefix: &str,
        limit: usize,
        cursor: Option<&str>,
    ) -> StoreResult<ListChunk>;

    /// Server-side copy of `src_key` to `dst_key`.
    async fn copy(&self, src_key: &str, dst_key: &str) -> StoreResult<()>;

    /// Delete `key`. Backends are blind deleters; callers that need
    /// missing-object detection probe with [`ObjectStore::exists`] first.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Issue a time-limited read URL for `key`, optionally overriding the
    /// response content disposition (e.g. to force a download).
    async fn sign(
        &self,
        key: &str,
        expires_in: Duration,
        disposition: Option<&str>,
    ) -> StoreResult<String>;

    /// Canonical unauthenticated URL for `key`. Only meaningful when the
    /// bucket grants public read access.
    fn public_url(&self, key: &str) -> String;
}
