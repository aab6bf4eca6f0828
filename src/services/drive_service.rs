//! DriveService — the file-manager core over a flat object store.
//!
//! Everything human-facing (folders, display names, collision suffixes)
//! is derived from the key convention in `crate::keys`; the store itself
//! only ever sees opaque keys. The service owns four behaviors on top of
//! the store primitives:
//!
//! - collision-free key allocation on upload (sequential existence probes)
//! - folder-scoped paged listings with a short-lived read-through cache
//! - rename/move as copy-then-delete, since the store has no atomic rename
//! - signed (or public, depending on posture) read URLs
//!
//! The service performs no retries; every store failure propagates to the
//! caller as a typed error.

use crate::config::AppConfig;
use crate::keys;
use crate::models::file::{FileSummary, ListPage, RelocatedFile};
use crate::services::listing_cache::ListingCache;
use crate::storage::{ObjectStore, StoreError};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default page size when the caller does not ask for one.
const DEFAULT_PAGE_SIZE: usize = 50;

/// Hard ceiling on a single listing page.
const MAX_PAGE_SIZE: usize = 200;

/// Upper bound on collision probes before giving up. The probe loop is a
/// check-then-act against the store and must terminate even when a
/// misbehaving backend reports every candidate as taken.
const MAX_COLLISION_PROBES: usize = 1000;

#[derive(Debug, Error)]
pub enum DriveError {
    #[error("{0}")]
    Validation(String),
    #[error("object `{0}` not found")]
    NotFound(String),
    #[error("upload of {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { size: usize, max: usize },
    #[error("no free key for `{base}` after {attempts} probes")]
    SuffixesExhausted { base: String, attempts: usize },
    #[error(
        "copied `{src}` to `{dst}` but deleting the source failed: {detail}; both keys currently exist"
    )]
    RelocationIncomplete {
        src: String,
        dst: String,
        detail: String,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type DriveResult<T> = Result<T, DriveError>;

/// Shared per-request handle onto the store, the listing cache, and the
/// runtime configuration. Cheap to clone; axum clones it per request.
#[derive(Clone)]
pub struct DriveService {
    store: Arc<dyn ObjectStore>,
    cache: Arc<ListingCache>,
    config: Arc<AppConfig>,
}

impl DriveService {
    pub fn new(store: Arc<dyn ObjectStore>, config: Arc<AppConfig>) -> Self {
        let cache = Arc::new(ListingCache::new(Duration::from_secs(
            config.list_cache_ttl_secs,
        )));
        Self {
            store,
            cache,
            config,
        }
    }

    pub fn admin_token(&self) -> Option<&str> {
        self.config.admin_token.as_deref()
    }

    /// Store an uploaded file under a collision-free key in `folder`.
    pub async fn upload(
        &self,
        folder: Option<&str>,
        file_name: &str,
        content_type: Option<&str>,
        bytes: Bytes,
    ) -> DriveResult<FileSummary> {
        let size = bytes.len();
        let max = self.config.max_upload_bytes;
        if size > max {
            return Err(DriveError::PayloadTooLarge { size, max });
        }
        if file_name.trim().is_empty() {
            return Err(DriveError::Validation("uploaded file has no name".into()));
        }

        let folder = keys::normalize_folder(folder.unwrap_or(""));
        let (stem, raw_ext) = keys::split_file_name(file_name.trim());
        let base = keys::sanitize_base_name(stem);
        let ext = keys::sanitize_extension(raw_ext);

        let key = self.next_free_key(&folder, &base, &ext).await?;

        let content_type = match content_type.filter(|ct| !ct.is_empty()) {
            Some(ct) => ct.to_string(),
            None => mime_guess::from_path(file_name)
                .first_or_octet_stream()
                .to_string(),
        };

        self.store.put(&key, bytes, &content_type).await?;
        self.cache.clear();

        let url = self.item_url(&key).await?;
        let parsed = keys::parse_key(&key).map_err(|e| DriveError::Validation(e.to_string()))?;

        Ok(FileSummary {
            key,
            folder: parsed.folder,
            name: parsed.name,
            size: size as i64,
            last_modified: None,
            content_type: Some(content_type),
            url: Some(url),
        })
    }

    /// One page of files, optionally scoped to a folder.
    ///
    /// `cursor` is the store's raw continuation token from a previous page.
    /// Pages are served from the cache when a fresh identical query exists.
    pub async fn list(
        &self,
        folder: Option<&str>,
        limit: Option<usize>,
        cursor: Option<&str>,
        include_urls: bool,
    ) -> DriveResult<ListPage> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let prefix = match folder {
            Some(folder) => format!("{}{}/", keys::KEY_PREFIX, keys::normalize_folder(folder)),
            None => keys::KEY_PREFIX.to_string(),
        };

        let cache_key = format!(
            "{}|{}|{}|{}",
            prefix,
            limit,
            cursor.unwrap_or(""),
            include_urls
        );
        if let Some(page) = self.cache.get(&cache_key) {
            return Ok(page);
        }

        let chunk = self.store.list(&prefix, limit, cursor).await?;

        let mut files = Vec::with_capacity(chunk.entries.len());
        for entry in chunk.entries {
            // Some consoles create zero-byte placeholder entries for the
            // folder itself; those carry no file identity.
            if entry.key == prefix {
                continue;
            }
            let parsed = match keys::parse_key(&entry.key) {
                Ok(parsed) => parsed,
                Err(err) => {
                    debug!(key = %entry.key, %err, "skipping unparseable key in listing");
                    continue;
                }
            };
            let url = if include_urls {
                Some(self.item_url(&entry.key).await?)
            } else {
                None
            };
            files.push(FileSummary {
                key: entry.key,
                folder: parsed.folder,
                name: parsed.name,
                size: entry.size,
                last_modified: entry.last_modified,
                content_type: None,
                url,
            });
        }

        let page = ListPage {
            files,
            next_cursor: chunk.next_cursor,
        };
        self.cache.set(cache_key, page.clone());
        Ok(page)
    }

    /// Remove one object. Deleting a key that does not exist is an error,
    /// not a silent success, so the store's blind delete gets an existence
    /// probe in front of it.
    pub async fn delete(&self, key: &str) -> DriveResult<()> {
        if !self.store.exists(key).await? {
            return Err(DriveError::NotFound(key.to_string()));
        }
        self.store.delete(key).await?;
        self.cache.clear();
        Ok(())
    }

    /// Rename within the current folder, keeping the extension.
    pub async fn rename(&self, key: &str, new_name: &str) -> DriveResult<RelocatedFile> {
        let parsed = keys::parse_key(key).map_err(|e| DriveError::Validation(e.to_string()))?;
        let trimmed = new_name.trim();
        if trimmed.is_empty() {
            return Err(DriveError::Validation("new name must not be empty".into()));
        }

        let (_, raw_ext) = keys::split_file_name(&parsed.name);
        let base = keys::sanitize_base_name(trimmed);
        let ext = keys::sanitize_extension(raw_ext);
        let dst = keys::build_key(&parsed.folder, &base, &ext);
        if dst == key {
            return Err(DriveError::Validation(
                "new name matches the current name".into(),
            ));
        }

        self.relocate(key, &dst).await?;
        self.relocated(dst).await
    }

    /// Move to another folder, keeping the filename.
    pub async fn move_to_folder(&self, key: &str, new_folder: &str) -> DriveResult<RelocatedFile> {
        let parsed = keys::parse_key(key).map_err(|e| DriveError::Validation(e.to_string()))?;
        let folder = keys::normalize_folder(new_folder);
        let dst = keys::build_key(&folder, &parsed.name, "");
        if dst == key {
            return Err(DriveError::Validation(
                "object is already in that folder".into(),
            ));
        }

        self.relocate(key, &dst).await?;
        self.relocated(dst).await
    }

    /// Issue a read URL for one object. No existence probe: signing a key
    /// that is missing simply yields a URL that 404s when fetched.
    pub async fn download_url(&self, key: &str, inline: bool) -> DriveResult<String> {
        if key.trim().is_empty() {
            return Err(DriveError::Validation("key must not be empty".into()));
        }
        if self.config.public_read {
            return Ok(self.store.public_url(key));
        }
        let disposition = if inline {
            None
        } else {
            let name = match keys::parse_key(key) {
                Ok(parsed) => parsed.name,
                Err(_) => key.rsplit('/').next().unwrap_or(key).to_string(),
            };
            Some(format!("attachment; filename=\"{name}\""))
        };
        let url = self
            .store
            .sign(key, self.expiry(), disposition.as_deref())
            .await?;
        Ok(url)
    }

    /// Cheap connectivity probe for the readiness endpoint: a HEAD against
    /// a key that is never written. Any non-error answer means the store
    /// is reachable and credentials work.
    pub async fn readiness_probe(&self) -> Result<(), StoreError> {
        let probe_key = format!("{}.readyz-{}", keys::KEY_PREFIX, uuid::Uuid::new_v4());
        self.store.exists(&probe_key).await.map(|_| ())
    }

    /// Find the first free key in `base`, `base(1)`, `base(2)`, ...
    ///
    /// Strictly sequential: each probe decides the next candidate. Two
    /// concurrent uploads of the same name can both see the same candidate
    /// as free and overwrite each other; the store primitive offers no
    /// create-if-absent, so that race is accepted.
    async fn next_free_key(&self, folder: &str, base: &str, ext: &str) -> DriveResult<String> {
        let mut candidate = keys::build_key(folder, base, ext);
        for attempt in 1..=MAX_COLLISION_PROBES {
            if !self.store.exists(&candidate).await? {
                return Ok(candidate);
            }
            candidate = keys::build_key(folder, &format!("{base}({attempt})"), ext);
        }
        Err(DriveError::SuffixesExhausted {
            base: base.to_string(),
            attempts: MAX_COLLISION_PROBES,
        })
    }

    /// Copy-then-delete relocation.
    ///
    /// Phase one copies the source to the destination; a failure there
    /// leaves the source untouched and nothing is lost. Phase two deletes
    /// the source; a failure there leaves both keys present, which is
    /// surfaced as [`DriveError::RelocationIncomplete`] and not rolled
    /// back. The copy is awaited before the delete is issued.
    async fn relocate(&self, src: &str, dst: &str) -> DriveResult<()> {
        self.store.copy(src, dst).await.map_err(|e| match e {
            StoreError::NotFound(_) => DriveError::NotFound(src.to_string()),
            other => DriveError::Store(other),
        })?;

        if let Err(e) = self.store.delete(src).await {
            self.cache.clear();
            return Err(DriveError::RelocationIncomplete {
                src: src.to_string(),
                dst: dst.to_string(),
                detail: e.to_string(),
            });
        }

        self.cache.clear();
        Ok(())
    }

    async fn relocated(&self, dst: String) -> DriveResult<RelocatedFile> {
        let url = self.item_url(&dst).await?;
        let parsed = keys::parse_key(&dst).map_err(|e| DriveError::Validation(e.to_string()))?;
        Ok(RelocatedFile {
            key: dst,
            folder: parsed.folder,
            name: parsed.name,
            url: Some(url),
        })
    }

    /// Read URL for one item under the configured access posture.
    async fn item_url(&self, key: &str) -> Result<String, StoreError> {
        if self.config.public_read {
            Ok(self.store.public_url(key))
        } else {
            self.store.sign(key, self.expiry(), None).await
        }
    }

    fn expiry(&self) -> Duration {
        Duration::from_secs(self.config.url_expiry_secs)
    }
}
