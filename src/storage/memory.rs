//! In-memory [`ObjectStore`](super::ObjectStore) used by the test suites.
//!
//! Keys live in a `BTreeMap`, so listings come back in the same
//! lexicographic order a real bucket would produce. Pages use the last
//! returned key as an opaque start-after cursor. Individual operations can
//! be made to fail once, which is how the relocation partial-failure
//! window gets exercised.

use super::{ListChunk, ObjectStore, StoreEntry, StoreError, StoreResult};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
struct MemObject {
    data: Bytes,
    content_type: String,
    last_modified: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MemState {
    objects: BTreeMap<String, MemObject>,
    fail_next_copy: bool,
    fail_next_delete: bool,
    fail_next_list: bool,
    list_calls: usize,
    last_list_limit: Option<usize>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object directly, bypassing the trait.
    pub fn insert(&self, key: &str, data: &[u8], content_type: &str) {
        let mut state = self.inner.lock().unwrap();
        state.objects.insert(
            key.to_string(),
            MemObject {
                data: Bytes::copy_from_slice(data),
                content_type: content_type.to_string(),
                last_modified: Utc::now(),
            },
        );
    }

    /// Raw bytes and content type currently stored under `key`.
    pub fn contents(&self, key: &str) -> Option<(Bytes, String)> {
        let state = self.inner.lock().unwrap();
        state
            .objects
            .get(key)
            .map(|obj| (obj.data.clone(), obj.content_type.clone()))
    }

    pub fn fail_next_copy(&self) {
        self.inner.lock().unwrap().fail_next_copy = true;
    }

    pub fn fail_next_delete(&self) {
        self.inner.lock().unwrap().fail_next_delete = true;
    }

    pub fn fail_next_list(&self) {
        self.inner.lock().unwrap().fail_next_list = true;
    }

    pub fn list_calls(&self) -> usize {
        self.inner.lock().unwrap().list_calls
    }

    pub fn last_list_limit(&self) -> Option<usize> {
        self.inner.lock().unwrap().last_list_limit
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> StoreResult<()> {
        let mut state = self.inner.lock().unwrap();
        state.objects.insert(
            key.to_string(),
            MemObject {
                data: bytes,
                content_type: content_type.to_string(),
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.inner.lock().unwrap().objects.contains_key(key))
    }

    async fn list(
        &self,
        prefix: &str,
        limit: usize,
        cursor: Option<&str>,
    ) -> StoreResult<ListChunk> {
        let mut state = self.inner.lock().unwrap();
        state.list_calls += 1;
        state.last_list_limit = Some(limit);
        if state.fail_next_list {
            state.fail_next_list = false;
            return Err(StoreError::Unavailable("injected list failure".into()));
        }

        let mut matching = state
            .objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .filter(|(key, _)| cursor.is_none_or(|after| key.as_str() > after))
            .map(|(key, obj)| StoreEntry {
                key: key.clone(),
                size: obj.data.len() as i64,
                last_modified: Some(obj.last_modified),
            })
            .take(limit + 1)
            .collect::<Vec<_>>();

        let next_cursor = if matching.len() > limit {
            matching.truncate(limit);
            matching.last().map(|entry| entry.key.clone())
        } else {
            None
        };

        Ok(ListChunk {
            entries: matching,
            next_cursor,
        })
    }

    async fn copy(&self, src_key: &str, dst_key: &str) -> StoreResult<()> {
        let mut state = self.inner.lock().unwrap();
        if state.fail_next_copy {
            state.fail_next_copy = false;
            return Err(StoreError::Unavailable("injected copy failure".into()));
        }
        let src = state
            .objects
            .get(src_key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(src_key.to_string()))?;
        state.objects.insert(dst_key.to_string(), src);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut state = self.inner.lock().unwrap();
        if state.fail_next_delete {
            state.fail_next_delete = false;
            return Err(StoreError::Unavailable("injected delete failure".into()));
        }
        state.objects.remove(key);
        Ok(())
    }

    async fn sign(
        &self,
        key: &str,
        expires_in: Duration,
        disposition: Option<&str>,
    ) -> StoreResult<String> {
        let mut url = format!("memory://{}?expires={}", key, expires_in.as_secs());
        if let Some(value) = disposition {
            url.push_str("&disposition=");
            url.push_str(value);
        }
        Ok(url)
    }

    fn public_url(&self, key: &str) -> String {
        format!("memory://{}", key)
    }
}
