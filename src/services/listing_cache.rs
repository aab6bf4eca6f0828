//! Short-lived read-through cache for listing pages.
//!
//! Entries expire lazily on read; there is no sweep task because the TTL
//! is seconds-scale and the map stays small. Every write path clears the
//! whole cache rather than hunting for affected prefixes. A TTL of zero
//! disables caching entirely.

use crate::models::file::ListPage;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct ListingCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, ListPage)>>,
}

impl ListingCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch a page if it is still fresh; stale entries are dropped here.
    pub fn get(&self, cache_key: &str) -> Option<ListPage> {
        if self.ttl.is_zero() {
            return None;
        }
        let mut entries = self.entries.lock().unwrap();
        match entries.get(cache_key) {
            Some((stored_at, page)) if stored_at.elapsed() < self.ttl => Some(page.clone()),
            Some(_) => {
                entries.remove(cache_key);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, cache_key: String, page: ListPage) {
        if self.ttl.is_zero() {
            return;
        }
        let mut entries = self.entries.lock().unwrap();
        entries.insert(cache_key, (Instant::now(), page));
    }

    /// Drop everything. Called by every write path.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: usize) -> ListPage {
        ListPage {
            files: Vec::with_capacity(n),
            next_cursor: None,
        }
    }

    #[test]
    fn get_returns_fresh_entries() {
        let cache = ListingCache::new(Duration::from_secs(60));
        cache.set("uploads/|50".into(), page(0));
        assert!(cache.get("uploads/|50").is_some());
        assert!(cache.get("uploads/other|50").is_none());
    }

    #[test]
    fn zero_ttl_disables_the_cache() {
        let cache = ListingCache::new(Duration::ZERO);
        cache.set("k".into(), page(0));
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn stale_entries_are_evicted_on_read() {
        let cache = ListingCache::new(Duration::from_nanos(1));
        cache.set("k".into(), page(0));
        std::thread::sleep(Duration::from_millis(2));
        assert!(cache.get("k").is_none());
        assert!(cache.entries.lock().unwrap().is_empty());
    }

    #[test]
    fn clear_drops_all_entries() {
        let cache = ListingCache::new(Duration::from_secs(60));
        cache.set("a".into(), page(0));
        cache.set("b".into(), page(0));
        cache.clear();
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_none());
    }
}
