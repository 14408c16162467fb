// Page Cache - rendered page bodies kept for a bounded time window
// Entries are never invalidated by data changes, only by expiry or clear()

use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

use crate::infrastructure::cache::Cache;

/// Cache entry with TTL
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub body: String,
    pub inserted_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn new(body: String, ttl: Duration) -> Self {
        Self {
            body,
            inserted_at: Instant::now(),
            ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() >= self.ttl
    }
}

/// Process-wide cache of rendered pages, keyed by prefix and request identity.
pub struct PageCache {
    entries: Mutex<Cache<String, CacheEntry>>,
    ttl: Duration,
}

impl std::fmt::Debug for PageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageCache").field("ttl", &self.ttl).finish()
    }
}

impl PageCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(Cache::new(capacity)),
            ttl,
        }
    }

    /// Build the key of a cached page: `<prefix>:<viewer>:<path and query>`.
    pub fn key(prefix: &str, viewer: &str, path_and_query: &str) -> String {
        format!("{}:{}:{}", prefix, viewer, path_and_query)
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().await;
        let key = key.to_string();
        match entries.get(&key) {
            Some(entry) if !entry.is_expired() => {
                debug!("Page cache hit for {}", key);
                Some(entry.body.clone())
            }
            Some(_) => {
                debug!("Page cache entry for {} expired", key);
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    pub async fn insert(&self, key: String, body: String) {
        self.entries
            .lock()
            .await
            .insert(key, CacheEntry::new(body, self.ttl));
    }

    /// Drop every cached page.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hit_until_cleared() {
        let cache = PageCache::new(10, Duration::from_secs(20));
        let key = PageCache::key("index_page", "anonymous", "/");
        cache.insert(key.clone(), "<html>one</html>".into()).await;

        assert_eq!(cache.get(&key).await.as_deref(), Some("<html>one</html>"));

        cache.clear().await;
        assert_eq!(cache.get(&key).await, None);
    }

    #[tokio::test]
    async fn test_expired_entries_are_dropped() {
        let cache = PageCache::new(10, Duration::from_millis(10));
        cache.insert("k".into(), "body".into()).await;

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.get("k").await, None);
        assert_eq!(cache.len().await, 0);
    }

    #[test]
    fn test_key_includes_viewer_and_query() {
        assert_eq!(
            PageCache::key("index_page", "auth", "/?page=2"),
            "index_page:auth:/?page=2"
        );
    }
}
