//! Process-wide TTL cache service. Constructed once at startup and passed to
//! every consumer — no module-level shared state. The clock is injected so
//! expiry is testable without sleeping.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

struct CacheEntry<V> {
    value: V,
    created_at: DateTime<Utc>,
}

/// Key-value store with a fixed TTL. Entries are replaced wholesale on
/// insert, never mutated in place: readers observe either the old or the new
/// complete entry.
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// Returns the cached value if present and younger than the TTL.
    pub async fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if self.clock.now() - entry.created_at < self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    pub async fn insert(&self, key: String, value: V) {
        let entry = CacheEntry {
            value,
            created_at: self.clock.now(),
        };
        self.entries.write().await.insert(key, entry);
    }

    pub async fn remove(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    /// Drops every entry past its TTL. Expired entries are already invisible
    /// to `get`, but they hold memory until this runs; correctness never
    /// depends on it.
    pub async fn purge_expired(&self) {
        let now = self.clock.now();
        let ttl = self.ttl;
        self.entries
            .write()
            .await
            .retain(|_, entry| now - entry.created_at < ttl);
    }

    /// Number of physically retained entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// Spawns a background task that purges expired entries every `period`. The
/// key space (one entry per distinct request signature or user) is unbounded,
/// so a long-running process needs this to keep memory flat.
pub fn spawn_purge_task<V>(
    cache: Arc<TtlCache<V>>,
    period: std::time::Duration,
) -> tokio::task::JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(period);
        loop {
            tick.tick().await;
            cache.purge_expired().await;
        }
    })
}

/// Normalized signature for a platform sub-query. Everything that changes the
/// result set participates in the key.
pub fn request_signature(expression: &str, page: u32, recency: Option<&str>) -> String {
    format!(
        "{}|p{}|{}",
        expression.to_lowercase(),
        page,
        recency.unwrap_or("any")
    )
}


#[cfg(test)]
mod tests {
    use super::testing::ManualClock;
    use super::*;

    fn cache_with_clock(ttl_secs: i64) -> (TtlCache<Vec<String>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = TtlCache::new(Duration::seconds(ttl_secs), clock.clone());
        (cache, clock)
    }

    #[tokio::test]
    async fn test_get_within_ttl() {
        let (cache, _clock) = cache_with_clock(3600);
        cache
            .insert("k".to_string(), vec!["a".to_string()])
            .await;
        assert_eq!(cache.get("k").await, Some(vec!["a".to_string()]));
    }

    #[tokio::test]
    async fn test_get_after_ttl_expires() {
        let (cache, clock) = cache_with_clock(3600);
        cache.insert("k".to_string(), vec![]).await;
        clock.advance(Duration::seconds(3601));
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn test_insert_replaces_wholesale() {
        let (cache, _clock) = cache_with_clock(3600);
        cache
            .insert("k".to_string(), vec!["old".to_string()])
            .await;
        cache
            .insert("k".to_string(), vec!["new".to_string()])
            .await;
        assert_eq!(cache.get("k").await, Some(vec!["new".to_string()]));
    }

    #[tokio::test]
    async fn test_remove() {
        let (cache, _clock) = cache_with_clock(3600);
        cache.insert("k".to_string(), vec![]).await;
        cache.remove("k").await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn test_purge_expired_keeps_fresh_entries() {
        let (cache, clock) = cache_with_clock(3600);
        cache.insert("old".to_string(), vec![]).await;
        clock.advance(Duration::seconds(3000));
        cache.insert("fresh".to_string(), vec![]).await;
        clock.advance(Duration::seconds(700));
        cache.purge_expired().await;
        assert_eq!(cache.get("old").await, None);
        assert!(cache.get("fresh").await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_task_evicts_expired_entries() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = Arc::new(TtlCache::new(Duration::seconds(60), clock.clone()));
        cache.insert("k".to_string(), vec!["v".to_string()]).await;
        clock.advance(Duration::seconds(61));
        assert_eq!(cache.len().await, 1, "expired entry still holds memory");

        let handle = spawn_purge_task(cache.clone(), std::time::Duration::from_secs(1));
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        handle.abort();

        assert_eq!(cache.len().await, 0);
    }

    #[test]
    fn test_signature_is_case_insensitive_on_expression() {
        assert_eq!(
            request_signature("\"Rust\" site:jobs.lever.co", 1, None),
            request_signature("\"rust\" SITE:jobs.lever.co", 1, None)
        );
    }

    #[test]
    fn test_signature_distinguishes_page_and_recency() {
        let base = request_signature("q", 1, None);
        assert_ne!(base, request_signature("q", 2, None));
        assert_ne!(base, request_signature("q", 1, Some("d1")));
    }
}
