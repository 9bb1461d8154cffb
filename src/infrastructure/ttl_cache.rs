// In-memory key/value cache with lazy TTL expiry
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Time source, injectable so expiry can be tested deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: StdMutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: StdMutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    stored_at: Instant,
}

/// Unbounded cache. Entries older than `ttl` are dropped when next read;
/// `ttl = None` keeps them for the process lifetime.
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, Entry<V>>>,
    ttl: Option<Duration>,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Option<Duration>, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn with_system_clock(ttl: Option<Duration>) -> Self {
        Self::new(ttl, Arc::new(SystemClock))
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        let fresh = match (entries.get(key), self.ttl) {
            (None, _) => return None,
            (Some(_), None) => true,
            (Some(entry), Some(ttl)) => now.saturating_duration_since(entry.stored_at) <= ttl,
        };

        if fresh {
            entries.get(key).map(|e| e.value.clone())
        } else {
            tracing::debug!("Cache entry '{}' expired", key);
            entries.remove(key);
            None
        }
    }

    pub async fn set(&self, key: impl Into<String>, value: V) {
        let entry = Entry {
            value,
            stored_at: self.clock.now(),
        };
        self.entries.lock().await.insert(key.into(), entry);
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(ttl: Option<Duration>) -> (TtlCache<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (TtlCache::new(ttl, clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_hit_before_ttl() {
        let (cache, clock) = cache(Some(Duration::from_secs(60)));
        cache.set("berlin", "52.52,13.40".to_string()).await;
        clock.advance(Duration::from_secs(60));
        assert_eq!(cache.get("berlin").await.as_deref(), Some("52.52,13.40"));
    }

    #[tokio::test]
    async fn test_expired_entry_is_evicted() {
        let (cache, clock) = cache(Some(Duration::from_secs(60)));
        cache.set("berlin", "52.52,13.40".to_string()).await;
        clock.advance(Duration::from_secs(61));

        assert_eq!(cache.get("berlin").await, None);
        assert_eq!(cache.len().await, 0);
        assert_eq!(cache.get("berlin").await, None);
    }

    #[tokio::test]
    async fn test_set_overwrites_and_refreshes() {
        let (cache, clock) = cache(Some(Duration::from_secs(10)));
        cache.set("k", "old".to_string()).await;
        clock.advance(Duration::from_secs(8));
        cache.set("k", "new".to_string()).await;
        clock.advance(Duration::from_secs(8));
        assert_eq!(cache.get("k").await.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_no_ttl_never_expires() {
        let (cache, clock) = cache(None);
        cache.set("k", "v".to_string()).await;
        clock.advance(Duration::from_secs(365 * 24 * 3600));
        assert_eq!(cache.get("k").await.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_miss_on_unknown_key() {
        let (cache, _) = cache(None);
        assert_eq!(cache.get("nowhere").await, None);
    }
}
