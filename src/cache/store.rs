//! In-process greeting cache.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use lru::LruCache;
use tokio::time::Instant;
use uuid::Uuid;

use crate::application::ports::{CacheError, GreetingCache};
use crate::domain::greeting::Greeting;

use super::lock::mutex_lock;

const SOURCE: &str = "cache::store";
const DEFAULT_CAPACITY: usize = 10_000;

struct CachedGreeting {
    greeting: Greeting,
    /// `None` when the TTL is too large to represent; such entries only
    /// leave through LRU pressure or eviction.
    expires_at: Option<Instant>,
}

impl CachedGreeting {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

/// LRU-bounded greeting cache with per-entry expiry.
///
/// Expired entries are dropped lazily on read. Operations never fail.
pub struct MemoryGreetingCache {
    entries: Mutex<LruCache<Uuid, CachedGreeting>>,
}

impl MemoryGreetingCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Number of resident entries, expired ones included until next read.
    pub fn len(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, id: Uuid) -> Option<Greeting> {
        let now = Instant::now();
        let mut entries = mutex_lock(&self.entries, SOURCE, "get");
        let expired = match entries.get(&id) {
            Some(entry) if !entry.is_expired(now) => return Some(entry.greeting.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(&id);
        }
        None
    }

    fn insert(&self, greeting: &Greeting, ttl: Duration) {
        let entry = CachedGreeting {
            greeting: greeting.clone(),
            expires_at: Instant::now().checked_add(ttl),
        };
        mutex_lock(&self.entries, SOURCE, "put").put(greeting.id, entry);
    }
}

impl Default for MemoryGreetingCache {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN))
    }
}

#[async_trait]
impl GreetingCache for MemoryGreetingCache {
    async fn get(&self, id: Uuid) -> Result<Option<Greeting>, CacheError> {
        Ok(self.lookup(id))
    }

    async fn put(&self, greeting: &Greeting, ttl: Duration) -> Result<(), CacheError> {
        self.insert(greeting, ttl);
        Ok(())
    }

    async fn evict(&self, id: Uuid) -> Result<(), CacheError> {
        mutex_lock(&self.entries, SOURCE, "evict").pop(&id);
        Ok(())
    }

    async fn evict_all(&self) -> Result<(), CacheError> {
        mutex_lock(&self.entries, SOURCE, "evict_all").clear();
        Ok(())
    }
}
