use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::ports::{CacheError, GreetingCache};
use crate::domain::greeting::Greeting;

/// Cache used when caching is switched off: every read misses and every
/// write is accepted and dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCache;

#[async_trait]
impl GreetingCache for DisabledCache {
    async fn get(&self, _id: Uuid) -> Result<Option<Greeting>, CacheError> {
        Ok(None)
    }

    async fn put(&self, _greeting: &Greeting, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }

    async fn evict(&self, _id: Uuid) -> Result<(), CacheError> {
        Ok(())
    }

    async fn evict_all(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
