use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::{counter, histogram};
use tracing::debug;
use uuid::Uuid;

use crate::application::ports::{CacheError, GreetingCache};
use crate::domain::greeting::Greeting;

pub const METRIC_CACHE_HIT_TOTAL: &str = "greeter_cache_hit_total";
pub const METRIC_CACHE_MISS_TOTAL: &str = "greeter_cache_miss_total";
pub const METRIC_CACHE_GET_MS: &str = "greeter_cache_get_ms";
pub const METRIC_CACHE_PUT_MS: &str = "greeter_cache_put_ms";
pub const METRIC_CACHE_ERROR_TOTAL: &str = "greeter_cache_error_total";

fn elapsed_ms(started_at: Instant) -> f64 {
    started_at.elapsed().as_secs_f64() * 1000.0
}

fn record_error(op: &'static str) {
    counter!(METRIC_CACHE_ERROR_TOTAL, "op" => op).increment(1);
}

/// Records hit rates, latencies and backend failures of the wrapped cache.
///
/// Errors are passed through untouched. A failed `get` also counts as a miss.
pub struct InstrumentedCache<C> {
    inner: C,
}

impl<C> InstrumentedCache<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: GreetingCache> GreetingCache for InstrumentedCache<C> {
    async fn get(&self, id: Uuid) -> Result<Option<Greeting>, CacheError> {
        let started_at = Instant::now();
        let result = self.inner.get(id).await;
        histogram!(METRIC_CACHE_GET_MS).record(elapsed_ms(started_at));

        match &result {
            Ok(Some(_)) => {
                counter!(METRIC_CACHE_HIT_TOTAL).increment(1);
                debug!(greeting_id = %id, "cache hit");
            }
            Ok(None) => {
                counter!(METRIC_CACHE_MISS_TOTAL).increment(1);
                debug!(greeting_id = %id, "cache miss");
            }
            Err(_) => {
                record_error("get");
                counter!(METRIC_CACHE_MISS_TOTAL).increment(1);
            }
        }
        result
    }

    async fn put(&self, greeting: &Greeting, ttl: Duration) -> Result<(), CacheError> {
        let started_at = Instant::now();
        let result = self.inner.put(greeting, ttl).await;
        histogram!(METRIC_CACHE_PUT_MS).record(elapsed_ms(started_at));

        if result.is_err() {
            record_error("put");
        } else {
            debug!(greeting_id = %greeting.id, ttl_secs = ttl.as_secs(), "cache put");
        }
        result
    }

    async fn evict(&self, id: Uuid) -> Result<(), CacheError> {
        let result = self.inner.evict(id).await;
        if result.is_err() {
            record_error("evict");
        } else {
            debug!(greeting_id = %id, "cache entry evicted");
        }
        result
    }

    async fn evict_all(&self) -> Result<(), CacheError> {
        let result = self.inner.evict_all().await;
        if result.is_err() {
            record_error("evict_all");
        } else {
            debug!("cache cleared");
        }
        result
    }
}
