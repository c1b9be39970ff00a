//! Greeting side cache.
//!
//! An in-process LRU whose entries expire after the TTL given on write,
//! plus a disabled variant that always misses. Both are wrapped in
//! [`InstrumentedCache`] at wiring time so hit rates and latencies are
//! recorded outside the service.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! capacity = 10000
//! ttl_seconds = 1800
//! ```

mod config;
mod disabled;
mod instrumented;
mod lock;
mod store;

use std::sync::Arc;

pub use config::CacheConfig;
pub use disabled::DisabledCache;
pub use instrumented::{
    InstrumentedCache, METRIC_CACHE_ERROR_TOTAL, METRIC_CACHE_GET_MS, METRIC_CACHE_HIT_TOTAL,
    METRIC_CACHE_MISS_TOTAL, METRIC_CACHE_PUT_MS,
};
pub use store::MemoryGreetingCache;

use crate::application::ports::GreetingCache;

/// Build the cache selected by `config`, already wrapped for metrics.
pub fn build_cache(config: &CacheConfig) -> Arc<dyn GreetingCache> {
    if config.enabled {
        Arc::new(InstrumentedCache::new(MemoryGreetingCache::new(
            config.capacity_non_zero(),
        )))
    } else {
        Arc::new(InstrumentedCache::new(DisabledCache))
    }
}
