//! Greeting creation and lookup across the store, the side cache, and the
//! event publisher.
//!
//! The store is the only collaborator whose failure reaches callers. Cache
//! failures degrade to misses and no-ops, and event publication happens on a
//! detached task whose outcome is only observed through metrics and logs.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::events::spawn_publish;
use crate::application::ports::{GreetingCache, GreetingEventPublisher};
use crate::application::repos::{GreetingStore, RepoError};
use crate::domain::error::DomainError;
use crate::domain::events::GreetingCreatedEvent;
use crate::domain::greeting::{Greeting, GreetingName};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Error)]
pub enum GreetingServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("greeting store failed: {0}")]
    Store(#[from] RepoError),
}

/// Coarse failure classes exposed to boundary adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidInput,
    Unavailable,
    Internal,
}

impl GreetingServiceError {
    pub fn kind(&self) -> FailureKind {
        match self {
            GreetingServiceError::Domain(DomainError::Validation { .. }) => {
                FailureKind::InvalidInput
            }
            GreetingServiceError::Domain(DomainError::Invariant { .. }) => FailureKind::Internal,
            GreetingServiceError::Store(RepoError::Timeout) => FailureKind::Unavailable,
            GreetingServiceError::Store(_) => FailureKind::Internal,
        }
    }
}

/// Result of a lookup that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GreetingLookup {
    Found(Greeting),
    NotFound,
}

impl GreetingLookup {
    pub fn into_option(self) -> Option<Greeting> {
        match self {
            GreetingLookup::Found(greeting) => Some(greeting),
            GreetingLookup::NotFound => None,
        }
    }
}

#[derive(Clone)]
pub struct GreetingService {
    store: Arc<dyn GreetingStore>,
    cache: Arc<dyn GreetingCache>,
    publisher: Arc<dyn GreetingEventPublisher>,
    cache_ttl: Duration,
}

impl GreetingService {
    pub fn new(
        store: Arc<dyn GreetingStore>,
        cache: Arc<dyn GreetingCache>,
        publisher: Arc<dyn GreetingEventPublisher>,
    ) -> Self {
        Self {
            store,
            cache,
            publisher,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    /// Create a greeting for `name`.
    ///
    /// Returns only after the store accepted the write. When the store fails
    /// nothing is cached and no event is published.
    pub async fn create(&self, name: &str) -> Result<Greeting, GreetingServiceError> {
        let name = GreetingName::parse(name)?;
        let greeting = Greeting::compose(&name);

        self.store.save(&greeting).await?;

        if let Err(err) = self.cache.put(&greeting, self.cache_ttl).await {
            warn!(greeting_id = %greeting.id, error = %err, "cache put failed after create");
        }

        spawn_publish(
            Arc::clone(&self.publisher),
            GreetingCreatedEvent::from_greeting(&greeting),
        );

        info!(greeting_id = %greeting.id, "greeting created");
        Ok(greeting)
    }

    /// Look up a greeting, preferring the cache and backfilling it from the
    /// store on a miss.
    pub async fn get(&self, id: Uuid) -> Result<GreetingLookup, GreetingServiceError> {
        match self.cache.get(id).await {
            Ok(Some(greeting)) => return Ok(GreetingLookup::Found(greeting)),
            Ok(None) => {}
            Err(err) => {
                warn!(greeting_id = %id, error = %err, "cache get failed, reading store");
            }
        }

        let Some(greeting) = self.store.find_by_id(id).await? else {
            debug!(greeting_id = %id, "greeting not found");
            return Ok(GreetingLookup::NotFound);
        };

        if let Err(err) = self.cache.put(&greeting, self.cache_ttl).await {
            warn!(greeting_id = %id, error = %err, "cache backfill failed");
        }

        Ok(GreetingLookup::Found(greeting))
    }

    /// Drop one greeting from the cache. The store is untouched.
    pub async fn evict_cached(&self, id: Uuid) {
        if let Err(err) = self.cache.evict(id).await {
            warn!(greeting_id = %id, error = %err, "cache evict failed");
        }
    }

    /// Drop every cached greeting. The store is untouched.
    pub async fn evict_all_cached(&self) {
        if let Err(err) = self.cache.evict_all().await {
            warn!(error = %err, "cache evict_all failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::{Mutex, mpsc};

    use super::*;
    use crate::application::ports::{CacheError, PublishError};
    use crate::cache::MemoryGreetingCache;
    use crate::infra::memory::InMemoryGreetingStore;

    struct FailingStore;

    #[async_trait]
    impl GreetingStore for FailingStore {
        async fn save(&self, _greeting: &Greeting) -> Result<(), RepoError> {
            Err(RepoError::from_persistence("disk on fire"))
        }

        async fn find_by_id(&self, _id: Uuid) -> Result<Option<Greeting>, RepoError> {
            Err(RepoError::Timeout)
        }
    }

    #[derive(Default)]
    struct CountingStore {
        inner: InMemoryGreetingStore,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl GreetingStore for CountingStore {
        async fn save(&self, greeting: &Greeting) -> Result<(), RepoError> {
            self.inner.save(greeting).await
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Greeting>, RepoError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.find_by_id(id).await
        }
    }

    /// Cache whose backend can be switched off mid-test.
    #[derive(Default)]
    struct SwitchableCache {
        inner: MemoryGreetingCache,
        down: AtomicBool,
        puts: Mutex<Vec<Uuid>>,
    }

    impl SwitchableCache {
        fn set_down(&self, down: bool) {
            self.down.store(down, Ordering::SeqCst);
        }

        fn check(&self) -> Result<(), CacheError> {
            if self.down.load(Ordering::SeqCst) {
                Err(CacheError::unavailable("connection refused"))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl GreetingCache for SwitchableCache {
        async fn get(&self, id: Uuid) -> Result<Option<Greeting>, CacheError> {
            self.check()?;
            self.inner.get(id).await
        }

        async fn put(&self, greeting: &Greeting, ttl: Duration) -> Result<(), CacheError> {
            self.check()?;
            self.puts.lock().await.push(greeting.id);
            self.inner.put(greeting, ttl).await
        }

        async fn evict(&self, id: Uuid) -> Result<(), CacheError> {
            self.check()?;
            self.inner.evict(id).await
        }

        async fn evict_all(&self) -> Result<(), CacheError> {
            self.check()?;
            self.inner.evict_all().await
        }
    }

    struct RecordingPublisher {
        sender: mpsc::UnboundedSender<GreetingCreatedEvent>,
    }

    impl RecordingPublisher {
        fn new() -> (Self, mpsc::UnboundedReceiver<GreetingCreatedEvent>) {
            let (sender, receiver) = mpsc::unbounded_channel();
            (Self { sender }, receiver)
        }
    }

    #[async_trait]
    impl GreetingEventPublisher for RecordingPublisher {
        async fn publish(&self, event: GreetingCreatedEvent) -> Result<(), PublishError> {
            self.sender.send(event).map_err(|_| PublishError::Closed)
        }
    }

    struct RejectingPublisher;

    #[async_trait]
    impl GreetingEventPublisher for RejectingPublisher {
        async fn publish(&self, _event: GreetingCreatedEvent) -> Result<(), PublishError> {
            Err(PublishError::Transport("broker down".to_string()))
        }
    }

    async fn next_event(
        receiver: &mut mpsc::UnboundedReceiver<GreetingCreatedEvent>,
    ) -> GreetingCreatedEvent {
        tokio::time::timeout(Duration::from_secs(1), receiver.recv())
            .await
            .expect("event should arrive")
            .expect("publisher channel open")
    }

    #[tokio::test]
    async fn create_persists_caches_and_publishes() {
        let store = Arc::new(InMemoryGreetingStore::default());
        let cache = Arc::new(SwitchableCache::default());
        let (publisher, mut events) = RecordingPublisher::new();
        let service = GreetingService::new(store.clone(), cache.clone(), Arc::new(publisher));

        let greeting = service.create("World").await.expect("create succeeds");

        assert_eq!(greeting.message, "Hello, World!");
        assert_eq!(
            store.find_by_id(greeting.id).await.expect("store read"),
            Some(greeting.clone())
        );
        assert_eq!(
            cache.inner.get(greeting.id).await.expect("cache read"),
            Some(greeting.clone())
        );

        let event = next_event(&mut events).await;
        assert_eq!(event.greeting_id, greeting.id);
        assert_eq!(event.message, greeting.message);
    }

    #[tokio::test]
    async fn create_rejects_invalid_names_before_touching_collaborators() {
        let store = Arc::new(CountingStore::default());
        let cache = Arc::new(SwitchableCache::default());
        let (publisher, mut events) = RecordingPublisher::new();
        let service = GreetingService::new(store.clone(), cache.clone(), Arc::new(publisher));

        let err = service.create("   ").await.expect_err("blank name");
        assert_eq!(err.kind(), FailureKind::InvalidInput);

        let err = service
            .create(&"n".repeat(101))
            .await
            .expect_err("name too long");
        assert_eq!(err.kind(), FailureKind::InvalidInput);

        assert!(store.inner.is_empty());
        assert!(cache.puts.lock().await.is_empty());
        drop(service);
        assert!(events.recv().await.is_none());
    }

    #[tokio::test]
    async fn store_failure_on_create_leaves_no_cache_entry_or_event() {
        let cache = Arc::new(SwitchableCache::default());
        let (publisher, mut events) = RecordingPublisher::new();
        let service = GreetingService::new(Arc::new(FailingStore), cache.clone(), Arc::new(publisher));

        let err = service.create("World").await.expect_err("store fails");

        assert!(matches!(err, GreetingServiceError::Store(_)));
        assert_eq!(err.kind(), FailureKind::Internal);
        assert!(cache.puts.lock().await.is_empty());
        drop(service);
        assert!(events.recv().await.is_none());
    }

    #[tokio::test]
    async fn cache_outage_does_not_fail_create() {
        let store = Arc::new(InMemoryGreetingStore::default());
        let cache = Arc::new(SwitchableCache::default());
        cache.set_down(true);
        let (publisher, mut events) = RecordingPublisher::new();
        let service = GreetingService::new(store.clone(), cache, Arc::new(publisher));

        let greeting = service.create("Outage").await.expect("create succeeds");

        assert_eq!(
            store.find_by_id(greeting.id).await.expect("store read"),
            Some(greeting.clone())
        );
        assert_eq!(next_event(&mut events).await.greeting_id, greeting.id);
    }

    #[tokio::test]
    async fn publish_failure_does_not_fail_create() {
        let store = Arc::new(InMemoryGreetingStore::default());
        let service = GreetingService::new(
            store.clone(),
            Arc::new(MemoryGreetingCache::default()),
            Arc::new(RejectingPublisher),
        );

        let greeting = service.create("Quiet").await.expect("create succeeds");
        tokio::task::yield_now().await;

        assert_eq!(
            service.get(greeting.id).await.expect("lookup"),
            GreetingLookup::Found(greeting)
        );
    }

    #[tokio::test]
    async fn cache_hit_skips_the_store() {
        let store = Arc::new(CountingStore::default());
        let cache = Arc::new(SwitchableCache::default());
        let (publisher, _events) = RecordingPublisher::new();
        let service = GreetingService::new(store.clone(), cache, Arc::new(publisher));

        let greeting = service.create("Cached").await.expect("create");
        let found = service.get(greeting.id).await.expect("lookup");

        assert_eq!(found, GreetingLookup::Found(greeting));
        assert_eq!(store.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cache_miss_reads_store_and_backfills() {
        let store = Arc::new(CountingStore::default());
        let cache = Arc::new(SwitchableCache::default());
        let (publisher, _events) = RecordingPublisher::new();
        let service = GreetingService::new(store.clone(), cache.clone(), Arc::new(publisher));

        let greeting = service.create("Backfill").await.expect("create");
        service.evict_cached(greeting.id).await;
        assert_eq!(cache.inner.get(greeting.id).await.expect("cache read"), None);

        let found = service.get(greeting.id).await.expect("lookup");

        assert_eq!(found, GreetingLookup::Found(greeting.clone()));
        assert_eq!(store.reads.load(Ordering::SeqCst), 1);
        assert_eq!(
            cache.inner.get(greeting.id).await.expect("cache read"),
            Some(greeting)
        );
    }

    #[tokio::test]
    async fn cache_outage_on_get_degrades_to_store() {
        let store = Arc::new(CountingStore::default());
        let cache = Arc::new(SwitchableCache::default());
        let (publisher, _events) = RecordingPublisher::new();
        let service = GreetingService::new(store.clone(), cache.clone(), Arc::new(publisher));

        let greeting = service.create("Degraded").await.expect("create");
        cache.set_down(true);

        let found = service.get(greeting.id).await.expect("lookup succeeds");

        assert_eq!(found, GreetingLookup::Found(greeting));
        assert_eq!(store.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let (publisher, _events) = RecordingPublisher::new();
        let service = GreetingService::new(
            Arc::new(InMemoryGreetingStore::default()),
            Arc::new(MemoryGreetingCache::default()),
            Arc::new(publisher),
        );

        let lookup = service.get(Uuid::nil()).await.expect("lookup succeeds");
        assert_eq!(lookup, GreetingLookup::NotFound);
        assert_eq!(lookup.into_option(), None);
    }

    #[tokio::test]
    async fn store_failure_on_get_is_reported() {
        let (publisher, _events) = RecordingPublisher::new();
        let service = GreetingService::new(
            Arc::new(FailingStore),
            Arc::new(MemoryGreetingCache::default()),
            Arc::new(publisher),
        );

        let err = service.get(Uuid::new_v4()).await.expect_err("store fails");
        assert_eq!(err.kind(), FailureKind::Unavailable);
    }

    #[tokio::test]
    async fn eviction_failures_are_swallowed() {
        let cache = Arc::new(SwitchableCache::default());
        cache.set_down(true);
        let (publisher, _events) = RecordingPublisher::new();
        let service = GreetingService::new(
            Arc::new(InMemoryGreetingStore::default()),
            cache,
            Arc::new(publisher),
        );

        service.evict_cached(Uuid::new_v4()).await;
        service.evict_all_cached().await;
    }

    #[test]
    fn ttl_defaults_to_thirty_minutes() {
        let (publisher, _events) = RecordingPublisher::new();
        let service = GreetingService::new(
            Arc::new(InMemoryGreetingStore::default()),
            Arc::new(MemoryGreetingCache::default()),
            Arc::new(publisher),
        );
        assert_eq!(service.cache_ttl(), Duration::from_secs(1800));

        let service = service.with_cache_ttl(Duration::from_secs(5));
        assert_eq!(service.cache_ttl(), Duration::from_secs(5));
    }
}
