use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use greeter::application::events::LoggingGreetingEventHandler;
use greeter::application::greetings::{GreetingLookup, GreetingService};
use greeter::application::ports::GreetingCache;
use greeter::application::repos::GreetingStore;
use greeter::cache::{CacheConfig, MemoryGreetingCache, build_cache};
use greeter::infra::events;
use greeter::infra::memory::InMemoryGreetingStore;
use uuid::Uuid;

fn capacity(value: usize) -> NonZeroUsize {
    NonZeroUsize::new(value).expect("non-zero")
}

#[tokio::test]
async fn create_get_evict_and_miss_scenario() {
    let store = Arc::new(InMemoryGreetingStore::new());
    let cache = Arc::new(MemoryGreetingCache::default());
    let (publisher, listener) = events::channel(capacity(16), Duration::from_millis(100));
    let listener = tokio::spawn(listener.run(Arc::new(LoggingGreetingEventHandler)));
    let service = GreetingService::new(store.clone(), cache.clone(), Arc::new(publisher));

    let created = service.create("World").await.expect("create");
    assert_eq!(created.message, "Hello, World!");

    let fetched = service.get(created.id).await.expect("get");
    assert_eq!(fetched, GreetingLookup::Found(created.clone()));

    service.evict_cached(created.id).await;
    assert_eq!(cache.get(created.id).await.expect("cache read"), None);

    let refetched = service.get(created.id).await.expect("get after evict");
    assert_eq!(refetched, GreetingLookup::Found(created.clone()));
    assert_eq!(
        cache.get(created.id).await.expect("cache read"),
        Some(created.clone())
    );

    assert_eq!(
        service.get(Uuid::nil()).await.expect("get nil"),
        GreetingLookup::NotFound
    );

    drop(service);
    let received = tokio::time::timeout(Duration::from_secs(1), listener)
        .await
        .expect("listener drains")
        .expect("listener task");
    assert_eq!(received, 1);
}

#[tokio::test]
async fn distinct_creates_get_distinct_ids() {
    let (publisher, _listener) = events::channel(capacity(16), Duration::from_millis(100));
    let service = GreetingService::new(
        Arc::new(InMemoryGreetingStore::new()),
        build_cache(&CacheConfig::default()),
        Arc::new(publisher),
    );

    let first = service.create("Ada").await.expect("create");
    let second = service.create("Ada").await.expect("create");

    assert_ne!(first.id, second.id);
    assert_eq!(first.message, second.message);
}

#[tokio::test]
async fn disabled_cache_serves_everything_from_the_store() {
    let store = Arc::new(InMemoryGreetingStore::new());
    let (publisher, _listener) = events::channel(capacity(16), Duration::from_millis(100));
    let config = CacheConfig {
        enabled: false,
        ..CacheConfig::default()
    };
    let service = GreetingService::new(store.clone(), build_cache(&config), Arc::new(publisher));

    let created = service.create("Store").await.expect("create");

    assert_eq!(
        store.find_by_id(created.id).await.expect("store read"),
        Some(created.clone())
    );
    assert_eq!(
        service.get(created.id).await.expect("get").into_option(),
        Some(created)
    );
}

#[tokio::test]
async fn full_event_channel_does_not_fail_create() {
    let (publisher, listener) = events::channel(capacity(1), Duration::from_millis(5));
    let service = GreetingService::new(
        Arc::new(InMemoryGreetingStore::new()),
        Arc::new(MemoryGreetingCache::default()),
        Arc::new(publisher),
    );

    for name in ["One", "Two", "Three"] {
        service.create(name).await.expect("create succeeds");
    }

    drop(service);
    let received = tokio::time::timeout(
        Duration::from_secs(1),
        listener.run(Arc::new(LoggingGreetingEventHandler)),
    )
    .await
    .expect("listener drains");
    assert!((1..=3).contains(&received));
}
