//! Outbound ports other than persistence: the side cache, the event
//! transport, event handlers, and remote greeting services.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::events::GreetingCreatedEvent;
use crate::domain::greeting::Greeting;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
}

impl CacheError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

/// Best-effort, TTL-bounded read accelerator keyed by greeting id.
///
/// Every operation may fail on its own; callers treat failures of `get` as
/// misses and failures of the mutating operations as no-ops.
#[async_trait]
pub trait GreetingCache: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Greeting>, CacheError>;

    async fn put(&self, greeting: &Greeting, ttl: Duration) -> Result<(), CacheError>;

    async fn evict(&self, id: Uuid) -> Result<(), CacheError>;

    async fn evict_all(&self) -> Result<(), CacheError>;
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("event transport is closed")]
    Closed,
    #[error("event transport did not accept the event within {0:?}")]
    Timeout(Duration),
    #[error("event transport failed: {0}")]
    Transport(String),
}

/// Asynchronous notification of greeting creation.
///
/// Delivery guarantees (ordering, partitioning) belong to the transport.
#[async_trait]
pub trait GreetingEventPublisher: Send + Sync {
    async fn publish(&self, event: GreetingCreatedEvent) -> Result<(), PublishError>;
}

#[derive(Debug, Error)]
#[error("event handler failed: {0}")]
pub struct HandlerError(pub String);

/// Consumer side of the event transport.
#[async_trait]
pub trait GreetingEventHandler: Send + Sync {
    async fn handle(&self, event: &GreetingCreatedEvent) -> Result<(), HandlerError>;
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("invalid remote endpoint: {0}")]
    Endpoint(String),
    #[error("remote request failed: {0}")]
    Transport(String),
    #[error("remote service answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("remote response could not be decoded: {0}")]
    Decode(String),
}

/// Another greeting service reachable over the network.
#[async_trait]
pub trait ExternalGreetingClient: Send + Sync {
    async fn fetch_greeting(&self, id: Uuid) -> Result<Option<Greeting>, RemoteError>;

    async fn create_remote_greeting(&self, name: &str) -> Result<Greeting, RemoteError>;
}
