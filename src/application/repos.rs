//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::greeting::Greeting;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }
}

/// Durable source of truth for greetings.
///
/// `save` is an idempotent upsert by id and is durable once it returns;
/// a `find_by_id` issued after a successful `save` always observes it.
#[async_trait]
pub trait GreetingStore: Send + Sync {
    async fn save(&self, greeting: &Greeting) -> Result<(), RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Greeting>, RepoError>;
}
