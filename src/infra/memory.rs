//! Process-local greeting store used when no database is configured.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::application::repos::{GreetingStore, RepoError};
use crate::domain::greeting::Greeting;

/// Greetings kept in a concurrent map for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemoryGreetingStore {
    greetings: DashMap<Uuid, Greeting>,
}

impl InMemoryGreetingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.greetings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.greetings.is_empty()
    }
}

#[async_trait]
impl GreetingStore for InMemoryGreetingStore {
    async fn save(&self, greeting: &Greeting) -> Result<(), RepoError> {
        self.greetings.insert(greeting.id, greeting.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Greeting>, RepoError> {
        Ok(self.greetings.get(&id).map(|entry| entry.value().clone()))
    }
}
