//! Notifications emitted after a greeting becomes durable.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::greeting::Greeting;

/// Announces that a greeting was created. Carries no state of its own:
/// reads never consult it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GreetingCreatedEvent {
    /// Unique per publish attempt.
    pub event_id: Uuid,
    pub greeting_id: Uuid,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl GreetingCreatedEvent {
    pub fn from_greeting(greeting: &Greeting) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            greeting_id: greeting.id,
            message: greeting.message.clone(),
            created_at: OffsetDateTime::now_utc(),
        }
    }
}
