//! Detached event dispatch and the default event handler.

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::application::ports::{GreetingEventHandler, GreetingEventPublisher, HandlerError};
use crate::domain::events::GreetingCreatedEvent;

pub const EVENTS_PUBLISHED_TOTAL: &str = "greeter_events_published_total";

/// Hand `event` to `publisher` on its own task.
///
/// The outcome only reaches the published-events counter and the log; the
/// returned handle is for callers that want to wait in tests or on shutdown.
pub fn spawn_publish(
    publisher: Arc<dyn GreetingEventPublisher>,
    event: GreetingCreatedEvent,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let event_id = event.event_id;
        let greeting_id = event.greeting_id;
        match publisher.publish(event).await {
            Ok(()) => {
                counter!(EVENTS_PUBLISHED_TOTAL, "outcome" => "success").increment(1);
                debug!(%event_id, %greeting_id, "greeting event published");
            }
            Err(err) => {
                counter!(EVENTS_PUBLISHED_TOTAL, "outcome" => "failure").increment(1);
                error!(%event_id, %greeting_id, error = %err, "failed to publish greeting event");
            }
        }
    })
}

/// Writes every received event to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingGreetingEventHandler;

#[async_trait]
impl GreetingEventHandler for LoggingGreetingEventHandler {
    async fn handle(&self, event: &GreetingCreatedEvent) -> Result<(), HandlerError> {
        info!(
            event_id = %event.event_id,
            greeting_id = %event.greeting_id,
            message = %event.message,
            created_at = %event.created_at,
            "processing greeting event"
        );
        Ok(())
    }
}
