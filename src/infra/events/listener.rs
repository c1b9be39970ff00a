use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::application::ports::GreetingEventHandler;
use crate::domain::events::GreetingCreatedEvent;

pub const METRIC_EVENTS_RECEIVED_TOTAL: &str = "greeter_events_received_total";
pub const METRIC_EVENTS_PROCESSED_TOTAL: &str = "greeter_events_processed_total";
pub const METRIC_EVENTS_PROCESSING_MS: &str = "greeter_events_processing_ms";

/// Consumer side of the in-process event channel.
pub struct EventListener {
    receiver: mpsc::Receiver<GreetingCreatedEvent>,
}

impl EventListener {
    pub(super) fn new(receiver: mpsc::Receiver<GreetingCreatedEvent>) -> Self {
        Self { receiver }
    }

    /// Dispatch events to `handler` until every publisher is gone.
    ///
    /// Handler failures are logged and counted; they never stop the loop.
    /// Returns the number of events received.
    pub async fn run(self, handler: Arc<dyn GreetingEventHandler>) -> u64 {
        self.run_until(handler, std::future::pending()).await
    }

    /// Like [`run`](Self::run), but once `shutdown` resolves the channel stops
    /// accepting events and the loop ends after the buffered ones are handled,
    /// even while publishers are still alive.
    pub async fn run_until<F>(mut self, handler: Arc<dyn GreetingEventHandler>, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        let mut received = 0_u64;
        let mut closing = false;
        tokio::pin!(shutdown);
        info!("greeting event listener started");

        loop {
            let next = if closing {
                Next::Event(self.receiver.recv().await)
            } else {
                tokio::select! {
                    event = self.receiver.recv() => Next::Event(event),
                    () = &mut shutdown => Next::Shutdown,
                }
            };

            let event = match next {
                Next::Event(Some(event)) => event,
                Next::Event(None) => break,
                Next::Shutdown => {
                    info!("greeting event channel closed, draining buffered events");
                    self.receiver.close();
                    closing = true;
                    continue;
                }
            };

            received += 1;
            dispatch(handler.as_ref(), &event).await;
        }

        info!(received, "greeting event listener stopped");
        received
    }
}

enum Next {
    Event(Option<GreetingCreatedEvent>),
    Shutdown,
}

async fn dispatch(handler: &dyn GreetingEventHandler, event: &GreetingCreatedEvent) {
    counter!(METRIC_EVENTS_RECEIVED_TOTAL).increment(1);
    debug!(event_id = %event.event_id, greeting_id = %event.greeting_id, "greeting event received");

    let started_at = Instant::now();
    let outcome = match handler.handle(event).await {
        Ok(()) => "success",
        Err(err) => {
            warn!(
                event_id = %event.event_id,
                greeting_id = %event.greeting_id,
                error = %err,
                "greeting event handler failed"
            );
            "failure"
        }
    };
    histogram!(METRIC_EVENTS_PROCESSING_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);
    counter!(METRIC_EVENTS_PROCESSED_TOTAL, "outcome" => outcome).increment(1);
}
