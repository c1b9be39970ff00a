use std::num::NonZeroUsize;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::SendTimeoutError};

use crate::application::ports::{GreetingEventPublisher, PublishError};
use crate::domain::events::GreetingCreatedEvent;

use super::EventListener;

/// Publisher side of the in-process event channel.
///
/// A send waits for room in the channel for at most `send_timeout`.
#[derive(Clone)]
pub struct ChannelEventPublisher {
    sender: mpsc::Sender<GreetingCreatedEvent>,
    send_timeout: Duration,
}

/// Create a connected publisher and listener pair.
///
/// The listener finishes once every publisher clone has been dropped and
/// the buffered events are drained.
pub fn channel(capacity: NonZeroUsize, send_timeout: Duration) -> (ChannelEventPublisher, EventListener) {
    let (sender, receiver) = mpsc::channel(capacity.get());
    (
        ChannelEventPublisher {
            sender,
            send_timeout,
        },
        EventListener::new(receiver),
    )
}

#[async_trait]
impl GreetingEventPublisher for ChannelEventPublisher {
    async fn publish(&self, event: GreetingCreatedEvent) -> Result<(), PublishError> {
        self.sender
            .send_timeout(event, self.send_timeout)
            .await
            .map_err(|err| match err {
                SendTimeoutError::Timeout(_) => PublishError::Timeout(self.send_timeout),
                SendTimeoutError::Closed(_) => PublishError::Closed,
            })
    }
}
