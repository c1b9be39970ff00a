//! In-process transport for greeting creation events.
//!
//! A bounded channel connects [`ChannelEventPublisher`] to a single
//! [`EventListener`]. Events leave the channel in the order they were sent,
//! so events for one greeting are handled in creation order.

mod channel;
mod listener;

pub use channel::{ChannelEventPublisher, channel};
pub use listener::{
    EventListener, METRIC_EVENTS_PROCESSED_TOTAL, METRIC_EVENTS_PROCESSING_MS,
    METRIC_EVENTS_RECEIVED_TOTAL,
};
