use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::application::events::EVENTS_PUBLISHED_TOTAL;
use crate::cache::{
    METRIC_CACHE_ERROR_TOTAL, METRIC_CACHE_GET_MS, METRIC_CACHE_HIT_TOTAL,
    METRIC_CACHE_MISS_TOTAL, METRIC_CACHE_PUT_MS,
};
use crate::config::{LogFormat, LoggingSettings};
use crate::infra::events::{
    METRIC_EVENTS_PROCESSED_TOTAL, METRIC_EVENTS_PROCESSING_MS, METRIC_EVENTS_RECEIVED_TOTAL,
};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

/// Register descriptions for every metric the service emits.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_CACHE_HIT_TOTAL,
            Unit::Count,
            "Greeting lookups answered by the cache."
        );
        describe_counter!(
            METRIC_CACHE_MISS_TOTAL,
            Unit::Count,
            "Greeting lookups the cache could not answer, failures included."
        );
        describe_histogram!(
            METRIC_CACHE_GET_MS,
            Unit::Milliseconds,
            "Cache read latency in milliseconds."
        );
        describe_histogram!(
            METRIC_CACHE_PUT_MS,
            Unit::Milliseconds,
            "Cache write latency in milliseconds."
        );
        describe_counter!(
            METRIC_CACHE_ERROR_TOTAL,
            Unit::Count,
            "Cache backend failures, labelled by operation."
        );
        describe_counter!(
            EVENTS_PUBLISHED_TOTAL,
            Unit::Count,
            "Greeting created events handed to the transport, labelled by outcome."
        );
        describe_counter!(
            METRIC_EVENTS_RECEIVED_TOTAL,
            Unit::Count,
            "Greeting created events taken off the transport."
        );
        describe_counter!(
            METRIC_EVENTS_PROCESSED_TOTAL,
            Unit::Count,
            "Greeting created events handled, labelled by outcome."
        );
        describe_histogram!(
            METRIC_EVENTS_PROCESSING_MS,
            Unit::Milliseconds,
            "Event handler latency in milliseconds."
        );
    });
}
