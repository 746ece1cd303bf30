use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::exponential_buckets;
use prometheus::Encoder;
use prometheus::HistogramOpts;
use prometheus::HistogramVec;
use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::Opts;
use prometheus::Registry;
use tracing::warn;

#[cfg(test)]
mod metrics_test;

lazy_static! {
    pub static ref DISPATCHED_EVENTS: IntCounterVec = IntCounterVec::new(
        Opts::new("dispatched_events", "Events handed to the notification dispatch"),
        &["subscription"]
    )
    .expect("metric can not be created");

    pub static ref COALESCED_SIGNALS: IntCounterVec = IntCounterVec::new(
        Opts::new("coalesced_signals", "Source signals merged into an in-flight cycle"),
        &["subscription"]
    )
    .expect("metric can not be created");

    pub static ref PRODUCER_ERRORS: IntCounterVec = IntCounterVec::new(
        Opts::new("producer_errors", "Read or write function failures folded into events"),
        &["subscription"]
    )
    .expect("metric can not be created");

    pub static ref PROTOCOL_VIOLATIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("protocol_violations", "Ready signals without a matching dispatch"),
        &["subscription"]
    )
    .expect("metric can not be created");

    pub static ref QUEUE_EVICTIONS: IntCounter = IntCounter::new(
        "queue_evictions",
        "Oldest values dropped by full bounded queues"
    )
    .expect("metric can not be created");

    pub static ref RATE_CAP_DEFERRAL_MS: HistogramVec = HistogramVec::new(
        HistogramOpts::new("rate_cap_deferral_ms", "Delay imposed on a cycle by the rate cap in ms")
            .buckets(exponential_buckets(1.0, 2.0, 12).expect("valid buckets")),
        &["subscription"]
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

static REGISTER: Once = Once::new();

/// Registers the engine metrics on the crate registry. Safe to call repeatedly.
pub fn register_custom_metrics() {
    REGISTER.call_once(|| register_into(&REGISTRY));
}

pub(crate) fn register_into(registry: &Registry) {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(DISPATCHED_EVENTS.clone()),
        Box::new(COALESCED_SIGNALS.clone()),
        Box::new(PRODUCER_ERRORS.clone()),
        Box::new(PROTOCOL_VIOLATIONS.clone()),
        Box::new(QUEUE_EVICTIONS.clone()),
        Box::new(RATE_CAP_DEFERRAL_MS.clone()),
    ];
    for c in collectors {
        if let Err(e) = registry.register(c) {
            warn!("collector can not be registered: {:?}", e);
        }
    }
}

/// Renders the crate registry in the Prometheus text format.
pub fn metrics_text() -> String {
    register_custom_metrics();
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        warn!("could not encode custom metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}
