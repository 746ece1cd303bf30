use super::*;

fn create_test_registry() -> Registry {
    let registry = Registry::new_custom(Some("pvflow".to_string()), None).unwrap();
    register_into(&registry);
    registry
}

#[test]
fn test_custom_registry() {
    let registry = create_test_registry();

    DISPATCHED_EVENTS.with_label_values(&["sub-registry"]).inc();
    let metrics = &registry.gather();
    assert!(!metrics.is_empty());

    let metric_names: Vec<_> = metrics.iter().map(|m| m.get_name()).collect();
    assert!(
        metric_names.contains(&"pvflow_dispatched_events"),
        "Missing pvflow_dispatched_events"
    );
}

#[test]
fn test_counter_increment() {
    COALESCED_SIGNALS.with_label_values(&["sub-counter"]).inc();
    COALESCED_SIGNALS.with_label_values(&["sub-counter"]).inc();

    let value = COALESCED_SIGNALS.with_label_values(&["sub-counter"]).get();
    assert_eq!(value, 2, "Counter should increment correctly");
}

#[test]
fn test_metrics_text_is_idempotent() {
    PRODUCER_ERRORS.with_label_values(&["sub-text"]).inc();
    let first = metrics_text();
    let second = metrics_text();
    assert!(first.contains("producer_errors"));
    assert!(second.contains("producer_errors"));
}
