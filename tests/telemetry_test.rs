//! Integration tests for telemetry initialization and span helpers.

use erpspace_rs::telemetry::{SERVICE_NAME, TelemetryConfig, hook, init_telemetry, metrics};

#[test]
fn telemetry_initializes_without_endpoint() {
    // A global subscriber can only be set once per process; a second
    // initialization returning Err is acceptable here.
    if let Ok(guard) = init_telemetry(TelemetryConfig::new(None, "debug")) {
        assert!(!guard.is_exporting());
        guard.force_flush();
    }
}

#[test]
fn telemetry_config_reports_the_service_name() {
    let config = TelemetryConfig::new(Some("http://localhost:4317".to_string()), "info");
    assert_eq!(config.service_name, SERVICE_NAME);
    assert_eq!(config.endpoint.as_deref(), Some("http://localhost:4317"));
    assert_eq!(config.log_level, "info");
}

#[test]
fn hook_span_records_state_change() {
    let span = hook::start_hook_span("on_update", "Purchase Order", "PO-0001");
    hook::record_state_change(&span, Some("Draft"), Some("Manager Review"));
    hook::record_state_change(&span, None, None);
}

#[test]
fn metrics_record_without_a_provider() {
    metrics::todos_upserted().add(1, &[]);
    metrics::hook_duration_ms().record(1.5, &[]);
}
