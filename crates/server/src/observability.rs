use axum::http::StatusCode;
use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec, TextEncoder};

// Prometheus metrics (default registry)
pub static LOAD_TEST_PREFS_SAVED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "prefs_load_test_saved_total",
        "Load test preference updates persisted"
    )
    .expect("register load_test_saved_total")
});

pub static LOAD_TEST_PREFS_REJECTED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "prefs_load_test_rejected_total",
        "Load test preference updates rejected, by offending field",
        &["field"]
    )
    .expect("register load_test_rejected_total")
});

pub static TEST_CONFIGS_STORED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "prefs_test_configs_stored_total",
        "Performance test configs stored"
    )
    .expect("register test_configs_stored_total")
});

pub static TEST_CONFIGS_REJECTED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "prefs_test_configs_rejected_total",
        "Performance test configs rejected, by stage",
        &["stage"]
    )
    .expect("register test_configs_rejected_total")
});

pub static SERVER_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "prefs_server_errors_total",
        "Requests failed with a server error, by reported message",
        &["message"]
    )
    .expect("register server_errors_total")
});

pub fn encode_metrics() -> (StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, format!("metrics encode error: {e}"));
    }
    (StatusCode::OK, String::from_utf8(buffer).unwrap_or_default())
}

pub async fn metrics() -> (StatusCode, String) {
    encode_metrics()
}
