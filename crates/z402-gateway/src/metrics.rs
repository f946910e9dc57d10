use prometheus::{
    register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec,
    TextEncoder,
};
use std::sync::LazyLock;

pub static CHALLENGES: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!(
        "z402_gateway_challenges_total",
        "402 challenges issued for the protected resource"
    )
    .unwrap()
});

pub static ACCESS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "z402_gateway_access_total",
        "Access decisions on the protected resource",
        &["result"]
    )
    .unwrap()
});

pub static WEBHOOK_EVENTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "z402_gateway_webhook_events_total",
        "Reconciliation outcomes of authenticated webhook deliveries",
        &["outcome"]
    )
    .unwrap()
});

pub static WEBHOOK_AUTH_FAILURES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "z402_gateway_webhook_auth_failures_total",
        "Webhook deliveries rejected before parsing",
        &["reason"]
    )
    .unwrap()
});

pub static INTENTS_EXPIRED: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!(
        "z402_gateway_intents_expired_total",
        "Pending intents expired by the sweep"
    )
    .unwrap()
});

pub fn metrics_output() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
