//! Metrics collection and Prometheus export.
//!
//! Initializes the metrics exporter, renders the /metrics payload and
//! records the membership-domain counters.

use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the metrics recorder. Later calls are no-ops.
pub fn init_metrics() {
    METRICS_HANDLE.get_or_init(|| {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        if metrics::set_global_recorder(recorder).is_err() {
            tracing::warn!("A global metrics recorder was already installed");
        }
        handle
    });
}

/// Get the current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

pub fn record_join(outcome: &'static str) {
    counter!("congregation_joins_total", "outcome" => outcome).increment(1);
}

pub fn record_membership_decision(action: &'static str) {
    counter!("congregation_membership_decisions_total", "action" => action).increment(1);
}

pub fn record_invite_redemption(result: &'static str) {
    counter!("congregation_invite_redemptions_total", "result" => result).increment(1);
}

pub fn record_login(result: &'static str) {
    counter!("congregation_logins_total", "result" => result).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent_and_renders() {
        init_metrics();
        init_metrics();
        record_join("activated");

        let rendered = get_metrics();
        assert!(!rendered.starts_with("# Metrics recorder not initialized"));
    }
}
