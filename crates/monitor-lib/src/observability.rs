//! Observability infrastructure for the base fee monitor
//!
//! Provides:
//! - Prometheus metrics (fetch latency, cycle outcomes, alerts, failures, last fee)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Encoder, Histogram, IntCounter, IntCounterVec, IntGauge, TextEncoder,
};
use std::sync::OnceLock;
use tracing::{error, info, warn};

use crate::decision::Decision;
use crate::models::Sample;

/// Histogram buckets for RPC fetch latency (in seconds)
const FETCH_LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<MonitorMetricsInner> = OnceLock::new();

struct MonitorMetricsInner {
    fetch_latency_seconds: Histogram,
    cycles_total: IntCounter,
    decisions_total: IntCounterVec,
    alerts_total: IntCounter,
    fetch_errors_total: IntCounter,
    delivery_failures_total: IntCounter,
    last_base_fee: IntGauge,
}

impl MonitorMetricsInner {
    fn new() -> Self {
        Self {
            fetch_latency_seconds: register_histogram!(
                "basefee_monitor_fetch_latency_seconds",
                "Time spent reading the base fee from the fee source",
                FETCH_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register fetch_latency_seconds"),

            cycles_total: register_int_counter!(
                "basefee_monitor_cycles_total",
                "Number of observation cycles run"
            )
            .expect("Failed to register cycles_total"),

            decisions_total: register_int_counter_vec!(
                "basefee_monitor_decisions_total",
                "Decisions produced by the flux engine, by outcome",
                &["outcome"]
            )
            .expect("Failed to register decisions_total"),

            alerts_total: register_int_counter!(
                "basefee_monitor_alerts_total",
                "Number of alerts delivered by the relay"
            )
            .expect("Failed to register alerts_total"),

            fetch_errors_total: register_int_counter!(
                "basefee_monitor_fetch_errors_total",
                "Number of failed base fee reads"
            )
            .expect("Failed to register fetch_errors_total"),

            delivery_failures_total: register_int_counter!(
                "basefee_monitor_delivery_failures_total",
                "Number of alerts that could not be delivered after all attempts"
            )
            .expect("Failed to register delivery_failures_total"),

            last_base_fee: register_int_gauge!(
                "basefee_monitor_last_base_fee",
                "Most recent base fee sample (saturates at i64::MAX)"
            )
            .expect("Failed to register last_base_fee"),
        }
    }
}

/// Handle to the process-wide monitor metrics
///
/// Clones share the same underlying Prometheus collectors.
#[derive(Clone)]
pub struct MonitorMetrics {
    _private: (),
}

impl Default for MonitorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(MonitorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &MonitorMetricsInner {
        GLOBAL_METRICS.get_or_init(MonitorMetricsInner::new)
    }

    pub fn observe_fetch_latency(&self, duration_secs: f64) {
        self.inner().fetch_latency_seconds.observe(duration_secs);
    }

    pub fn inc_cycles(&self) {
        self.inner().cycles_total.inc();
    }

    pub fn record_decision(&self, decision: &Decision) {
        self.inner()
            .decisions_total
            .with_label_values(&[decision.label()])
            .inc();
    }

    pub fn inc_alerts(&self) {
        self.inner().alerts_total.inc();
    }

    pub fn inc_fetch_errors(&self) {
        self.inner().fetch_errors_total.inc();
    }

    pub fn inc_delivery_failures(&self) {
        self.inner().delivery_failures_total.inc();
    }

    pub fn set_last_base_fee(&self, sample: Sample) {
        self.inner().last_base_fee.set(sample.saturating_i64());
    }

    /// Encode every registered metric in Prometheus text format
    pub fn encode_text(&self) -> Result<Vec<u8>, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
        Ok(buffer)
    }
}

/// Structured logger for monitor events
#[derive(Clone)]
pub struct StructuredLogger {
    node_name: String,
}

impl StructuredLogger {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
        }
    }

    pub fn log_startup(&self, version: &str, source: &str) {
        info!(
            event = "monitor_started",
            node = %self.node_name,
            version = %version,
            fee_source = %source,
            "Base fee monitor started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "monitor_shutdown",
            node = %self.node_name,
            reason = %reason,
            "Base fee monitor shutting down"
        );
    }

    pub fn log_decision(&self, decision: &Decision) {
        match decision.flux() {
            Some(flux) => info!(
                event = "decision",
                node = %self.node_name,
                outcome = decision.label(),
                current = %flux.current,
                previous = %flux.previous,
                delta = %flux.delta,
                threshold = %flux.threshold,
                "Evaluated base fee window"
            ),
            None => info!(
                event = "decision",
                node = %self.node_name,
                outcome = decision.label(),
                "Waiting for more samples"
            ),
        }
    }

    pub fn log_fetch_failure(&self, error: &dyn std::fmt::Display) {
        warn!(
            event = "sample_fetch_failed",
            node = %self.node_name,
            error = %error,
            "Skipping cycle, window unchanged"
        );
    }

    pub fn log_alert_delivered(&self, sequence: u64, attempts: u32) {
        info!(
            event = "alert_delivered",
            node = %self.node_name,
            sequence = sequence,
            attempts = attempts,
            "Alert relayed"
        );
    }

    pub fn log_delivery_failure(&self, sequence: u64, attempts: u32, error: &dyn std::fmt::Display) {
        error!(
            event = "alert_delivery_failed",
            node = %self.node_name,
            sequence = sequence,
            attempts = attempts,
            error = %error,
            "Alert could not be delivered"
        );
    }
}
