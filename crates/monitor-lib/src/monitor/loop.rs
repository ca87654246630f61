//! Periodic sample → decide → relay loop

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval, timeout, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::StatusHandle;
use crate::decision::{Decision, DecisionEngine};
use crate::health::{components, HealthRegistry};
use crate::models::SampleWindow;
use crate::observability::{MonitorMetrics, StructuredLogger};
use crate::relay::AlertRelay;
use crate::sampler::{SampleError, Sampler};

/// Configuration for the observation loop
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Observation period (default: 12 seconds, one slot)
    pub interval: Duration,
    /// Upper bound on a single fee read (default: 5 seconds)
    pub fetch_timeout: Duration,
    /// Total delivery attempts per alert, including the first (default: 3)
    pub delivery_attempts: u32,
    /// Consecutive fetch failures before the sampler is reported unhealthy
    pub unhealthy_after: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(12),
            fetch_timeout: Duration::from_secs(5),
            delivery_attempts: 3,
            unhealthy_after: 5,
        }
    }
}

/// Result of one observation cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Fetch failed; window left untouched
    Skipped { reason: String },
    /// Decision made, relay not invoked
    Evaluated(Decision),
    /// Triggered and delivered
    Alerted {
        decision: Decision,
        sequence: u64,
        attempts: u32,
    },
    /// Triggered but every delivery attempt failed
    DeliveryFailed {
        decision: Decision,
        sequence: u64,
        attempts: u32,
    },
}

/// Observation loop owning the sample window
pub struct FeeMonitor {
    sampler: Sampler,
    engine: DecisionEngine,
    relay: Arc<AlertRelay>,
    config: MonitorConfig,
    window: SampleWindow,
    health: HealthRegistry,
    metrics: MonitorMetrics,
    logger: StructuredLogger,
    status: StatusHandle,
    consecutive_fetch_failures: u32,
}

impl FeeMonitor {
    pub fn new(sampler: Sampler, relay: Arc<AlertRelay>, config: MonitorConfig) -> Self {
        Self {
            sampler,
            engine: DecisionEngine::new(),
            relay,
            config,
            window: SampleWindow::new(),
            health: HealthRegistry::new(),
            metrics: MonitorMetrics::new(),
            logger: StructuredLogger::new("local"),
            status: StatusHandle::new(),
            consecutive_fetch_failures: 0,
        }
    }

    /// Run until a shutdown signal arrives
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            fetch_timeout_secs = self.config.fetch_timeout.as_secs(),
            "Starting base fee monitor loop"
        );

        self.health.register(components::SAMPLER).await;
        self.health.register(components::RELAY).await;
        self.health.set_ready(true).await;

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let outcome = self.run_cycle().await;
                    debug!(outcome = ?outcome, "Cycle complete");
                }
                _ = shutdown.recv() => {
                    info!("Shutting down base fee monitor loop");
                    break;
                }
            }
        }

        self.health.set_ready(false).await;
    }

    /// Run a single observation cycle
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        self.metrics.inc_cycles();

        let started = Instant::now();
        let fetched = timeout(self.config.fetch_timeout, self.sampler.collect())
            .await
            .unwrap_or_else(|_| Err(SampleError::Timeout(self.config.fetch_timeout)));
        self.metrics
            .observe_fetch_latency(started.elapsed().as_secs_f64());

        let sample = match fetched {
            Ok(sample) => sample,
            Err(e) => return self.skip_cycle(e).await,
        };

        self.consecutive_fetch_failures = 0;
        self.health.set_healthy(components::SAMPLER).await;
        self.metrics.set_last_base_fee(sample);

        self.window.push(sample);
        let decision = self.engine.evaluate(&self.window);
        self.metrics.record_decision(&decision);
        self.logger.log_decision(&decision);

        let outcome = if decision.should_respond() {
            self.relay_alert(decision).await
        } else {
            CycleOutcome::Evaluated(decision)
        };

        let window = self.window.as_slice().to_vec();
        let outcome_ref = &outcome;
        self.status
            .update(|status| {
                status.cycles += 1;
                status.window = window;
                status.last_decision = Some(decision);
                status.last_error = None;
                match outcome_ref {
                    CycleOutcome::Alerted { sequence, .. } => {
                        status.alerts += 1;
                        status.last_alert_sequence = Some(*sequence);
                    }
                    CycleOutcome::DeliveryFailed { .. } => {
                        status.delivery_failures += 1;
                        status.last_error = Some("alert delivery failed".to_string());
                    }
                    _ => {}
                }
            })
            .await;

        outcome
    }

    async fn skip_cycle(&mut self, error: SampleError) -> CycleOutcome {
        self.consecutive_fetch_failures += 1;
        self.metrics.inc_fetch_errors();
        self.logger.log_fetch_failure(&error);

        let reason = error.to_string();
        if self.consecutive_fetch_failures >= self.config.unhealthy_after {
            self.health
                .set_unhealthy(components::SAMPLER, reason.clone())
                .await;
        } else {
            self.health
                .set_degraded(components::SAMPLER, reason.clone())
                .await;
        }

        let last_error = reason.clone();
        self.status
            .update(|status| {
                status.cycles += 1;
                status.skipped += 1;
                status.last_error = Some(last_error);
            })
            .await;

        CycleOutcome::Skipped { reason }
    }

    /// Deliver a triggered decision, retrying failed sinks up to the
    /// configured attempts
    async fn relay_alert(&self, decision: Decision) -> CycleOutcome {
        let mut alert = self.relay.prepare(decision.payload());
        let sequence = alert.event().sequence;
        let max_attempts = self.config.delivery_attempts.max(1);
        let mut attempts = 0;

        loop {
            attempts += 1;
            match self.relay.deliver(&mut alert).await {
                Ok(()) => {
                    self.metrics.inc_alerts();
                    self.health.set_healthy(components::RELAY).await;
                    self.logger.log_alert_delivered(sequence, attempts);
                    return CycleOutcome::Alerted {
                        decision,
                        sequence,
                        attempts,
                    };
                }
                Err(e) if attempts < max_attempts => {
                    debug!(
                        sequence,
                        attempts,
                        pending_sinks = alert.pending_sinks(),
                        error = %e,
                        "Redelivering alert"
                    );
                }
                Err(e) => {
                    self.metrics.inc_delivery_failures();
                    self.health
                        .set_degraded(components::RELAY, e.to_string())
                        .await;
                    self.logger.log_delivery_failure(sequence, attempts, &e);
                    return CycleOutcome::DeliveryFailed {
                        decision,
                        sequence,
                        attempts,
                    };
                }
            }
        }
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    pub fn status_handle(&self) -> StatusHandle {
        self.status.clone()
    }

    pub fn health_registry(&self) -> HealthRegistry {
        self.health.clone()
    }
}

/// Builder for the observation loop
pub struct FeeMonitorBuilder {
    sampler: Option<Sampler>,
    relay: Option<Arc<AlertRelay>>,
    config: MonitorConfig,
    health: Option<HealthRegistry>,
    metrics: Option<MonitorMetrics>,
    logger: Option<StructuredLogger>,
    status: Option<StatusHandle>,
}

impl FeeMonitorBuilder {
    pub fn new() -> Self {
        Self {
            sampler: None,
            relay: None,
            config: MonitorConfig::default(),
            health: None,
            metrics: None,
            logger: None,
            status: None,
        }
    }

    pub fn sampler(mut self, sampler: Sampler) -> Self {
        self.sampler = Some(sampler);
        self
    }

    pub fn relay(mut self, relay: Arc<AlertRelay>) -> Self {
        self.relay = Some(relay);
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    pub fn fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.config.fetch_timeout = fetch_timeout;
        self
    }

    pub fn delivery_attempts(mut self, attempts: u32) -> Self {
        self.config.delivery_attempts = attempts;
        self
    }

    pub fn unhealthy_after(mut self, failures: u32) -> Self {
        self.config.unhealthy_after = failures;
        self
    }

    /// Share an existing health registry (e.g. the API's)
    pub fn health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn metrics(mut self, metrics: MonitorMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn status(mut self, status: StatusHandle) -> Self {
        self.status = Some(status);
        self
    }

    pub fn build(self) -> Result<FeeMonitor> {
        let sampler = self
            .sampler
            .ok_or_else(|| anyhow::anyhow!("Sampler is required"))?;
        let relay = self
            .relay
            .ok_or_else(|| anyhow::anyhow!("Relay is required"))?;

        let mut monitor = FeeMonitor::new(sampler, relay, self.config);
        if let Some(health) = self.health {
            monitor.health = health;
        }
        if let Some(metrics) = self.metrics {
            monitor.metrics = metrics;
        }
        if let Some(logger) = self.logger {
            monitor.logger = logger;
        }
        if let Some(status) = self.status {
            monitor.status = status;
        }

        Ok(monitor)
    }
}

impl Default for FeeMonitorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
