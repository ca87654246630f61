//! Base Fee Agent - periodic base fee flux monitor
//!
//! Samples the base fee once per period, evaluates the two most recent
//! samples and relays an alert when the change exceeds ~1.5%.

use anyhow::{Context, Result};
use monitor_lib::{
    health::HealthRegistry,
    monitor::{FeeMonitorBuilder, StatusHandle},
    observability::{MonitorMetrics, StructuredLogger},
    relay::{AlertRelay, AlertSink, BroadcastSink, LogSink, WebhookSink},
    sampler::{create_rpc_sampler, Sampler, StaticFeeSource},
    Sample,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs, level from RUST_LOG (default info)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting basefee-agent");

    let config = config::AgentConfig::load()?;
    info!(node_name = %config.node_name, interval_secs = config.interval_secs, "Agent configured");

    let health_registry = HealthRegistry::new();
    let metrics = MonitorMetrics::new();
    let logger = StructuredLogger::new(&config.node_name);
    let status = StatusHandle::new();

    let sampler = match &config.static_base_fee {
        Some(value) => {
            let sample: Sample = value
                .parse()
                .with_context(|| format!("Invalid MONITOR_STATIC_BASE_FEE {:?}", value))?;
            Sampler::new(Arc::new(StaticFeeSource::new(sample)))
        }
        None => create_rpc_sampler(&config.rpc_url, config.fetch_timeout())?,
    };
    logger.log_startup(AGENT_VERSION, &sampler.source().describe());

    // Served to /events subscribers
    let alert_stream = Arc::new(BroadcastSink::new());
    let mut sinks: Vec<Arc<dyn AlertSink>> = vec![
        Arc::new(LogSink::new(&config.node_name)),
        alert_stream.clone(),
    ];
    if let Some(url) = &config.webhook_url {
        sinks.push(Arc::new(WebhookSink::new(url, config.webhook_timeout())?));
        info!(webhook = %url, "Webhook alert delivery enabled");
    }
    let relay = Arc::new(AlertRelay::new(sinks));
    info!(sinks = relay.sink_count(), "Alert relay configured");

    let monitor = FeeMonitorBuilder::new()
        .sampler(sampler)
        .relay(relay)
        .interval(config.interval())
        .fetch_timeout(config.fetch_timeout())
        .delivery_attempts(config.delivery_attempts)
        .unhealthy_after(config.unhealthy_after)
        .health(health_registry.clone())
        .metrics(metrics.clone())
        .logger(logger.clone())
        .status(status.clone())
        .build()?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
    let monitor_handle = tokio::spawn(monitor.run(shutdown_rx));

    let app_state = Arc::new(api::AppState::new(
        health_registry,
        metrics,
        status,
        alert_stream,
    ));
    let mut api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    let api_exit = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            logger.log_shutdown("SIGINT received");
            None
        }
        joined = &mut api_handle => {
            logger.log_shutdown("API server exited");
            Some(joined)
        }
    };

    let _ = shutdown_tx.send(());
    monitor_handle.await.context("Monitor loop panicked")?;

    match api_exit {
        None => api_handle.abort(),
        Some(joined) => {
            if let Err(e) = joined.context("API server panicked")? {
                error!(error = %e, "API server failed");
                return Err(e);
            }
        }
    }

    info!("Shutdown complete");
    Ok(())
}
