//! Alert relay
//!
//! Republishes decision payloads as observable events. The relay never
//! inspects or filters a payload; each `transmit` call emits exactly one
//! event, fanned out to every configured sink:
//! - structured log entry
//! - in-process broadcast stream
//! - HTTP webhook

mod event;
mod sinks;
mod transmitter;

pub use event::AlertEvent;
pub use sinks::{BroadcastSink, LogSink, WebhookSink};
pub use transmitter::{AlertRelay, PendingAlert};

pub use async_trait::async_trait;

/// Reasons an event could not be delivered to a sink
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("sink {sink} rejected event with HTTP {status}")]
    Status {
        sink: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("sink {sink} failed: {reason}")]
    Sink { sink: String, reason: String },
}

/// Destination for alert events
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Publish one event
    async fn publish(&self, event: &AlertEvent) -> Result<(), DeliveryError>;

    /// Sink name for logs
    fn name(&self) -> &str;
}
