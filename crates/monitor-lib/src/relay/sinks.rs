//! Alert sink implementations

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::sync::broadcast;
use tracing::warn;
use url::Url;

use super::{async_trait, AlertEvent, AlertSink, DeliveryError};

/// Default capacity of the broadcast stream
const DEFAULT_BROADCAST_CAPACITY: usize = 256;

/// Writes each event as a structured log entry
pub struct LogSink {
    node_name: String,
}

impl LogSink {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
        }
    }
}

#[async_trait]
impl AlertSink for LogSink {
    async fn publish(&self, event: &AlertEvent) -> Result<(), DeliveryError> {
        warn!(
            event = "basefee_alert",
            node = %self.node_name,
            sequence = event.sequence,
            payload = %event.payload.to_text(),
            payload_len = event.payload.as_bytes().len(),
            emitted_at = %event.emitted_at.to_rfc3339(),
            "Base fee alert"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Publishes events on an in-process broadcast stream
///
/// Having no subscribers is not a delivery failure.
pub struct BroadcastSink {
    tx: broadcast::Sender<AlertEvent>,
}

impl BroadcastSink {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BROADCAST_CAPACITY)
    }

    /// Stream holding up to `capacity` unread events per subscriber (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Receive every event published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<AlertEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertSink for BroadcastSink {
    async fn publish(&self, event: &AlertEvent) -> Result<(), DeliveryError> {
        // Err only means nobody is listening.
        let _ = self.tx.send(event.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "broadcast"
    }
}

/// POSTs each event as JSON to a webhook endpoint
pub struct WebhookSink {
    client: Client,
    url: Url,
    name: String,
}

impl WebhookSink {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let url = Url::parse(url).context("Invalid webhook URL")?;
        let name = format!("webhook:{}", url.host_str().unwrap_or("unknown"));

        Ok(Self { client, url, name })
    }
}

#[async_trait]
impl AlertSink for WebhookSink {
    async fn publish(&self, event: &AlertEvent) -> Result<(), DeliveryError> {
        let body = serde_json::to_vec(event)?;

        let response = self
            .client
            .post(self.url.clone())
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DeliveryError::Status {
                sink: self.name.clone(),
                status: response.status(),
            });
        }

        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AlertPayload;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_broadcast_without_subscribers() {
        let sink = BroadcastSink::new();
        let event = AlertEvent::new(1, AlertPayload::from("x"));
        assert!(sink.publish(&event).await.is_ok());
        assert_eq!(sink.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_broadcast_zero_capacity_clamped() {
        let sink = BroadcastSink::with_capacity(0);
        let mut rx = sink.subscribe();
        let event = AlertEvent::new(1, AlertPayload::from("x"));

        sink.publish(&event).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_broadcast_delivers_to_subscriber() {
        let sink = BroadcastSink::new();
        let mut rx = sink.subscribe();
        let event = AlertEvent::new(1, AlertPayload::from("x"));

        sink.publish(&event).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_webhook_posts_event() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/alerts")
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJsonString(
                r#"{"sequence":7,"payload":"4261736566656520666c7578203e312e3525"}"#.to_string(),
            ))
            .with_status(202)
            .create_async()
            .await;

        let sink = WebhookSink::new(&format!("{}/alerts", server.url()), Duration::from_secs(2))
            .unwrap();
        let event = AlertEvent::new(7, AlertPayload::from("Basefee flux >1.5%"));

        sink.publish(&event).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_webhook_rejection() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(500)
            .create_async()
            .await;

        let sink = WebhookSink::new(&server.url(), Duration::from_secs(2)).unwrap();
        let event = AlertEvent::new(1, AlertPayload::default());

        let err = sink.publish(&event).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Status { status, .. } if status.as_u16() == 500));
    }
}
