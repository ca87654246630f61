//! Alert relay fan-out

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use super::{AlertEvent, AlertSink, DeliveryError};
use crate::models::AlertPayload;

/// Turns payloads into events and publishes them to every sink
pub struct AlertRelay {
    sinks: Vec<Arc<dyn AlertSink>>,
    next_sequence: AtomicU64,
}

/// An event together with the sinks that have not accepted it yet
#[derive(Debug, Clone)]
pub struct PendingAlert {
    event: AlertEvent,
    pending: Vec<usize>,
}

impl PendingAlert {
    pub fn event(&self) -> &AlertEvent {
        &self.event
    }

    pub fn into_event(self) -> AlertEvent {
        self.event
    }

    /// True once every sink has accepted the event
    pub fn is_delivered(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending_sinks(&self) -> usize {
        self.pending.len()
    }
}

impl AlertRelay {
    pub fn new(sinks: Vec<Arc<dyn AlertSink>>) -> Self {
        Self {
            sinks,
            next_sequence: AtomicU64::new(1),
        }
    }

    /// Emit one event carrying `payload` verbatim
    pub async fn transmit(&self, payload: AlertPayload) -> Result<AlertEvent, DeliveryError> {
        let mut alert = self.prepare(payload);
        self.deliver(&mut alert).await?;
        Ok(alert.into_event())
    }

    /// Wrap a payload in an event with the next sequence number, addressed
    /// to every sink
    pub fn prepare(&self, payload: AlertPayload) -> PendingAlert {
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        PendingAlert {
            event: AlertEvent::new(sequence, payload),
            pending: (0..self.sinks.len()).collect(),
        }
    }

    /// Publish a prepared event to the sinks that have not accepted it yet
    ///
    /// Every pending sink is attempted and the first failure is returned.
    /// Sinks that accept the event are never sent it again, so calling this
    /// again after a failure only retries the failed sinks.
    pub async fn deliver(&self, alert: &mut PendingAlert) -> Result<(), DeliveryError> {
        let mut first_error = None;
        let mut still_pending = Vec::new();

        for &index in &alert.pending {
            let sink = &self.sinks[index];
            match sink.publish(&alert.event).await {
                Ok(()) => {
                    debug!(sink = sink.name(), sequence = alert.event.sequence, "Alert delivered");
                }
                Err(e) => {
                    warn!(
                        sink = sink.name(),
                        sequence = alert.event.sequence,
                        error = %e,
                        "Alert delivery failed"
                    );
                    still_pending.push(index);
                    first_error.get_or_insert(e);
                }
            }
        }
        alert.pending = still_pending;

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::{async_trait, BroadcastSink};
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::broadcast::error::TryRecvError;

    /// Sink that fails a fixed number of times before succeeding
    struct FlakySink {
        failures_left: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AlertSink for FlakySink {
        async fn publish(&self, _event: &AlertEvent) -> Result<(), DeliveryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(DeliveryError::Sink {
                    sink: "flaky".to_string(),
                    reason: "down".to_string(),
                });
            }
            Ok(())
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    #[tokio::test]
    async fn test_transmit_emits_exactly_one_event() {
        let broadcast = Arc::new(BroadcastSink::new());
        let mut rx = broadcast.subscribe();
        let relay = AlertRelay::new(vec![broadcast.clone()]);

        let payload = AlertPayload::from("Basefee flux >1.5%");
        relay.transmit(payload.clone()).await.unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.payload.as_bytes(), payload.as_bytes());
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_transmit_empty_payload() {
        let broadcast = Arc::new(BroadcastSink::new());
        let mut rx = broadcast.subscribe();
        let relay = AlertRelay::new(vec![broadcast.clone()]);

        relay.transmit(AlertPayload::default()).await.unwrap();

        let event = rx.recv().await.unwrap();
        assert!(event.payload.is_empty());
    }

    #[tokio::test]
    async fn test_arbitrary_bytes_untouched() {
        let broadcast = Arc::new(BroadcastSink::new());
        let mut rx = broadcast.subscribe();
        let relay = AlertRelay::new(vec![broadcast.clone()]);

        let bytes = vec![0u8, 159, 146, 150, 255];
        relay.transmit(AlertPayload::new(bytes.clone())).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().payload.into_bytes(), bytes);
    }

    #[tokio::test]
    async fn test_sequence_increments() {
        let relay = AlertRelay::new(vec![]);
        let first = relay.transmit(AlertPayload::from("a")).await.unwrap();
        let second = relay.transmit(AlertPayload::from("b")).await.unwrap();
        assert_eq!(second.sequence, first.sequence + 1);
    }

    #[tokio::test]
    async fn test_failing_sink_does_not_block_others() {
        let flaky = Arc::new(FlakySink {
            failures_left: AtomicUsize::new(1),
            calls: AtomicUsize::new(0),
        });
        let broadcast = Arc::new(BroadcastSink::new());
        let mut rx = broadcast.subscribe();
        let relay = AlertRelay::new(vec![flaky.clone(), broadcast.clone()]);
        assert_eq!(relay.sink_count(), 2);

        let mut alert = relay.prepare(AlertPayload::from("x"));
        assert!(relay.deliver(&mut alert).await.is_err());
        assert_eq!(rx.try_recv().unwrap().sequence, alert.event().sequence);
        assert_eq!(alert.pending_sinks(), 1);

        relay.deliver(&mut alert).await.unwrap();
        assert!(alert.is_delivered());
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 2);
        // The broadcast sink already had it
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_delivered_alert_is_not_resent() {
        let broadcast = Arc::new(BroadcastSink::new());
        let mut rx = broadcast.subscribe();
        let relay = AlertRelay::new(vec![broadcast.clone()]);

        let mut alert = relay.prepare(AlertPayload::from("x"));
        relay.deliver(&mut alert).await.unwrap();
        relay.deliver(&mut alert).await.unwrap();

        assert!(rx.try_recv().is_ok());
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }
}
