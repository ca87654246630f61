use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::AlertPayload;

/// Observable event emitted once per relay transmission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEvent {
    /// Monotonic per-relay sequence number
    pub sequence: u64,
    /// Payload exactly as handed to the relay, hex-encoded on the wire
    pub payload: AlertPayload,
    /// Emission time (RFC3339 in JSON)
    pub emitted_at: DateTime<Utc>,
}

impl AlertEvent {
    pub fn new(sequence: u64, payload: AlertPayload) -> Self {
        Self {
            sequence,
            payload,
            emitted_at: Utc::now(),
        }
    }
}
