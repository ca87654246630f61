//! Snapshot of the monitor's most recent cycle, shared with the API

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::decision::Decision;
use crate::models::Sample;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorStatus {
    /// Window contents, newest first
    pub window: Vec<Sample>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_decision: Option<Decision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_alert_sequence: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub cycles: u64,
    pub alerts: u64,
    pub skipped: u64,
    pub delivery_failures: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Cloneable handle to the shared status
#[derive(Debug, Clone, Default)]
pub struct StatusHandle {
    inner: Arc<RwLock<MonitorStatus>>,
}

impl StatusHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> MonitorStatus {
        self.inner.read().await.clone()
    }

    pub(crate) async fn update(&self, f: impl FnOnce(&mut MonitorStatus)) {
        let mut status = self.inner.write().await;
        f(&mut status);
        status.updated_at = Some(Utc::now());
    }
}
