//! Observation loop
//!
//! Drives the sampler once per period, keeps the two most recent samples,
//! evaluates them and forwards triggered payloads to the relay.

mod r#loop;
mod status;


pub use r#loop::{CycleOutcome, FeeMonitor, FeeMonitorBuilder, MonitorConfig};
pub use status::{MonitorStatus, StatusHandle};
