//! Base fee flux monitor library
//!
//! This crate provides:
//! - Base fee sampling from an injected fee source (JSON-RPC or in-memory)
//! - A pure two-sample decision engine (~1.5% flux threshold)
//! - An alert relay publishing payloads to log, broadcast and webhook sinks
//! - The periodic observation loop tying them together
//! - Health checks and observability

pub mod decision;
pub mod health;
pub mod models;
pub mod monitor;
pub mod observability;
pub mod relay;
pub mod sampler;

pub use decision::{Decision, DecisionEngine, Flux};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{MonitorMetrics, StructuredLogger};
