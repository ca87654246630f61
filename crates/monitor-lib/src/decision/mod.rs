//! Base fee flux detection
//!
//! Compares the two most recent samples of a window and decides whether the
//! relative change crosses the fixed ~1.5% threshold.

mod engine;

pub use engine::{
    Decision, DecisionEngine, Flux, INSUFFICIENT_SAMPLES, STABLE_BASEFEE, THRESHOLD_DIVISOR,
    TRIGGERED_BASEFEE,
};
