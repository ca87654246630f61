//! Two-sample flux decision
//!
//! The threshold is `previous / 66` with floor division, an approximation of
//! 1.5% (1/66 ≈ 1.515%). The rounding is part of the contract and must not
//! be replaced by exact percentage arithmetic.

use ethnum::U256;
use serde::{Deserialize, Serialize};

use crate::models::{AlertPayload, Sample, SampleWindow};

/// Divisor applied to the previous sample to derive the threshold
pub const THRESHOLD_DIVISOR: u64 = 66;

/// Payload when the window holds fewer than two samples
pub const INSUFFICIENT_SAMPLES: &str = "Insufficient samples";
/// Payload when the change stays within the threshold
pub const STABLE_BASEFEE: &str = "Stable basefee";
/// Payload when the change exceeds the threshold
pub const TRIGGERED_BASEFEE: &str = "Basefee flux >1.5%";

/// Intermediate values of one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flux {
    pub current: Sample,
    pub previous: Sample,
    /// `|current - previous|`
    pub delta: Sample,
    /// `previous / 66`
    pub threshold: Sample,
}

impl Flux {
    /// Strict comparison: a delta equal to the threshold is stable
    pub fn exceeds_threshold(&self) -> bool {
        self.delta > self.threshold
    }

    /// Change relative to `previous` in basis points, `None` when previous is zero
    pub fn basis_points(&self) -> Option<U256> {
        let previous = self.previous.value();
        if previous == U256::ZERO {
            return None;
        }
        // Scale the divisor instead when delta * 10_000 overflows.
        let delta = self.delta.value();
        match delta.checked_mul(U256::new(10_000)) {
            Some(scaled) => Some(scaled / previous),
            None => Some(delta / (previous / U256::new(10_000)).max(U256::ONE)),
        }
    }

    /// Whether the fee went up
    pub fn is_rising(&self) -> bool {
        self.current > self.previous
    }
}

/// Outcome of evaluating a sample window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "flux", rename_all = "snake_case")]
pub enum Decision {
    /// Fewer than two samples; wait for more data
    NotEnoughData,
    /// Evaluated, change within threshold
    Stable(Flux),
    /// Evaluated, change above threshold; forward to the relay
    Triggered(Flux),
}

impl Decision {
    /// Whether the relay should be invoked
    pub fn should_respond(&self) -> bool {
        matches!(self, Decision::Triggered(_))
    }

    pub fn flux(&self) -> Option<&Flux> {
        match self {
            Decision::NotEnoughData => None,
            Decision::Stable(flux) | Decision::Triggered(flux) => Some(flux),
        }
    }

    /// Canonical payload text for this outcome
    pub fn message(&self) -> &'static str {
        match self {
            Decision::NotEnoughData => INSUFFICIENT_SAMPLES,
            Decision::Stable(_) => STABLE_BASEFEE,
            Decision::Triggered(_) => TRIGGERED_BASEFEE,
        }
    }

    pub fn payload(&self) -> AlertPayload {
        AlertPayload::from(self.message())
    }

    /// `(should_respond, payload)` pair
    pub fn into_legacy(self) -> (bool, AlertPayload) {
        (self.should_respond(), self.payload())
    }

    /// Short label used in logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Decision::NotEnoughData => "not_enough_data",
            Decision::Stable(_) => "stable",
            Decision::Triggered(_) => "triggered",
        }
    }
}

/// Stateless base fee flux detector
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionEngine;

impl DecisionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate the two newest samples of `window`
    ///
    /// Total over every input: never fails, never panics, and returns the
    /// same decision for the same window.
    pub fn evaluate(&self, window: &SampleWindow) -> Decision {
        let (current, previous) = match (window.current(), window.previous()) {
            (Some(current), Some(previous)) => (current, previous),
            _ => return Decision::NotEnoughData,
        };

        let flux = Self::measure(current, previous);

        if flux.exceeds_threshold() {
            Decision::Triggered(flux)
        } else {
            Decision::Stable(flux)
        }
    }

    /// Compute delta and threshold for a pair
    pub fn measure(current: Sample, previous: Sample) -> Flux {
        Flux {
            current,
            previous,
            delta: Self::delta(current, previous),
            threshold: Self::threshold(previous),
        }
    }

    /// Absolute difference, never wraps
    pub fn delta(a: Sample, b: Sample) -> Sample {
        let (a, b) = (a.value(), b.value());
        if a >= b {
            Sample::new(a - b)
        } else {
            Sample::new(b - a)
        }
    }

    /// `previous / 66`, floor division; zero when `previous` is zero
    pub fn threshold(previous: Sample) -> Sample {
        Sample::new(previous.value() / U256::from(THRESHOLD_DIVISOR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(values: &[u64]) -> SampleWindow {
        SampleWindow::from_newest_first(values.iter().map(|v| Sample::from(*v)))
    }

    fn s(v: u64) -> Sample {
        Sample::from(v)
    }

    #[test]
    fn test_threshold_boundaries() {
        assert_eq!(DecisionEngine::threshold(s(0)), s(0));
        assert_eq!(DecisionEngine::threshold(s(65)), s(0));
        assert_eq!(DecisionEngine::threshold(s(66)), s(1));
        assert_eq!(DecisionEngine::threshold(s(100)), s(1));
        assert_eq!(DecisionEngine::threshold(s(131)), s(1));
        assert_eq!(DecisionEngine::threshold(s(132)), s(2));
    }

    #[test]
    fn test_delta_is_symmetric() {
        assert_eq!(DecisionEngine::delta(s(102), s(100)), s(2));
        assert_eq!(DecisionEngine::delta(s(100), s(102)), s(2));
        assert_eq!(DecisionEngine::delta(s(7), s(7)), s(0));
    }

    #[test]
    fn test_delta_at_extremes() {
        assert_eq!(DecisionEngine::delta(Sample::MAX, Sample::ZERO), Sample::MAX);
        assert_eq!(DecisionEngine::delta(Sample::ZERO, Sample::MAX), Sample::MAX);
    }

    #[test]
    fn test_insufficient_samples() {
        let engine = DecisionEngine::new();
        assert_eq!(engine.evaluate(&window(&[])), Decision::NotEnoughData);
        assert_eq!(engine.evaluate(&window(&[100])), Decision::NotEnoughData);

        let (respond, payload) = engine.evaluate(&window(&[100])).into_legacy();
        assert!(!respond);
        assert_eq!(payload.as_bytes(), b"Insufficient samples");
    }

    #[test]
    fn test_equal_samples_are_stable() {
        let decision = DecisionEngine::new().evaluate(&window(&[100, 100]));
        match decision {
            Decision::Stable(flux) => {
                assert_eq!(flux.delta, s(0));
                assert_eq!(flux.threshold, s(1));
            }
            other => panic!("expected stable, got {:?}", other),
        }
    }

    #[test]
    fn test_delta_above_threshold_triggers() {
        let decision = DecisionEngine::new().evaluate(&window(&[102, 100]));
        assert!(decision.should_respond());

        let (respond, payload) = decision.into_legacy();
        assert!(respond);
        assert_eq!(payload.as_bytes(), b"Basefee flux >1.5%");
    }

    #[test]
    fn test_delta_equal_to_threshold_is_stable() {
        let decision = DecisionEngine::new().evaluate(&window(&[101, 100]));
        assert!(matches!(decision, Decision::Stable(_)));
        assert_eq!(decision.payload().as_bytes(), b"Stable basefee");
    }

    #[test]
    fn test_falling_fee_triggers() {
        let decision = DecisionEngine::new().evaluate(&window(&[98, 100]));
        assert!(decision.should_respond());
        assert!(!decision.flux().unwrap().is_rising());
    }

    #[test]
    fn test_zero_previous_triggers_on_any_change() {
        let engine = DecisionEngine::new();
        assert!(engine.evaluate(&window(&[5, 0])).should_respond());
        assert!(engine.evaluate(&window(&[1, 0])).should_respond());
        assert!(!engine.evaluate(&window(&[0, 0])).should_respond());
    }

    #[test]
    fn test_extra_samples_ignored() {
        let engine = DecisionEngine::new();
        assert_eq!(
            engine.evaluate(&window(&[100, 100, 1])),
            engine.evaluate(&window(&[100, 100]))
        );
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let engine = DecisionEngine::new();
        let w = window(&[30_000_000_000, 29_000_000_000]);
        assert_eq!(engine.evaluate(&w), engine.evaluate(&w));
    }

    #[test]
    fn test_wide_values() {
        let engine = DecisionEngine::new();
        let w = SampleWindow::from_newest_first([Sample::MAX, Sample::MAX]);
        assert!(matches!(engine.evaluate(&w), Decision::Stable(_)));

        let w = SampleWindow::from_newest_first([Sample::ZERO, Sample::MAX]);
        assert!(engine.evaluate(&w).should_respond());
    }

    #[test]
    fn test_basis_points() {
        let flux = DecisionEngine::measure(s(102), s(100));
        assert_eq!(flux.basis_points(), Some(U256::new(200)));

        let flux = DecisionEngine::measure(s(5), s(0));
        assert_eq!(flux.basis_points(), None);
    }
}
