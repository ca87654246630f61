//! Core data models for the base fee monitor

use std::fmt;
use std::str::FromStr;

use ethnum::U256;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Maximum number of samples the orchestrator keeps in a window
pub const WINDOW_CAPACITY: usize = 2;

/// A single observed base fee value
///
/// Backed by a 256-bit unsigned integer so that delta and threshold
/// arithmetic cannot overflow for any value a node can report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sample(U256);

impl Sample {
    pub const ZERO: Sample = Sample(U256::ZERO);
    pub const MAX: Sample = Sample(U256::MAX);

    pub const fn new(value: U256) -> Self {
        Self(value)
    }

    /// Raw value
    pub const fn value(&self) -> U256 {
        self.0
    }

    /// Parse a JSON-RPC hex quantity such as `0x3b9aca00`
    pub fn from_hex_quantity(quantity: &str) -> Result<Self, ParseSampleError> {
        let digits = quantity
            .strip_prefix("0x")
            .or_else(|| quantity.strip_prefix("0X"))
            .ok_or_else(|| ParseSampleError(quantity.to_string()))?;

        if digits.is_empty() {
            return Err(ParseSampleError(quantity.to_string()));
        }

        U256::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| ParseSampleError(quantity.to_string()))
    }

    /// Value as `i64`, saturating at `i64::MAX` (used for gauges)
    pub fn saturating_i64(&self) -> i64 {
        if *self.0.high() != 0 {
            return i64::MAX;
        }
        i64::try_from(*self.0.low()).unwrap_or(i64::MAX)
    }
}

impl From<u64> for Sample {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl From<u128> for Sample {
    fn from(value: u128) -> Self {
        Self(U256::new(value))
    }
}

impl From<U256> for Sample {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a string is not a valid sample value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid sample value: {0:?}")]
pub struct ParseSampleError(pub String);

impl FromStr for Sample {
    type Err = ParseSampleError;

    /// Accepts decimal (`1000000000`) or hex quantity (`0x3b9aca00`) notation
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with("0x") || s.starts_with("0X") {
            return Self::from_hex_quantity(s);
        }
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseSampleError(s.to_string()));
        }
        U256::from_str_radix(s, 10)
            .map(Self)
            .map_err(|_| ParseSampleError(s.to_string()))
    }
}

// Serialized as a decimal string: JSON numbers cannot hold 256-bit values.
impl Serialize for Sample {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Sample {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SampleVisitor;

        impl<'de> Visitor<'de> for SampleVisitor {
            type Value = Sample;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an unsigned integer or a decimal/hex string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Sample, E> {
                Ok(Sample::from(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Sample, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(SampleVisitor)
    }
}

/// Ordered samples, newest first
///
/// Only the first two entries are consulted by the decision engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleWindow {
    samples: Vec<Sample>,
}

impl SampleWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a window from samples already ordered newest first
    pub fn from_newest_first(samples: impl IntoIterator<Item = Sample>) -> Self {
        Self {
            samples: samples.into_iter().collect(),
        }
    }

    /// Record a new observation, dropping anything older than the previous one
    pub fn push(&mut self, sample: Sample) {
        self.samples.insert(0, sample);
        self.samples.truncate(WINDOW_CAPACITY);
    }

    /// Most recent sample
    pub fn current(&self) -> Option<Sample> {
        self.samples.first().copied()
    }

    /// Sample observed just before `current`
    pub fn previous(&self) -> Option<Sample> {
        self.samples.get(1).copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn as_slice(&self) -> &[Sample] {
        &self.samples
    }
}

/// Opaque bytes forwarded to the alert relay
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AlertPayload(Vec<u8>);

impl AlertPayload {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lossy UTF-8 rendering for logs
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

impl From<&str> for AlertPayload {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for AlertPayload {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl From<&[u8]> for AlertPayload {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

// Hex on the wire so arbitrary bytes survive JSON transport.
impl Serialize for AlertPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for AlertPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        hex::decode(&encoded)
            .map(Self)
            .map_err(de::Error::custom)
    }
}
