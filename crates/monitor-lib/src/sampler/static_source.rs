//! In-memory fee source
//!
//! Holds a value that can be replaced at runtime. Used by tests, demos and
//! deployments that push fee values from another component.

use std::sync::RwLock;

use super::{async_trait, FeeSource, SampleError};
use crate::models::Sample;

pub struct StaticFeeSource {
    value: RwLock<Option<Sample>>,
}

impl StaticFeeSource {
    pub fn new(value: Sample) -> Self {
        Self {
            value: RwLock::new(Some(value)),
        }
    }

    /// A source that fails every read until [`set`](Self::set) is called
    pub fn unavailable() -> Self {
        Self {
            value: RwLock::new(None),
        }
    }

    pub fn set(&self, value: Sample) {
        *self.value.write().unwrap_or_else(|e| e.into_inner()) = Some(value);
    }

    /// Make subsequent reads fail
    pub fn clear(&self) {
        *self.value.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

#[async_trait]
impl FeeSource for StaticFeeSource {
    async fn fetch_base_fee(&self) -> Result<Sample, SampleError> {
        let value = *self.value.read().unwrap_or_else(|e| e.into_inner());
        value.ok_or_else(|| SampleError::Unavailable("no value set".to_string()))
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}
