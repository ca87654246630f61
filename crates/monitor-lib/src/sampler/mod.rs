//! Base fee sampling
//!
//! The sampler reads the current base fee from an injected [`FeeSource`].
//! A failed read is surfaced as a [`SampleError`]; it is never turned into a
//! zero-valued sample.

mod rpc;
mod static_source;

pub use rpc::RpcFeeSource;
pub use static_source::StaticFeeSource;

use std::sync::Arc;

use crate::models::Sample;

pub use async_trait::async_trait;

/// Reasons a base fee read can fail
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("fee source returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("latest block has no baseFeePerGas")]
    MissingBaseFee,

    #[error("invalid fee quantity: {0}")]
    InvalidQuantity(String),

    #[error("fee source did not answer within {0:?}")]
    Timeout(std::time::Duration),

    #[error("fee source unavailable: {0}")]
    Unavailable(String),
}

/// Source of the current base fee
#[async_trait]
pub trait FeeSource: Send + Sync {
    /// Read the base fee at call time
    async fn fetch_base_fee(&self) -> Result<Sample, SampleError>;

    /// Human-readable description for logs
    fn describe(&self) -> String;
}

/// Collects one sample per call from its fee source
#[derive(Clone)]
pub struct Sampler {
    source: Arc<dyn FeeSource>,
}

impl Sampler {
    pub fn new(source: Arc<dyn FeeSource>) -> Self {
        Self { source }
    }

    /// Read the current base fee
    pub async fn collect(&self) -> Result<Sample, SampleError> {
        let sample = self.source.fetch_base_fee().await?;
        tracing::trace!(source = %self.source.describe(), base_fee = %sample, "Collected sample");
        Ok(sample)
    }

    pub fn source(&self) -> &Arc<dyn FeeSource> {
        &self.source
    }
}

/// Create a sampler backed by a JSON-RPC node
pub fn create_rpc_sampler(rpc_url: &str, timeout: std::time::Duration) -> anyhow::Result<Sampler> {
    let source = RpcFeeSource::new(rpc_url, timeout)?;
    tracing::info!(rpc_url = %rpc_url, "Using JSON-RPC fee source");
    Ok(Sampler::new(Arc::new(source)))
}
