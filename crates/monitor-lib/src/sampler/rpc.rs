//! JSON-RPC fee source
//!
//! Reads `baseFeePerGas` from the latest block via `eth_getBlockByNumber`.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{async_trait, FeeSource, SampleError};
use crate::models::Sample;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: (&'a str, bool),
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<BlockHeader>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockHeader {
    #[serde(default)]
    base_fee_per_gas: Option<String>,
    #[serde(default)]
    number: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Fee source backed by an Ethereum-style JSON-RPC endpoint
pub struct RpcFeeSource {
    client: Client,
    endpoint: Url,
    timeout: Duration,
}

impl RpcFeeSource {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let endpoint = Url::parse(endpoint).context("Invalid RPC URL")?;

        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    async fn latest_block(&self) -> Result<BlockHeader, SampleError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "eth_getBlockByNumber",
            params: ("latest", false),
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        if !response.status().is_success() {
            return Err(SampleError::Status(response.status()));
        }

        let body: RpcResponse = response.json().await.map_err(|e| self.map_transport(e))?;

        if let Some(error) = body.error {
            return Err(SampleError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        body.result
            .ok_or_else(|| SampleError::Unavailable("node returned no latest block".to_string()))
    }

    fn map_transport(&self, error: reqwest::Error) -> SampleError {
        if error.is_timeout() {
            SampleError::Timeout(self.timeout)
        } else {
            SampleError::Transport(error)
        }
    }
}

#[async_trait]
impl FeeSource for RpcFeeSource {
    async fn fetch_base_fee(&self) -> Result<Sample, SampleError> {
        let block = self.latest_block().await?;

        let quantity = block.base_fee_per_gas.ok_or(SampleError::MissingBaseFee)?;
        let sample = Sample::from_hex_quantity(&quantity)
            .map_err(|_| SampleError::InvalidQuantity(quantity.clone()))?;

        tracing::debug!(
            block = block.number.as_deref().unwrap_or("unknown"),
            base_fee = %sample,
            "Fetched latest base fee"
        );

        Ok(sample)
    }

    fn describe(&self) -> String {
        format!("json-rpc {}", self.endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn source(server: &mockito::ServerGuard) -> RpcFeeSource {
        RpcFeeSource::new(&server.url(), Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_base_fee() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJsonString(
                r#"{"method":"eth_getBlockByNumber","params":["latest",false]}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"jsonrpc":"2.0","id":1,"result":{"number":"0x10","baseFeePerGas":"0x3b9aca00"}}"#,
            )
            .create_async()
            .await;

        let sample = source(&server).fetch_base_fee().await.unwrap();

        assert_eq!(sample, Sample::from(1_000_000_000u64));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_pre_london_block() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":{"number":"0x1"}}"#)
            .create_async()
            .await;

        let err = source(&server).fetch_base_fee().await.unwrap_err();
        assert!(matches!(err, SampleError::MissingBaseFee));
    }

    #[tokio::test]
    async fn test_rpc_error_object() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(
                r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32005,"message":"rate limited"}}"#,
            )
            .create_async()
            .await;

        let err = source(&server).fetch_base_fee().await.unwrap_err();
        match err {
            SampleError::Rpc { code, message } => {
                assert_eq!(code, -32005);
                assert_eq!(message, "rate limited");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_http_status_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(503)
            .create_async()
            .await;

        let err = source(&server).fetch_base_fee().await.unwrap_err();
        assert!(matches!(err, SampleError::Status(s) if s.as_u16() == 503));
    }

    #[tokio::test]
    async fn test_malformed_quantity() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":{"baseFeePerGas":"0xzz"}}"#)
            .create_async()
            .await;

        let err = source(&server).fetch_base_fee().await.unwrap_err();
        assert!(matches!(err, SampleError::InvalidQuantity(q) if q == "0xzz"));
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(RpcFeeSource::new("not a url", Duration::from_secs(1)).is_err());
    }
}
