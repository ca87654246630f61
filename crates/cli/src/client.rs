//! HTTP client for a running basefee-agent

use anyhow::{Context, Result};
use monitor_lib::{monitor::MonitorStatus, HealthResponse};
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

pub struct AgentClient {
    client: Client,
    base_url: Url,
}

impl AgentClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid agent URL")?;

        Ok(Self { client, base_url })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to reach agent")?;

        // /healthz answers 503 with a valid body when unhealthy
        if !response.status().is_success() && response.status().as_u16() != 503 {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Agent error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse agent response")
    }

    pub async fn status(&self) -> Result<MonitorStatus> {
        self.get("status").await
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        self.get("healthz").await
    }
}
