//! Block explorer collaborator: verified-contract metadata.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::ScanError;

/// Metadata for a verified contract as reported by the explorer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractMetadata {
    pub contract_name: String,
    pub is_proxy: bool,
    pub implementation_address: Option<String>,
}

#[async_trait]
pub trait BlockExplorer: Send + Sync {
    async fn fetch_contract_metadata(&self, address: &str) -> Result<ContractMetadata, ScanError>;
}

/// Etherscan v2 client. One base URL serves all supported chains,
/// selected by the `chainid` query parameter.
#[derive(Debug)]
pub struct EtherscanClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    chain_id: u64,
    max_retries: u32,
    retry_delay: Duration,
}

impl EtherscanClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.etherscan.io/v2/api";

    pub fn new(api_key: impl Into<String>, chain_id: u64) -> Result<Self, ScanError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ScanError::Configuration(
                "block explorer API key is required".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ScanError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            api_key,
            chain_id,
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get_source_metadata(&self, address: &str) -> Result<ContractMetadata, ScanError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("chainid", self.chain_id.to_string().as_str()),
                ("module", "contract"),
                ("action", "getsourcecode"),
                ("address", address),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ScanError::Network(format!("explorer transport failure: {e}")))?;

        if !response.status().is_success() {
            return Err(ScanError::Api(format!(
                "explorer returned HTTP {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ScanError::Network(format!("malformed explorer response: {e}")))?;

        if body.get("status").and_then(|s| s.as_str()) != Some("1") {
            let message = body
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error");
            return Err(ScanError::Api(format!("explorer error: {message}")));
        }

        let info = body
            .get("result")
            .and_then(|r| r.as_array())
            .and_then(|arr| arr.first())
            .ok_or_else(|| ScanError::Api("explorer returned no contract data".to_string()))?;

        let contract_name = info
            .get("ContractName")
            .and_then(|n| n.as_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ScanError::Api(format!("contract at {address} is not verified")))?
            .to_string();

        let is_proxy = info.get("Proxy").and_then(|p| p.as_str()) == Some("1");
        let implementation_address = info
            .get("Implementation")
            .and_then(|i| i.as_str())
            .filter(|i| !i.is_empty())
            .map(str::to_string);

        Ok(ContractMetadata {
            contract_name,
            is_proxy,
            implementation_address,
        })
    }
}

#[async_trait]
impl BlockExplorer for EtherscanClient {
    async fn fetch_contract_metadata(&self, address: &str) -> Result<ContractMetadata, ScanError> {
        debug!(%address, chain_id = self.chain_id, "fetching contract metadata");

        let mut delay = self.retry_delay;
        let mut attempt = 0;
        loop {
            match self.get_source_metadata(address).await {
                Ok(metadata) => return Ok(metadata),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(%address, %e, attempt, "metadata fetch failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
