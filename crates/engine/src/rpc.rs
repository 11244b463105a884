//! Storage reader collaborator: raw `eth_getStorageAt` reads.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::ScanError;
use crate::storage::word::Word;

/// Block to read storage at. Historical blocks require an archive node
/// behind the RPC URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BlockTag {
    #[default]
    Latest,
    Number(u64),
}

impl BlockTag {
    pub fn as_param(&self) -> String {
        match self {
            BlockTag::Latest => "latest".to_string(),
            BlockTag::Number(n) => format!("0x{n:x}"),
        }
    }
}

impl FromStr for BlockTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latest" => Ok(BlockTag::Latest),
            other => other
                .parse::<u64>()
                .map(BlockTag::Number)
                .map_err(|_| format!("invalid block tag: {other}")),
        }
    }
}

/// Raw storage access at a fixed block.
#[async_trait]
pub trait StorageReader: Send + Sync {
    async fn get_storage_at(
        &self,
        address: &str,
        slot: Word,
        block: &BlockTag,
    ) -> Result<Word, ScanError>;
}

/// JSON-RPC storage reader with bounded retry and doubling delay.
pub struct JsonRpcStorageReader {
    client: reqwest::Client,
    url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl JsonRpcStorageReader {
    pub fn new(url: impl Into<String>) -> Result<Self, ScanError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ScanError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
        })
    }

    pub fn with_retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    async fn request_once(
        &self,
        address: &str,
        slot: &Word,
        block: &BlockTag,
    ) -> Result<Word, ScanError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": "eth_getStorageAt",
            "params": [address, slot.to_hex(), block.as_param()],
            "id": 1,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ScanError::Network(format!("eth_getStorageAt transport failure: {e}")))?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ScanError::Network(format!("malformed RPC response: {e}")))?;

        if let Some(error) = body.get("error") {
            return Err(ScanError::Api(format!("RPC error: {error}")));
        }

        let result = body
            .get("result")
            .and_then(|r| r.as_str())
            .ok_or_else(|| ScanError::Decode("RPC response missing result field".to_string()))?;

        Word::from_hex(result)
    }
}

#[async_trait]
impl StorageReader for JsonRpcStorageReader {
    async fn get_storage_at(
        &self,
        address: &str,
        slot: Word,
        block: &BlockTag,
    ) -> Result<Word, ScanError> {
        debug!(%address, slot = %slot, block = %block.as_param(), "reading storage");

        let mut delay = self.retry_delay;
        let mut attempt = 0;
        loop {
            match self.request_once(address, &slot, block).await {
                Ok(word) => return Ok(word),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(%address, %e, attempt, "storage read failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
