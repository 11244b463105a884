//! Mock collaborators for driving the full pipeline in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use permiscan_engine::{
    AnalysisTarget, BlockExplorer, BlockTag, ContractMetadata, ContractModel,
    ContractModelAdapter, ScanError, StorageReader, Word,
};

/// Adapter serving pre-built contract models per address.
#[derive(Default)]
pub struct MockAdapter {
    models: HashMap<String, Vec<ContractModel>>,
}

impl MockAdapter {
    pub fn with_models(mut self, address: &str, models: Vec<ContractModel>) -> Self {
        self.models.insert(address.to_lowercase(), models);
        self
    }
}

#[async_trait]
impl ContractModelAdapter for MockAdapter {
    async fn load_contracts(
        &self,
        target: &AnalysisTarget,
    ) -> Result<Vec<ContractModel>, ScanError> {
        let address = match target {
            AnalysisTarget::Chain { address, .. } => address.to_lowercase(),
            AnalysisTarget::Local { path } => path.display().to_string(),
        };
        self.models
            .get(&address)
            .cloned()
            .ok_or_else(|| ScanError::Compilation {
                target: target.describe(),
                reason: "no source available".to_string(),
            })
    }
}

/// Explorer serving fixed metadata per address.
#[derive(Default)]
pub struct MockExplorer {
    metadata: HashMap<String, ContractMetadata>,
}

impl MockExplorer {
    pub fn with_contract(mut self, address: &str, name: &str, is_proxy: bool) -> Self {
        self.metadata.insert(
            address.to_lowercase(),
            ContractMetadata {
                contract_name: name.to_string(),
                is_proxy,
                implementation_address: None,
            },
        );
        self
    }
}

#[async_trait]
impl BlockExplorer for MockExplorer {
    async fn fetch_contract_metadata(&self, address: &str) -> Result<ContractMetadata, ScanError> {
        self.metadata
            .get(&address.to_lowercase())
            .cloned()
            .ok_or_else(|| ScanError::Api(format!("contract at {address} is not verified")))
    }
}

/// Storage reader serving fixed words per `(address, slot)`.
#[derive(Default)]
pub struct MockReader {
    values: HashMap<(String, Word), Word>,
}

impl MockReader {
    pub fn with_slot(mut self, address: &str, slot: Word, value: Word) -> Self {
        self.values.insert((address.to_lowercase(), slot), value);
        self
    }
}

#[async_trait]
impl StorageReader for MockReader {
    async fn get_storage_at(
        &self,
        address: &str,
        slot: Word,
        _block: &BlockTag,
    ) -> Result<Word, ScanError> {
        self.values
            .get(&(address.to_lowercase(), slot))
            .copied()
            .ok_or_else(|| ScanError::Network(format!("no storage fixture at {slot}")))
    }
}
