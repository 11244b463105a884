//! Seam to the static-analysis front-end.
//!
//! Parsing verified source into a [`ContractModel`] is out of scope
//! for the engine; implementations of [`ContractModelAdapter`] wrap
//! whatever front-end is available. The bundled [`JsonModelAdapter`]
//! deserializes pre-extracted models from disk, which is also what the
//! integration tests drive the pipeline with.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::ScanError;
use crate::model::ContractModel;

/// What the front-end should analyze.
#[derive(Debug, Clone)]
pub enum AnalysisTarget {
    /// A deployed contract, identified by chain and address. The
    /// front-end is expected to fetch and compile the verified source.
    Chain { chain: String, address: String },
    /// A local file holding already-extracted contract models.
    Local { path: PathBuf },
}

impl AnalysisTarget {
    pub fn describe(&self) -> String {
        match self {
            AnalysisTarget::Chain { chain, address } => format!("{chain}:{address}"),
            AnalysisTarget::Local { path } => path.display().to_string(),
        }
    }
}

/// Front-end collaborator producing contract models.
///
/// A target usually yields several contracts (the unit plus its
/// inherited bases and libraries); the caller picks the one it wants
/// by name.
#[async_trait]
pub trait ContractModelAdapter: Send + Sync {
    async fn load_contracts(
        &self,
        target: &AnalysisTarget,
    ) -> Result<Vec<ContractModel>, ScanError>;
}

/// Adapter reading serialized contract models from a directory tree.
///
/// Chain targets map to `<root>/<chain>/<address>.json`; local targets
/// are read as given. Each file holds a JSON array of contract models.
pub struct JsonModelAdapter {
    root: PathBuf,
}

impl JsonModelAdapter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, target: &AnalysisTarget) -> PathBuf {
        match target {
            AnalysisTarget::Chain { chain, address } => self
                .root
                .join(chain)
                .join(format!("{}.json", address.to_lowercase())),
            AnalysisTarget::Local { path } => path.clone(),
        }
    }

    async fn read_models(&self, path: &Path, target: &AnalysisTarget) -> Result<Vec<ContractModel>, ScanError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ScanError::Compilation {
                target: target.describe(),
                reason: format!("no contract model at {}: {e}", path.display()),
            })?;

        serde_json::from_str(&raw).map_err(|e| ScanError::Compilation {
            target: target.describe(),
            reason: format!("malformed contract model: {e}"),
        })
    }
}

#[async_trait]
impl ContractModelAdapter for JsonModelAdapter {
    async fn load_contracts(
        &self,
        target: &AnalysisTarget,
    ) -> Result<Vec<ContractModel>, ScanError> {
        let path = self.path_for(target);
        self.read_models(&path, target).await
    }
}
