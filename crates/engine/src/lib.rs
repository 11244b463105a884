//! Permiscan Engine - Permission & Storage Correlation
//!
//! Given deployed smart contracts, this crate determines which
//! functions are access-controlled, by what mechanism (modifier chain,
//! caller-identity check, or both), which persistent state backs that
//! control, and which implementation contract enforces it when the
//! scanned contract is a proxy. Live storage values are correlated
//! back into the per-function permission records.
//!
//! Parsing source into the contract model, block-explorer access and
//! raw storage reads are collaborator seams (`model::adapter`,
//! `explorer`, `rpc`); the engine itself is pure graph walking,
//! state-machine proxy resolution and word decoding.

pub mod analysis;
pub mod error;
pub mod explorer;
pub mod model;
pub mod proxy;
pub mod report;
pub mod rpc;
pub mod scanner;
pub mod storage;

pub use analysis::gates::{ConstantValue, ContractPermissions, PermissionRecord};
pub use analysis::{caller_identity_conditions, classify_contract, collect_modifiers};
pub use error::ScanError;
pub use explorer::{BlockExplorer, ContractMetadata, EtherscanClient};
pub use model::adapter::{AnalysisTarget, ContractModelAdapter, JsonModelAdapter};
pub use model::{ContractModel, FunctionModel, Node, StateVariableModel, MSG_SENDER};
pub use proxy::{ProxyResolver, ProxyState, EIP1967_IMPLEMENTATION_SLOT};
pub use report::{ContractOutcome, ScanReport};
pub use rpc::{BlockTag, JsonRpcStorageReader, StorageReader};
pub use scanner::{ContractScanner, ScanConfig, ScanningEngine};
pub use storage::word::Word;
pub use storage::StorageCorrelator;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
