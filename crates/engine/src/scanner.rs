//! Per-contract pipeline orchestration and batch scanning.
//!
//! One contract's pipeline is strictly sequential: metadata, model
//! load, proxy resolution (with a re-entrant model load for the
//! implementation), gate classification, then storage correlation.
//! Across a batch, contract pipelines are independent and run on a
//! bounded worker pool; a failed contract is logged and skipped
//! without touching any other contract's results.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::analysis::classify_contract;
use crate::error::ScanError;
use crate::explorer::BlockExplorer;
use crate::model::adapter::{AnalysisTarget, ContractModelAdapter};
use crate::model::ContractModel;
use crate::proxy::{is_valid_eth_address, ProxyResolver, ProxyState};
use crate::report::{ContractOutcome, ScanReport};
use crate::rpc::{BlockTag, StorageReader};
use crate::storage::StorageCorrelator;

/// Per-contract scan parameters.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub address: String,
    /// Block to read storage at. Defaults to the chain head.
    pub block: BlockTag,
    /// Name of the implementation contract behind a proxy. Required
    /// manual input once a proxy is detected; byte-code-level name
    /// discovery is outside this engine's scope.
    pub implementation_name: Option<String>,
}

impl ScanConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            block: BlockTag::Latest,
            implementation_name: None,
        }
    }

    pub fn at_block(mut self, block: BlockTag) -> Self {
        self.block = block;
        self
    }

    pub fn with_implementation_name(mut self, name: impl Into<String>) -> Self {
        self.implementation_name = Some(name.into());
        self
    }
}

/// Runs the full pipeline for single contracts. Cheap to clone; all
/// collaborators sit behind `Arc`s.
#[derive(Clone)]
pub struct ContractScanner {
    adapter: Arc<dyn ContractModelAdapter>,
    explorer: Arc<dyn BlockExplorer>,
    reader: Arc<dyn StorageReader>,
    resolver: Arc<ProxyResolver>,
    chain: String,
}

impl ContractScanner {
    pub fn new(
        adapter: Arc<dyn ContractModelAdapter>,
        explorer: Arc<dyn BlockExplorer>,
        reader: Arc<dyn StorageReader>,
        chain: impl Into<String>,
    ) -> Self {
        Self {
            adapter,
            explorer,
            reader,
            resolver: Arc::new(ProxyResolver::default()),
            chain: chain.into(),
        }
    }

    pub fn with_proxy_markers(mut self, markers: Vec<String>) -> Self {
        self.resolver = Arc::new(ProxyResolver::new(markers));
        self
    }

    async fn load_named_contract(
        &self,
        address: &str,
        name: &str,
    ) -> Result<ContractModel, ScanError> {
        let target = AnalysisTarget::Chain {
            chain: self.chain.clone(),
            address: address.to_string(),
        };
        let contracts = self.adapter.load_contracts(&target).await?;
        contracts
            .into_iter()
            .find(|c| c.name == name)
            .ok_or_else(|| ScanError::Resolution {
                name: name.to_string(),
                address: address.to_string(),
            })
    }

    /// Scans one contract end to end. Returns the report key (the
    /// contract name, or the implementation name for proxies) and the
    /// assembled outcome.
    pub async fn scan(&self, config: &ScanConfig) -> Result<(String, ContractOutcome), ScanError> {
        if !is_valid_eth_address(&config.address) {
            return Err(ScanError::Configuration(format!(
                "not a valid contract address: {}",
                config.address
            )));
        }

        let metadata = self.explorer.fetch_contract_metadata(&config.address).await?;
        let contract = self
            .load_named_contract(&config.address, &metadata.contract_name)
            .await?;

        // The explorer's proxy flag and the inheritance markers are
        // alternative signals for the same transition.
        let mut state = self.resolver.detect(&contract);
        if state == ProxyState::Standalone && metadata.is_proxy {
            state = ProxyState::PendingImplementation;
        }

        if state == ProxyState::PendingImplementation {
            let implementation_name = config.implementation_name.clone().ok_or_else(|| {
                ScanError::Configuration(format!(
                    "{} is a proxy but no implementation contract name was supplied",
                    config.address
                ))
            })?;
            self.scan_proxy(config, contract, &implementation_name).await
        } else {
            self.scan_standalone(config, contract).await
        }
    }

    async fn scan_standalone(
        &self,
        config: &ScanConfig,
        contract: ContractModel,
    ) -> Result<(String, ContractOutcome), ScanError> {
        let classified = classify_contract(&contract);
        let mut permissions = classified.permissions;

        let correlator =
            StorageCorrelator::new(self.reader.as_ref(), config.address.clone(), config.block.clone());
        let storage_values = correlator
            .correlate(&contract, &classified.targets, &mut permissions)
            .await?;

        let outcome = ContractOutcome::standalone(config.address.clone(), permissions)
            .with_storage_values(storage_values);
        Ok((contract.name, outcome))
    }

    async fn scan_proxy(
        &self,
        config: &ScanConfig,
        proxy_contract: ContractModel,
        implementation_name: &str,
    ) -> Result<(String, ContractOutcome), ScanError> {
        let resolved = self
            .resolver
            .resolve(
                self.reader.as_ref(),
                &config.address,
                &config.block,
                implementation_name,
            )
            .await?;

        let implementation_address = match resolved {
            ProxyState::Resolved {
                implementation_address,
                ..
            } => implementation_address,
            _ => {
                return Err(ScanError::Decode(format!(
                    "proxy resolution did not complete for {}",
                    config.address
                )))
            }
        };

        let implementation = self
            .load_named_contract(&implementation_address, implementation_name)
            .await?;

        let proxy_classified = classify_contract(&proxy_contract);
        let impl_classified = classify_contract(&implementation);

        let mut targets: BTreeSet<String> = proxy_classified.targets;
        targets.extend(impl_classified.targets);

        let mut permissions = impl_classified.permissions;

        // Delegate-call semantics: the implementation declares the
        // variables, the proxy's storage holds the values.
        let correlator =
            StorageCorrelator::new(self.reader.as_ref(), config.address.clone(), config.block.clone());
        let storage_values = correlator
            .correlate(&implementation, &targets, &mut permissions)
            .await?;

        let outcome = ContractOutcome::proxied(
            config.address.clone(),
            implementation_address,
            proxy_classified.permissions,
            permissions,
        )
        .with_storage_values(storage_values);

        Ok((implementation_name.to_string(), outcome))
    }
}

/// Batch runner: independent per-contract pipelines on a bounded
/// worker pool, folded into one report. The report map is the only
/// shared structure and is only written from the join loop.
pub struct ScanningEngine {
    scanner: ContractScanner,
    concurrency: usize,
}

impl ScanningEngine {
    pub fn new(scanner: ContractScanner) -> Self {
        Self {
            scanner,
            concurrency: 4,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub async fn scan_batch(&self, configs: Vec<ScanConfig>) -> ScanReport {
        let limiter = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for config in configs {
            let scanner = self.scanner.clone();
            let limiter = Arc::clone(&limiter);
            tasks.spawn(async move {
                // Never closed while tasks are alive.
                let _permit = limiter.acquire_owned().await.expect("scan pool limiter closed");
                let result = scanner.scan(&config).await;
                (config.address, result)
            });
        }

        let mut report = ScanReport::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((address, Ok((key, outcome)))) => {
                    info!(%address, contract = %key, "contract scan completed");
                    report.insert(key, outcome);
                }
                Ok((address, Err(e))) => {
                    error!(%address, %e, "contract scan failed, skipping");
                }
                Err(e) => {
                    error!(%e, "scan task aborted");
                }
            }
        }
        report
    }
}
