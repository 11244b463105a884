//! Final batch report assembly. Pure data folding; all decisions were
//! made upstream.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::gates::ContractPermissions;

/// Per-contract outcome keyed into the batch report. Standalone
/// contracts carry `Address`; proxied ones carry both proxy and
/// implementation addresses plus the proxy's own gated functions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractOutcome {
    #[serde(rename = "Address", skip_serializing_if = "Option::is_none", default)]
    pub address: Option<String>,

    #[serde(rename = "Proxy_Address", skip_serializing_if = "Option::is_none", default)]
    pub proxy_address: Option<String>,

    #[serde(
        rename = "Implementation_Address",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub implementation_address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub proxy_permissions: Option<ContractPermissions>,

    pub permissions: ContractPermissions,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub storage_values: Option<BTreeMap<String, String>>,
}

impl ContractOutcome {
    pub fn standalone(address: String, permissions: ContractPermissions) -> Self {
        Self {
            address: Some(address),
            proxy_address: None,
            implementation_address: None,
            proxy_permissions: None,
            permissions,
            storage_values: None,
        }
    }

    pub fn proxied(
        proxy_address: String,
        implementation_address: String,
        proxy_permissions: ContractPermissions,
        permissions: ContractPermissions,
    ) -> Self {
        Self {
            address: None,
            proxy_address: Some(proxy_address),
            implementation_address: Some(implementation_address),
            proxy_permissions: Some(proxy_permissions),
            permissions,
            storage_values: None,
        }
    }

    pub fn with_storage_values(mut self, values: BTreeMap<String, String>) -> Self {
        if !values.is_empty() {
            self.storage_values = Some(values);
        }
        self
    }

    pub fn is_proxy(&self) -> bool {
        self.proxy_address.is_some()
    }
}

/// Batch result, keyed by contract name (or implementation name for
/// proxies). Keys never collide across successfully completed scans.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanReport {
    contracts: BTreeMap<String, ContractOutcome>,
}

impl ScanReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, outcome: ContractOutcome) {
        self.contracts.insert(key, outcome);
    }

    pub fn get(&self, key: &str) -> Option<&ContractOutcome> {
        self.contracts.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ContractOutcome)> {
        self.contracts.iter()
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.contracts)
    }
}
