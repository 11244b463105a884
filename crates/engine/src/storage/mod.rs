//! Storage correlation: turning gate-referenced state variables into
//! live on-chain values.
//!
//! Stored variables are queued for slot computation and a batched
//! fetch; constants and immutables resolve directly from their literal
//! slot expression, degrading to a slot-without-value entry when the
//! read or decode fails. Resolved values merge back into the
//! permission records and into a flat per-contract map.

pub mod slots;
pub mod word;

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::analysis::gates::{ConstantValue, ContractPermissions};
use crate::error::ScanError;
use crate::model::{ContractModel, SlotExpression, StateVariableModel};
use crate::proxy::EIP1967_IMPLEMENTATION_SLOT;
use crate::rpc::{BlockTag, StorageReader};
use crate::storage::word::Word;

pub struct StorageCorrelator<'a> {
    reader: &'a dyn StorageReader,
    /// Address whose storage backs the variables. For proxies this is
    /// the proxy address even when the declarations come from the
    /// implementation contract.
    storage_address: String,
    block: BlockTag,
}

impl<'a> StorageCorrelator<'a> {
    pub fn new(reader: &'a dyn StorageReader, storage_address: impl Into<String>, block: BlockTag) -> Self {
        Self {
            reader,
            storage_address: storage_address.into(),
            block,
        }
    }

    /// Correlates every declared state variable named in `targets`
    /// with its on-chain value and merges the results into
    /// `permissions`. Returns the flat `storage_values` map.
    pub async fn correlate(
        &self,
        contract: &ContractModel,
        targets: &BTreeSet<String>,
        permissions: &mut ContractPermissions,
    ) -> Result<BTreeMap<String, String>, ScanError> {
        let mut queued: Vec<&StateVariableModel> = Vec::new();

        for var in &contract.state_variables {
            if !targets.contains(&var.name) {
                continue;
            }
            if var.is_stored {
                queued.push(var);
            } else {
                let resolved = self.resolve_constant(var).await;
                for record in &mut permissions.functions {
                    if record.reads(&var.name)
                        && !record
                            .immutables_and_constants
                            .iter()
                            .any(|c| c.name == var.name)
                    {
                        record.immutables_and_constants.push(resolved.clone());
                    }
                }
            }
        }

        let mut values: BTreeMap<String, String> = BTreeMap::new();
        for var in queued {
            let slot = slots::compute_slot(&var.slot)?;
            let raw = self
                .reader
                .get_storage_at(&self.storage_address, slot, &self.block)
                .await?;
            let value = raw.extract(&var.ty)?;
            debug!(variable = %var.name, slot = %slot, %value, "storage value resolved");
            values.insert(var.name.clone(), value);
        }

        for (name, value) in &values {
            for record in &mut permissions.functions {
                if record.reads(name) {
                    record.storage_values.insert(name.clone(), value.clone());
                }
            }
        }

        Ok(values)
    }

    /// Resolves a constant or immutable directly from its literal slot
    /// expression. The EIP-1967 implementation slot constant is never
    /// a real data slot and is recorded by name only.
    async fn resolve_constant(&self, var: &StateVariableModel) -> ConstantValue {
        let literal = match &var.slot {
            SlotExpression::Literal(literal)
                if !literal.eq_ignore_ascii_case(EIP1967_IMPLEMENTATION_SLOT) =>
            {
                literal.clone()
            }
            _ => {
                return ConstantValue {
                    name: var.name.clone(),
                    slot: None,
                    value: None,
                }
            }
        };

        let value = match self.read_and_decode(&literal, var).await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(variable = %var.name, slot = %literal, %e, "constant resolution failed");
                None
            }
        };

        ConstantValue {
            name: var.name.clone(),
            slot: Some(literal),
            value,
        }
    }

    async fn read_and_decode(
        &self,
        literal: &str,
        var: &StateVariableModel,
    ) -> Result<String, ScanError> {
        let slot = Word::from_literal(literal)?;
        let raw = self
            .reader
            .get_storage_at(&self.storage_address, slot, &self.block)
            .await?;
        raw.extract(&var.ty)
    }
}
