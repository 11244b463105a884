//! Permission gate classification.
//!
//! A function is a gate iff it has at least one modifier (direct or
//! reached through its call graph) or at least one caller-identity
//! condition. Everything else is filtered out of the report entirely.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::{caller_identity_conditions, collect_modifiers};
use crate::model::ContractModel;

/// Resolved value of a constant or immutable variable referenced
/// inside a gate. `value` stays absent when the read or decode failed;
/// `slot` stays absent when the variable has no literal slot source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConstantValue {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub slot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<String>,
}

/// Per-function permission record. Field names match the produced
/// report format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionRecord {
    #[serde(rename = "Function")]
    pub function: String,

    /// Sorted, deduplicated modifier names.
    #[serde(rename = "Modifiers")]
    pub modifiers: Vec<String>,

    #[serde(rename = "msg.sender_conditions")]
    pub msg_sender_conditions: Vec<String>,

    pub state_variables_read: Vec<String>,
    pub state_variables_written: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub immutables_and_constants: Vec<ConstantValue>,

    /// Live storage values attached under the variable's own name for
    /// report readability, e.g. `"_owner": "0xaaaa..."`.
    #[serde(flatten)]
    pub storage_values: BTreeMap<String, String>,
}

impl PermissionRecord {
    pub fn reads(&self, variable: &str) -> bool {
        self.state_variables_read.iter().any(|v| v == variable)
    }
}

/// The `{Contract_Name, Functions}` block of the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractPermissions {
    #[serde(rename = "Contract_Name")]
    pub contract_name: String,
    #[serde(rename = "Functions")]
    pub functions: Vec<PermissionRecord>,
}

/// Output of classifying one contract: the permission records plus the
/// contract-wide set of state variables read inside any gate, which
/// drives storage-target selection downstream.
#[derive(Debug, Clone)]
pub struct ClassifiedContract {
    pub permissions: ContractPermissions,
    pub targets: BTreeSet<String>,
}

/// Runs modifier collection and condition detection over every
/// function of `contract`, keeping only the gated ones.
pub fn classify_contract(contract: &ContractModel) -> ClassifiedContract {
    let mut functions = Vec::new();
    let mut targets = BTreeSet::new();

    for function in &contract.functions {
        if function.is_modifier {
            continue;
        }
        let modifier_set = collect_modifiers(contract, function);
        let conditions = caller_identity_conditions(contract, function);

        if modifier_set.is_empty() && conditions.is_empty() {
            continue;
        }

        let mut read: BTreeSet<String> = modifier_set
            .functions()
            .iter()
            .flat_map(|m| m.state_variables_read.iter().cloned())
            .collect();
        read.extend(function.state_variables_read.iter().cloned());

        targets.extend(read.iter().cloned());

        functions.push(PermissionRecord {
            function: function.name.clone(),
            modifiers: modifier_set.names(),
            msg_sender_conditions: conditions,
            state_variables_read: read.into_iter().collect(),
            state_variables_written: function.state_variables_written.clone(),
            immutables_and_constants: Vec::new(),
            storage_values: BTreeMap::new(),
        });
    }

    debug!(
        contract = %contract.name,
        gated = functions.len(),
        total = contract.functions.len(),
        "classified permission gates"
    );

    ClassifiedContract {
        permissions: ContractPermissions {
            contract_name: contract.name.clone(),
            functions,
        },
        targets,
    }
}
