//! Uniform contract model supplied by the static-analysis front-end.
//!
//! The engine never inspects source code itself. A front-end (an
//! external collaborator behind [`adapter::ContractModelAdapter`])
//! hands over one [`ContractModel`] per contract: functions with their
//! modifier and call edges, control-flow nodes with identifier-read
//! sets, and the ordered state-variable declaration list with storage
//! layout metadata. Everything downstream is explicit graph walking
//! over these owned collections.

pub mod adapter;

use serde::{Deserialize, Serialize};

/// The built-in identifier representing the transaction's immediate
/// caller. A conditional node reading this value is treated as a
/// caller-identity check.
pub const MSG_SENDER: &str = "msg.sender";

/// A single control-flow unit of a function body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// True for branch, require and assert nodes.
    pub is_conditional: bool,
    /// Identifiers this node reads, including built-ins.
    #[serde(default)]
    pub reads: Vec<String>,
    /// Source text of the node's expression, used verbatim in reports.
    pub expression: String,
}

impl Node {
    pub fn reads_caller_identity(&self) -> bool {
        self.reads.iter().any(|r| r == MSG_SENDER)
    }
}

/// Value category of a state variable, driving word decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarKind {
    Address,
    Bool,
    Integer,
    Bytes,
}

/// Storage layout descriptor for one state variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Width of the value in bits.
    pub bits: u16,
    /// Bit offset from the low end of the packed word.
    pub offset: u16,
    pub kind: VarKind,
}

impl TypeDescriptor {
    /// 160-bit address at offset zero, the common case for owner-style
    /// variables and the default for constant/immutable resolution.
    pub fn address() -> Self {
        Self {
            bits: 160,
            offset: 0,
            kind: VarKind::Address,
        }
    }
}

/// Where a state variable lives in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotExpression {
    /// A literal slot index, decimal (`"2"`) or hex
    /// (`"0x360894..."`). Constants and immutables carry their value
    /// source here rather than a layout slot.
    Literal(String),
    /// `mapping(key => ..)` element: slot is `keccak(key ++ base)`.
    Mapping { base: u64, key: String },
    /// Dynamic array element: slot is `keccak(base) + index`.
    ArrayElement { base: u64, index: u64 },
}

/// A declared state variable with its layout metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateVariableModel {
    pub name: String,
    /// False for constants and immutables, which have no layout slot.
    pub is_stored: bool,
    pub slot: SlotExpression,
    pub ty: TypeDescriptor,
}

/// A function (or modifier: modifiers are functions with their own
/// nodes and calls) as seen by the front-end.
///
/// Modifier and call entries name other functions of the same
/// [`ContractModel`]; resolution goes through
/// [`ContractModel::function_index`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionModel {
    pub name: String,
    /// True when this entry is a modifier body rather than a callable
    /// function. Modifiers participate in traversal but are never
    /// classified as gates themselves.
    #[serde(default)]
    pub is_modifier: bool,
    /// Directly attached modifiers, in declaration order.
    #[serde(default)]
    pub modifiers: Vec<String>,
    /// Internal call targets, one hop.
    #[serde(default)]
    pub internal_calls: Vec<String>,
    /// Library call targets, one hop.
    #[serde(default)]
    pub library_calls: Vec<String>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// State variables read anywhere in this function's body.
    #[serde(default)]
    pub state_variables_read: Vec<String>,
    /// State variables written anywhere in this function's body.
    #[serde(default)]
    pub state_variables_written: Vec<String>,
}

/// Immutable per-scan view of one contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractModel {
    pub name: String,
    #[serde(default)]
    pub functions: Vec<FunctionModel>,
    #[serde(default)]
    pub state_variables: Vec<StateVariableModel>,
    /// Names of inherited base contracts, used for proxy detection.
    #[serde(default)]
    pub inherits: Vec<String>,
}

impl ContractModel {
    pub fn function(&self, name: &str) -> Option<&FunctionModel> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Index of a function by name. The index is the structural
    /// identity used for deduplication during graph traversal; names
    /// only enter the picture at the final sort/format step.
    pub fn function_index(&self, name: &str) -> Option<usize> {
        self.functions.iter().position(|f| f.name == name)
    }

    pub fn state_variable(&self, name: &str) -> Option<&StateVariableModel> {
        self.state_variables.iter().find(|v| v.name == name)
    }
}
