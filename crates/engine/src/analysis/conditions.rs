//! Caller-identity condition detection.

use std::collections::HashSet;

use crate::model::{ContractModel, FunctionModel};

/// Finds every conditional node reachable from `function` that reads
/// the caller-identity sentinel, and returns their expression texts.
///
/// The node set is the union of the function's own nodes with those of
/// its modifiers, one hop of internal and library callees, and those
/// callees' modifiers. Order is not semantically significant but must
/// be reproducible, so functions are visited in a fixed order: the
/// function itself, internal callees, internal-callee modifiers, own
/// modifiers, library callees, library-callee modifiers.
pub fn caller_identity_conditions(contract: &ContractModel, function: &FunctionModel) -> Vec<String> {
    let mut seen: HashSet<usize> = HashSet::new();
    let mut visit: Vec<&FunctionModel> = Vec::new();

    if let Some(idx) = contract.function_index(&function.name) {
        seen.insert(idx);
    }
    visit.push(function);

    let mut push = |name: &str| {
        if let Some(idx) = contract.function_index(name) {
            if seen.insert(idx) {
                visit.push(&contract.functions[idx]);
            }
        }
    };

    for callee in &function.internal_calls {
        push(callee);
    }
    for callee in &function.internal_calls {
        if let Some(f) = contract.function(callee) {
            for m in &f.modifiers {
                push(m);
            }
        }
    }
    for m in &function.modifiers {
        push(m);
    }
    for callee in &function.library_calls {
        push(callee);
    }
    for callee in &function.library_calls {
        if let Some(f) = contract.function(callee) {
            for m in &f.modifiers {
                push(m);
            }
        }
    }
    drop(push);

    visit
        .iter()
        .flat_map(|f| f.nodes.iter())
        .filter(|n| n.is_conditional && n.reads_caller_identity())
        .map(|n| n.expression.clone())
        .collect()
}
