//! Modifier collection through the call graph.

use std::collections::HashSet;

use crate::model::{ContractModel, FunctionModel};

/// Modifiers reachable from one function, before name formatting.
///
/// Deduplication happens on the resolved function's index in the
/// contract (structural identity); `names()` is the only place where
/// the set collapses to sorted names. Modifier names the model cannot
/// resolve to a declared function (bases outside the model) are kept
/// by name so the report does not silently drop a guard.
pub struct ModifierSet<'a> {
    resolved: Vec<&'a FunctionModel>,
    unresolved: Vec<String>,
}

impl<'a> ModifierSet<'a> {
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty() && self.unresolved.is_empty()
    }

    /// The modifier functions themselves, for callers that need their
    /// bodies (e.g. the gate classifier unions their variable reads).
    pub fn functions(&self) -> &[&'a FunctionModel] {
        &self.resolved
    }

    /// Sorted, deduplicated modifier names. Output is independent of
    /// call-graph traversal order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .resolved
            .iter()
            .map(|f| f.name.clone())
            .chain(self.unresolved.iter().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Collects the full modifier set of `function`: its own modifiers,
/// plus the own modifiers of every function reached through one hop of
/// internal calls, plus the same for library calls. Deeper transitive
/// expansion is deliberately not performed.
pub fn collect_modifiers<'a>(
    contract: &'a ContractModel,
    function: &FunctionModel,
) -> ModifierSet<'a> {
    let mut seen: HashSet<usize> = HashSet::new();
    let mut resolved = Vec::new();
    let mut unresolved = Vec::new();

    let mut add = |name: &str, resolved: &mut Vec<&'a FunctionModel>, unresolved: &mut Vec<String>| {
        match contract.function_index(name) {
            Some(idx) => {
                if seen.insert(idx) {
                    resolved.push(&contract.functions[idx]);
                }
            }
            None => {
                if !unresolved.iter().any(|n| n == name) {
                    unresolved.push(name.to_string());
                }
            }
        }
    };

    for name in &function.modifiers {
        add(name, &mut resolved, &mut unresolved);
    }
    for callee in function.internal_calls.iter().chain(&function.library_calls) {
        if let Some(f) = contract.function(callee) {
            for name in &f.modifiers {
                add(name, &mut resolved, &mut unresolved);
            }
        }
    }

    ModifierSet {
        resolved,
        unresolved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FunctionModel;

    fn modifier(name: &str) -> FunctionModel {
        FunctionModel {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn contract(functions: Vec<FunctionModel>) -> ContractModel {
        ContractModel {
            name: "Test".to_string(),
            functions,
            ..Default::default()
        }
    }

    #[test]
    fn empty_function_yields_empty_set() {
        let c = contract(vec![modifier("noop")]);
        let set = collect_modifiers(&c, c.function("noop").unwrap());
        assert!(set.is_empty());
        assert!(set.names().is_empty());
    }

    #[test]
    fn own_and_one_hop_modifiers_are_unioned() {
        let mut wrapper = modifier("wrapper");
        wrapper.modifiers = vec!["whenNotPaused".to_string()];
        let mut inner = modifier("_inner");
        inner.modifiers = vec!["onlyOwner".to_string()];
        wrapper.internal_calls = vec!["_inner".to_string()];

        let c = contract(vec![
            wrapper,
            inner,
            modifier("onlyOwner"),
            modifier("whenNotPaused"),
        ]);

        let set = collect_modifiers(&c, c.function("wrapper").unwrap());
        assert_eq!(set.names(), vec!["onlyOwner", "whenNotPaused"]);
    }

    #[test]
    fn nested_calls_are_not_expanded_beyond_one_hop() {
        let mut outer = modifier("outer");
        outer.internal_calls = vec!["mid".to_string()];
        let mut mid = modifier("mid");
        mid.internal_calls = vec!["deep".to_string()];
        let mut deep = modifier("deep");
        deep.modifiers = vec!["onlyOwner".to_string()];

        let c = contract(vec![outer, mid, deep, modifier("onlyOwner")]);

        // `mid` has no modifiers of its own, and `deep` is two hops
        // away from `outer`, so nothing is collected.
        let set = collect_modifiers(&c, c.function("outer").unwrap());
        assert!(set.names().is_empty());
    }

    #[test]
    fn names_are_sorted_regardless_of_call_declaration_order() {
        let build = |calls: Vec<&str>| {
            let mut f = modifier("entry");
            f.internal_calls = calls.into_iter().map(String::from).collect();
            let mut a = modifier("a");
            a.modifiers = vec!["zGuard".to_string()];
            let mut b = modifier("b");
            b.modifiers = vec!["aGuard".to_string()];
            contract(vec![f, a, b, modifier("zGuard"), modifier("aGuard")])
        };

        let forward = build(vec!["a", "b"]);
        let reverse = build(vec!["b", "a"]);

        let names_fwd = collect_modifiers(&forward, forward.function("entry").unwrap()).names();
        let names_rev = collect_modifiers(&reverse, reverse.function("entry").unwrap()).names();
        assert_eq!(names_fwd, names_rev);
        assert_eq!(names_fwd, vec!["aGuard", "zGuard"]);
    }

    #[test]
    fn unresolved_modifier_names_are_kept() {
        let mut f = modifier("restricted");
        f.modifiers = vec!["onlyRole".to_string()]; // declared in an inherited base
        let c = contract(vec![f]);

        let set = collect_modifiers(&c, c.function("restricted").unwrap());
        assert_eq!(set.names(), vec!["onlyRole"]);
        assert!(set.functions().is_empty());
    }
}
