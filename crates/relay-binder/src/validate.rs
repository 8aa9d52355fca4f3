//! Debug-only invariant checks over a finished analysis.
//!
//! Every check here guards an implementation invariant, not a user error:
//! a failure means a pass has a bug, so the checks panic. `analyze` runs
//! the validator in debug builds only.

use rustc_hash::FxHashSet;

use crate::Analysis;
use crate::decl::{DeclData, DeclId};

/// Assert every invariant of the declaration graph.
///
/// # Panics
///
/// Panics when any invariant is violated.
pub fn validate(analysis: &Analysis) {
    let decls = &analysis.decls;

    // The node-to-declaration map and the per-declaration back-references
    // must agree in both directions.
    for (&node, &id) in &analysis.node_decls {
        assert_eq!(
            decls[id].node,
            Some(node),
            "node map points at a declaration with a different source node"
        );
    }

    let mut in_scope: FxHashSet<DeclId> = FxHashSet::default();
    for scope in 0..analysis.scopes.len() {
        let scope = crate::scope::ScopeId(u32::try_from(scope).unwrap_or(u32::MAX));
        if let Some(parent) = analysis.scopes.parent(scope) {
            assert!(
                analysis.scopes.children(parent).contains(&scope),
                "scope parent link without matching child link"
            );
        }
        for &child in analysis.scopes.children(scope) {
            assert_eq!(
                analysis.scopes.parent(child),
                Some(scope),
                "scope child link without matching parent link"
            );
        }
        for &id in analysis.scopes.all_decls(scope) {
            in_scope.insert(id);
        }
    }

    for (id, decl) in decls.iter() {
        match decl.node {
            Some(node) => {
                assert_eq!(
                    analysis.node_decls.get(&node),
                    Some(&id),
                    "declaration `{}` is missing from the node map",
                    decl.name
                );
            }
            None => {
                let is_builtin_event = matches!(decl.data, DeclData::Event(_))
                    && (decl.name == "halt" || decl.name == "null");
                let is_anonymous_set =
                    matches!(&decl.data, DeclData::EventSet(set) if set.is_anonymous);
                assert!(
                    is_builtin_event || is_anonymous_set,
                    "declaration `{}` has no source node",
                    decl.name
                );
            }
        }

        // Everything nameable lives in exactly one scope table; inline
        // handlers and synthesized event sets are reachable only through
        // their owners.
        let expect_in_scope = match &decl.data {
            DeclData::Function(_) => !decl.name.is_empty(),
            DeclData::EventSet(set) => !set.is_anonymous,
            _ => true,
        };
        assert_eq!(
            in_scope.contains(&id),
            expect_in_scope,
            "scope membership is wrong for `{}`",
            decl.name
        );

        match &decl.data {
            DeclData::EnumElem(elem) => {
                let parent = elem.parent.expect("enum element without a parent enum");
                assert!(
                    decls.enum_decl(parent).elements.contains(&id),
                    "enum `{}` does not list element `{}`",
                    decls[parent].name,
                    decl.name
                );
            }
            DeclData::Enum(data) => {
                for &element in &data.elements {
                    assert_eq!(
                        decls.enum_elem(element).parent,
                        Some(id),
                        "element `{}` is listed by an enum it does not point back to",
                        decls[element].name
                    );
                }
            }
            DeclData::Function(fun) => {
                if let Some(owner) = fun.owner {
                    assert!(
                        decls.machine(owner).methods.contains(&id),
                        "machine `{}` does not list its function `{}`",
                        decls[owner].name,
                        decl.name
                    );
                }
                for &param in &fun.signature.parameters {
                    assert!(
                        decls.variable(param).is_param,
                        "signature parameter of `{}` is not marked as a parameter",
                        decl.name
                    );
                }
            }
            DeclData::Machine(machine) => {
                let start = machine
                    .start_state
                    .unwrap_or_else(|| panic!("machine `{}` has no start state", decl.name));
                let mut reachable = Vec::new();
                collect_states(decls, &machine.states, &machine.groups, &mut reachable);
                assert!(
                    reachable.contains(&start),
                    "start state of `{}` is not among its states",
                    decl.name
                );
                let marked = reachable
                    .iter()
                    .filter(|&&s| decls.state(s).is_start)
                    .count();
                assert_eq!(
                    marked, 1,
                    "machine `{}` must have exactly one start state",
                    decl.name
                );
                for &field in &machine.fields {
                    assert!(
                        !decls.variable(field).is_param,
                        "field of `{}` is marked as a parameter",
                        decl.name
                    );
                }
                for &method in &machine.methods {
                    assert_eq!(
                        decls.function(method).owner,
                        Some(id),
                        "method of `{}` does not point back to it",
                        decl.name
                    );
                }
            }
            DeclData::State(state) => {
                for (&event, action) in &state.actions {
                    assert_eq!(
                        action.event(),
                        event,
                        "state `{}` has an action keyed by the wrong event",
                        decl.name
                    );
                }
            }
            _ => {}
        }
    }
}

fn collect_states(
    decls: &crate::decl::DeclArena,
    states: &[DeclId],
    groups: &[DeclId],
    out: &mut Vec<DeclId>,
) {
    out.extend_from_slice(states);
    for &group in groups {
        let group = decls.group(group);
        collect_states(decls, &group.states, &group.groups, out);
    }
}
