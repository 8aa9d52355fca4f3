//! Lexical scopes (declaration tables).
//!
//! Scopes form a tree rooted at the top-level scope of the compilation
//! unit. Each scope is a table partitioned by declaration kind; `get` is
//! strictly local, `lookup` walks the parent chain. Scopes live in an
//! arena and reference each other by `ScopeId`, so the bidirectional
//! parent/child links never need raw pointers.

use rustc_hash::FxHashMap;
use tracing::debug;

use relay_parser::NodeIndex;

use crate::decl::{DeclArena, DeclData, DeclId, DeclKind};
use crate::error::BindError;

/// Index of a scope in a `ScopeTree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

/// Kinds whose presence blocks inserting a declaration of the given kind
/// into the same local scope. The relation is asymmetric: it is indexed by
/// the kind being inserted, not by the kind already present. The lists are
/// exactly the kinds reachable from the same identifier positions.
#[must_use]
pub fn conflicting_kinds(kind: DeclKind) -> &'static [DeclKind] {
    use DeclKind::*;
    match kind {
        TypeDef => &[TypeDef, Enum, Interface, Machine, MachineProto],
        Enum => &[Enum, Interface, TypeDef, Machine, MachineProto],
        Event => &[Event, EnumElem],
        EventSet => &[EventSet],
        Interface => &[Interface, Enum, TypeDef, Machine, MachineProto],
        Machine => &[Machine, Interface, Enum, TypeDef],
        MachineProto => &[MachineProto, Interface, Enum, TypeDef],
        Function => &[Function],
        FunctionProto => &[FunctionProto],
        StateGroup => &[StateGroup],
        EnumElem => &[EnumElem, Event],
        Variable => &[Variable],
        State => &[State],
    }
}

#[derive(Debug, Default)]
struct Scope {
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
    names: FxHashMap<(DeclKind, String), DeclId>,
    /// Local declarations in insertion order, for deterministic iteration.
    entries: Vec<DeclId>,
}

/// Arena of scopes.
#[derive(Debug, Default)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl ScopeTree {
    #[must_use]
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    /// Allocate a scope, optionally linked under a parent.
    pub fn alloc(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(u32::try_from(self.scopes.len()).unwrap_or(u32::MAX));
        self.scopes.push(Scope::default());
        if parent.is_some() {
            self.set_parent(id, parent);
        }
        id
    }

    /// Re-parent a scope, keeping both sides of the link consistent.
    pub fn set_parent(&mut self, scope: ScopeId, parent: Option<ScopeId>) {
        let old = self.scopes[scope.0 as usize].parent;
        if old == parent {
            return;
        }
        if let Some(old) = old {
            self.scopes[old.0 as usize].children.retain(|&c| c != scope);
        }
        self.scopes[scope.0 as usize].parent = parent;
        if let Some(new) = parent {
            self.scopes[new.0 as usize].children.push(scope);
        }
    }

    #[must_use]
    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.0 as usize].parent
    }

    #[must_use]
    pub fn children(&self, scope: ScopeId) -> &[ScopeId] {
        &self.scopes[scope.0 as usize].children
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Create a declaration of `kind` named `name` in `scope`, enforcing
    /// the collision rules against the local scope only.
    pub fn put(
        &mut self,
        decls: &mut DeclArena,
        scope: ScopeId,
        kind: DeclKind,
        name: &str,
        node: Option<NodeIndex>,
    ) -> Result<DeclId, BindError> {
        for &other in conflicting_kinds(kind) {
            if let Some(existing) = self.get(scope, other, name) {
                return Err(BindError::DuplicateDeclaration {
                    name: name.to_string(),
                    node: node.unwrap_or(NodeIndex::NONE),
                    existing,
                });
            }
        }
        let id = decls.alloc(name, node, DeclData::empty(kind));
        debug!(scope = scope.0, ?kind, name, id = id.0, "declared");
        let table = &mut self.scopes[scope.0 as usize];
        table.names.insert((kind, name.to_string()), id);
        table.entries.push(id);
        Ok(id)
    }

    /// Local lookup only.
    #[must_use]
    pub fn get(&self, scope: ScopeId, kind: DeclKind, name: &str) -> Option<DeclId> {
        self.scopes[scope.0 as usize]
            .names
            .get(&(kind, name.to_string()))
            .copied()
    }

    /// Lexical lookup: walk the parent chain until the name is found.
    #[must_use]
    pub fn lookup(&self, scope: ScopeId, kind: DeclKind, name: &str) -> Option<DeclId> {
        let mut current = Some(scope);
        while let Some(s) = current {
            if let Some(id) = self.get(s, kind, name) {
                return Some(id);
            }
            current = self.parent(s);
        }
        None
    }

    /// Every local declaration of a scope, in insertion order.
    #[must_use]
    pub fn all_decls(&self, scope: ScopeId) -> &[DeclId] {
        &self.scopes[scope.0 as usize].entries
    }
}

#[cfg(test)]
#[path = "tests/scope_tests.rs"]
mod tests;
