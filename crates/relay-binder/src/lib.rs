//! Declaration resolver and scope binder for the Relay compiler.
//!
//! This crate turns parsed syntax trees of a multi-file compilation unit
//! into a fully linked, name-resolved declaration graph:
//!
//! - `DeclArena` / `Decl` - the declaration object model
//! - `ScopeTree` - lexical scopes partitioned by declaration kind, with
//!   asymmetric cross-kind collision rules
//! - a stub pass establishing every name, then a binding pass filling
//!   attributes and resolving references, so declarations may refer to
//!   each other regardless of textual order
//! - `analyze` - the entry point producing an `Analysis`
//! - a debug-only validator asserting the graph's invariants
//!
//! Later phases (reachability, event-set conformance, code generation)
//! consume the `Analysis` and are never entered when analysis fails.

use rustc_hash::FxHashMap;
use tracing::debug;

use relay_parser::{NodeArena, NodeIndex, walk};

pub mod decl;
pub mod error;
pub mod scope;
pub mod types;
pub mod validate;

mod bind;
mod stub;

pub use decl::{Decl, DeclArena, DeclData, DeclId, DeclKind, StateAction};
pub use error::BindError;
pub use scope::{ScopeId, ScopeTree};
pub use types::{StructuralTypeResolver, Type, TypeResolver};

use bind::BindPass;
use stub::StubPass;

/// Events that exist in every compilation unit without being declared.
pub const BUILTIN_EVENTS: [&str; 2] = ["halt", "null"];

/// The durable artifact of a successful analysis: the scope tree rooted
/// at `top_scope`, the declaration arena, and the maps tying syntax nodes
/// to declarations and scopes.
#[derive(Debug)]
pub struct Analysis {
    pub scopes: ScopeTree,
    pub decls: DeclArena,
    pub top_scope: ScopeId,
    pub node_decls: FxHashMap<NodeIndex, DeclId>,
    pub node_scopes: FxHashMap<NodeIndex, ScopeId>,
    /// Declarations created by each program, in creation order.
    pub program_decls: FxHashMap<NodeIndex, Vec<DeclId>>,
}

impl Analysis {
    /// The declaration a syntax node produced, if any.
    #[must_use]
    pub fn node_decl(&self, node: NodeIndex) -> Option<DeclId> {
        self.node_decls.get(&node).copied()
    }

    /// Lexical lookup starting at the top-level scope.
    #[must_use]
    pub fn lookup_top(&self, kind: DeclKind, name: &str) -> Option<DeclId> {
        self.scopes.lookup(self.top_scope, kind, name)
    }
}

/// Analyze a compilation unit: stub every program, then bind every
/// program, in the order given. The first error aborts.
pub fn analyze(
    arena: &NodeArena,
    programs: &[NodeIndex],
    resolver: &mut dyn TypeResolver,
) -> Result<Analysis, BindError> {
    let mut scopes = ScopeTree::new();
    let top_scope = scopes.alloc(None);
    let mut decls = DeclArena::new();
    for name in BUILTIN_EVENTS {
        scopes.put(&mut decls, top_scope, DeclKind::Event, name, None)?;
    }

    let mut node_decls = FxHashMap::default();
    let mut node_scopes = FxHashMap::default();
    let mut program_decls = FxHashMap::default();

    for &program in programs {
        let mut created = Vec::new();
        let mut pass = StubPass::new(
            &mut scopes,
            &mut decls,
            &mut node_decls,
            &mut node_scopes,
            &mut created,
            top_scope,
        );
        walk(arena, program, &mut pass)?;
        debug!(program = program.0, declared = created.len(), "stub pass done");
        program_decls.insert(program, created);
    }

    for &program in programs {
        let mut pass = BindPass::new(
            &mut scopes,
            &mut decls,
            &node_decls,
            &node_scopes,
            resolver,
            top_scope,
        );
        walk(arena, program, &mut pass)?;
        debug!(program = program.0, "binding pass done");
    }

    let analysis = Analysis {
        scopes,
        decls,
        top_scope,
        node_decls,
        node_scopes,
        program_decls,
    };
    if cfg!(debug_assertions) {
        validate::validate(&analysis);
    }
    Ok(analysis)
}
