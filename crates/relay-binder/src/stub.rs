//! Pass 1: declaration stubs.
//!
//! Walks each program tree creating one empty declaration per declaring
//! node, populating scopes, and recording the node-to-declaration and
//! node-to-scope maps. Names are fully established after this pass;
//! attributes stay at their defaults until the binding pass fills them.

use rustc_hash::FxHashMap;
use tracing::debug;

use relay_parser::parser::node::NodeData;
use relay_parser::{NodeArena, NodeIndex, Visitor};

use crate::decl::{DeclArena, DeclData, DeclId, DeclKind};
use crate::error::BindError;
use crate::scope::{ScopeId, ScopeTree};

pub(crate) struct StubPass<'a> {
    scopes: &'a mut ScopeTree,
    decls: &'a mut DeclArena,
    node_decls: &'a mut FxHashMap<NodeIndex, DeclId>,
    node_scopes: &'a mut FxHashMap<NodeIndex, ScopeId>,
    /// Declarations created while walking the current program, in order.
    created: &'a mut Vec<DeclId>,
    top_scope: ScopeId,
    scope_stack: Vec<ScopeId>,
    enum_stack: Vec<DeclId>,
    fun_stack: Vec<DeclId>,
    /// Non-zero while inside a function prototype, whose formal
    /// parameters never become scope entries.
    proto_depth: usize,
}

impl<'a> StubPass<'a> {
    pub(crate) fn new(
        scopes: &'a mut ScopeTree,
        decls: &'a mut DeclArena,
        node_decls: &'a mut FxHashMap<NodeIndex, DeclId>,
        node_scopes: &'a mut FxHashMap<NodeIndex, ScopeId>,
        created: &'a mut Vec<DeclId>,
        top_scope: ScopeId,
    ) -> Self {
        Self {
            scopes,
            decls,
            node_decls,
            node_scopes,
            created,
            top_scope,
            scope_stack: Vec::new(),
            enum_stack: Vec::new(),
            fun_stack: Vec::new(),
            proto_depth: 0,
        }
    }

    fn current_scope(&self) -> ScopeId {
        self.scope_stack.last().copied().unwrap_or(self.top_scope)
    }

    /// Create a declaration in the current scope and register its node.
    fn declare(
        &mut self,
        kind: DeclKind,
        name: &str,
        idx: NodeIndex,
    ) -> Result<DeclId, BindError> {
        let scope = self.current_scope();
        let id = self.scopes.put(self.decls, scope, kind, name, Some(idx))?;
        self.node_decls.insert(idx, id);
        self.created.push(id);
        Ok(id)
    }

    /// Open a child scope for a scope-bearing node.
    fn push_scope(&mut self, idx: NodeIndex) -> ScopeId {
        let scope = self.scopes.alloc(Some(self.current_scope()));
        self.node_scopes.insert(idx, scope);
        self.scope_stack.push(scope);
        scope
    }
}

impl Visitor for StubPass<'_> {
    type Error = BindError;

    fn enter(&mut self, arena: &NodeArena, idx: NodeIndex) -> Result<(), Self::Error> {
        let Some(node) = arena.get(idx) else {
            return Ok(());
        };
        match &node.data {
            NodeData::Program(data) => {
                debug!(file = %data.file_name, "stubbing program");
                self.node_scopes.insert(idx, self.top_scope);
                self.scope_stack.push(self.top_scope);
            }
            NodeData::EventDecl(data) => {
                self.declare(DeclKind::Event, &data.name.text, idx)?;
            }
            NodeData::EventSetDecl(data) => {
                self.declare(DeclKind::EventSet, &data.name.text, idx)?;
            }
            NodeData::EnumDecl(data) => {
                let id = self.declare(DeclKind::Enum, &data.name.text, idx)?;
                self.enum_stack.push(id);
            }
            NodeData::EnumElement(data) => {
                let id = self.declare(DeclKind::EnumElem, &data.name.text, idx)?;
                if let Some(&parent) = self.enum_stack.last() {
                    self.decls.enum_elem_mut(id).parent = Some(parent);
                }
            }
            NodeData::TypeDefDecl(data) => {
                self.declare(DeclKind::TypeDef, &data.name.text, idx)?;
            }
            NodeData::InterfaceDecl(data) => {
                self.declare(DeclKind::Interface, &data.name.text, idx)?;
            }
            NodeData::MachineDecl(data) => {
                let id = self.declare(DeclKind::Machine, &data.name.text, idx)?;
                let scope = self.push_scope(idx);
                let machine = self.decls.machine_mut(id);
                machine.is_spec = data.is_spec;
                machine.scope = Some(scope);
            }
            NodeData::MachineProtoDecl(data) => {
                self.declare(DeclKind::MachineProto, &data.name.text, idx)?;
            }
            NodeData::FunctionDecl(data) => {
                let id = self.declare(DeclKind::Function, &data.name.text, idx)?;
                let scope = self.push_scope(idx);
                self.decls.function_mut(id).scope = Some(scope);
                self.fun_stack.push(id);
            }
            NodeData::FunctionProtoDecl(data) => {
                self.declare(DeclKind::FunctionProto, &data.name.text, idx)?;
                self.proto_depth += 1;
            }
            NodeData::Parameter(data) => {
                if self.proto_depth == 0 {
                    let id = self.declare(DeclKind::Variable, &data.name.text, idx)?;
                    self.decls.variable_mut(id).is_param = true;
                    if let Some(&fun) = self.fun_stack.last() {
                        self.decls.function_mut(fun).signature.parameters.push(id);
                    }
                }
            }
            NodeData::VariableDecl(data) => {
                self.declare(DeclKind::Variable, &data.name.text, idx)?;
            }
            NodeData::GroupDecl(data) => {
                let id = self.declare(DeclKind::StateGroup, &data.name.text, idx)?;
                let scope = self.push_scope(idx);
                self.decls.group_mut(id).scope = Some(scope);
            }
            NodeData::StateDecl(data) => {
                self.declare(DeclKind::State, &data.name.text, idx)?;
            }
            NodeData::AnonymousHandler(_) => {
                // Inline handlers have no name to enter into a scope; the
                // declaration exists only through the slot that mentions it.
                let id = self
                    .decls
                    .alloc("", Some(idx), DeclData::empty(DeclKind::Function));
                self.node_decls.insert(idx, id);
                self.created.push(id);
                let scope = self.push_scope(idx);
                self.decls.function_mut(id).scope = Some(scope);
                self.fun_stack.push(id);
            }
            _ => {}
        }
        Ok(())
    }

    fn exit(&mut self, arena: &NodeArena, idx: NodeIndex) -> Result<(), Self::Error> {
        let Some(node) = arena.get(idx) else {
            return Ok(());
        };
        match &node.data {
            NodeData::Program(_) | NodeData::MachineDecl(_) | NodeData::GroupDecl(_) => {
                self.scope_stack.pop();
            }
            NodeData::FunctionDecl(_) | NodeData::AnonymousHandler(_) => {
                self.scope_stack.pop();
                self.fun_stack.pop();
            }
            NodeData::EnumDecl(_) => {
                self.enum_stack.pop();
            }
            NodeData::FunctionProtoDecl(_) => {
                self.proto_depth -= 1;
            }
            _ => {}
        }
        Ok(())
    }
}
