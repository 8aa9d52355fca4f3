//! Pass 2: declaration binding.
//!
//! Re-walks each program with the scope stack reconstructed from the
//! node-to-scope map pass 1 wrote, and fills declaration attributes:
//! payload and parameter types, event-set members, interface lists, enum
//! element values, state machinery (entry/exit slots, actions,
//! transitions), and machine start states. Two passes mean declarations
//! may reference each other regardless of textual order.

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use relay_parser::parser::node::{
    Cardinality, CardinalityKind, EventListData, EventsRef, HandlerRef, NameRef, NodeData,
    OnAction,
};
use relay_parser::{NodeArena, NodeIndex, Visitor};
use relay_scanner::SyntaxKind;

use crate::decl::{
    DeclArena, DeclData, DeclId, DeclKind, EventSetDecl, FormalParameter, StateAction,
};
use crate::error::BindError;
use crate::scope::{ScopeId, ScopeTree};
use crate::types::{Type, TypeResolver};

pub(crate) struct BindPass<'a> {
    scopes: &'a mut ScopeTree,
    decls: &'a mut DeclArena,
    node_decls: &'a FxHashMap<NodeIndex, DeclId>,
    node_scopes: &'a FxHashMap<NodeIndex, ScopeId>,
    resolver: &'a mut dyn TypeResolver,
    top_scope: ScopeId,
    scope_stack: Vec<ScopeId>,
    machine: Option<DeclId>,
    state: Option<DeclId>,
    current_enum: Option<DeclId>,
    fun_stack: Vec<DeclId>,
    group_stack: Vec<DeclId>,
    proto: Option<DeclId>,
}

impl<'a> BindPass<'a> {
    pub(crate) fn new(
        scopes: &'a mut ScopeTree,
        decls: &'a mut DeclArena,
        node_decls: &'a FxHashMap<NodeIndex, DeclId>,
        node_scopes: &'a FxHashMap<NodeIndex, ScopeId>,
        resolver: &'a mut dyn TypeResolver,
        top_scope: ScopeId,
    ) -> Self {
        Self {
            scopes,
            decls,
            node_decls,
            node_scopes,
            resolver,
            top_scope,
            scope_stack: Vec::new(),
            machine: None,
            state: None,
            current_enum: None,
            fun_stack: Vec::new(),
            group_stack: Vec::new(),
            proto: None,
        }
    }

    fn current_scope(&self) -> ScopeId {
        self.scope_stack.last().copied().unwrap_or(self.top_scope)
    }

    fn decl_of(&self, idx: NodeIndex) -> DeclId {
        self.node_decls[&idx]
    }

    fn resolve_type(
        &mut self,
        arena: &NodeArena,
        node: Option<NodeIndex>,
    ) -> Result<Type, BindError> {
        match node {
            None => Ok(Type::Null),
            Some(n) => {
                self.resolver
                    .resolve(arena, n, self.current_scope(), self.scopes, self.decls)
            }
        }
    }

    fn cardinality_pair(cardinality: Option<Cardinality>) -> (i64, i64) {
        match cardinality {
            Some(c) => match c.kind {
                CardinalityKind::Assume => (c.bound, -1),
                CardinalityKind::Assert => (-1, c.bound),
            },
            None => (-1, -1),
        }
    }

    /// Look up an event for an event-set literal.
    fn lookup_set_event(
        &self,
        set: &str,
        name: &NameRef,
        idx: NodeIndex,
    ) -> Result<DeclId, BindError> {
        self.scopes
            .lookup(self.current_scope(), DeclKind::Event, &name.text)
            .ok_or_else(|| BindError::MissingEvent {
                set: set.to_string(),
                name: name.text.clone(),
                node: idx,
            })
    }

    fn lookup_event(&self, name: &NameRef, idx: NodeIndex) -> Result<DeclId, BindError> {
        self.scopes
            .lookup(self.current_scope(), DeclKind::Event, &name.text)
            .ok_or_else(|| BindError::MissingDeclaration {
                name: name.text.clone(),
                node: idx,
            })
    }

    /// Synthesize an anonymous event set owned by a machine or interface.
    fn alloc_anonymous_set(&mut self, name: String) -> DeclId {
        self.decls.alloc(
            name,
            None,
            DeclData::EventSet(EventSetDecl {
                events: std::collections::BTreeMap::new(),
                is_anonymous: true,
            }),
        )
    }

    /// Resolve a handler reference at a state slot or transition. Named
    /// references must be functions; a function prototype is recognized
    /// and refused.
    fn resolve_handler(
        &self,
        handler: &HandlerRef,
        idx: NodeIndex,
    ) -> Result<DeclId, BindError> {
        match handler {
            HandlerRef::Anonymous(h) => Ok(self.node_decls[h]),
            HandlerRef::Named(name) => {
                let scope = self.current_scope();
                if let Some(fun) = self.scopes.lookup(scope, DeclKind::Function, &name.text) {
                    Ok(fun)
                } else if self
                    .scopes
                    .lookup(scope, DeclKind::FunctionProto, &name.text)
                    .is_some()
                {
                    Err(BindError::NotImplemented {
                        feature: "function prototypes as state handlers",
                        node: idx,
                    })
                } else {
                    Err(BindError::MissingDeclaration {
                        name: name.text.clone(),
                        node: idx,
                    })
                }
            }
        }
    }

    /// Resolve `g1.g2.state` against a machine, strictly locally at each
    /// step: group paths are absolute within the machine.
    fn resolve_qualified_state(
        &self,
        arena: &NodeArena,
        machine: DeclId,
        target: NodeIndex,
    ) -> Result<DeclId, BindError> {
        let Some(path) = arena.get_qualified_name_at(target) else {
            return Err(BindError::MissingDeclaration {
                name: String::new(),
                node: target,
            });
        };
        let mut scope = self
            .decls
            .machine(machine)
            .scope
            .unwrap_or(self.top_scope);
        let (state_name, groups) = match path.parts.split_last() {
            Some(split) => split,
            None => {
                return Err(BindError::MissingDeclaration {
                    name: String::new(),
                    node: target,
                });
            }
        };
        for group in groups {
            let Some(id) = self.scopes.get(scope, DeclKind::StateGroup, &group.text) else {
                return Err(BindError::MissingDeclaration {
                    name: group.text.clone(),
                    node: target,
                });
            };
            scope = self.decls.group(id).scope.unwrap_or(scope);
        }
        self.scopes
            .get(scope, DeclKind::State, &state_name.text)
            .ok_or_else(|| BindError::MissingDeclaration {
                name: state_name.text.clone(),
                node: target,
            })
    }

    /// Insert one action into the current state, rejecting a second
    /// action for the same event.
    fn add_state_action(&mut self, idx: NodeIndex, action: StateAction) -> Result<(), BindError> {
        let Some(state) = self.state else {
            return Ok(());
        };
        let event = action.event();
        if self.decls.state(state).actions.contains_key(&event) {
            return Err(BindError::DuplicateHandler {
                state: self.decls[state].name.clone(),
                event: self.decls[event].name.clone(),
                node: idx,
            });
        }
        self.decls.state_mut(state).actions.insert(event, action);
        Ok(())
    }

    // ===== Per-kind binding =====

    fn bind_event(
        &mut self,
        arena: &NodeArena,
        idx: NodeIndex,
        data: &relay_parser::parser::node::EventDeclData,
    ) -> Result<(), BindError> {
        let id = self.decl_of(idx);
        let ty = self.resolve_type(arena, data.payload_type)?;
        let (assume, assert) = Self::cardinality_pair(data.cardinality);
        let event = self.decls.event_mut(id);
        event.payload_type = ty;
        event.assume = assume;
        event.assert = assert;
        Ok(())
    }

    fn bind_event_set(
        &mut self,
        idx: NodeIndex,
        data: &relay_parser::parser::node::EventSetDeclData,
    ) -> Result<(), BindError> {
        let id = self.decl_of(idx);
        let set_name = self.decls[id].name.clone();
        for name in &data.events {
            let event = self.lookup_set_event(&set_name, name, idx)?;
            self.decls
                .event_set_mut(id)
                .events
                .insert(name.text.clone(), event);
        }
        Ok(())
    }

    fn bind_enum_element(
        &mut self,
        idx: NodeIndex,
        data: &relay_parser::parser::node::EnumElementData,
    ) -> Result<(), BindError> {
        let id = self.decl_of(idx);
        let Some(parent) = self.current_enum else {
            return Ok(());
        };
        // A plain element takes the running count of elements attached so
        // far, which can collide with numbered elements; collisions are
        // flagged when the enum closes but never renumbered.
        let value = match data.value {
            Some(value) => value,
            None => i64::try_from(self.decls.enum_decl(parent).elements.len()).unwrap_or(i64::MAX),
        };
        self.decls.enum_elem_mut(id).value = value;
        self.decls.attach_enum_element(parent, id);
        Ok(())
    }

    fn warn_on_value_collisions(&self, id: DeclId) {
        let enum_decl = self.decls.enum_decl(id);
        let mut seen: FxHashMap<i64, DeclId> = FxHashMap::default();
        for &element in &enum_decl.elements {
            let value = self.decls.enum_elem(element).value;
            if let Some(&first) = seen.get(&value) {
                warn!(
                    enum_name = %self.decls[id].name,
                    value,
                    first = %self.decls[first].name,
                    second = %self.decls[element].name,
                    "enum elements share a value"
                );
            } else {
                seen.insert(value, element);
            }
        }
    }

    fn bind_type_def(
        &mut self,
        arena: &NodeArena,
        idx: NodeIndex,
        data: &relay_parser::parser::node::TypeDefDeclData,
    ) -> Result<(), BindError> {
        let Some(ty_node) = data.ty else {
            return Err(BindError::NotImplemented {
                feature: "foreign types",
                node: idx,
            });
        };
        let id = self.decl_of(idx);
        let ty = self.resolve_type(arena, Some(ty_node))?;
        self.decls.type_def_mut(id).ty = ty;
        Ok(())
    }

    fn bind_interface(
        &mut self,
        arena: &NodeArena,
        idx: NodeIndex,
        data: &relay_parser::parser::node::InterfaceDeclData,
    ) -> Result<(), BindError> {
        let id = self.decl_of(idx);
        let ty = self.resolve_type(arena, data.payload_type)?;
        self.decls.interface_mut(id).payload_type = ty;

        let set = match &data.events {
            EventsRef::Named(name) => self
                .scopes
                .lookup(self.current_scope(), DeclKind::EventSet, &name.text)
                .ok_or_else(|| BindError::MissingDeclaration {
                    name: name.text.clone(),
                    node: idx,
                })?,
            EventsRef::Literal(events) => {
                let set_name = format!("{}$eventset", self.decls[id].name);
                let set = self.alloc_anonymous_set(set_name.clone());
                for name in events {
                    let event = self.lookup_set_event(&set_name, name, idx)?;
                    self.decls
                        .event_set_mut(set)
                        .events
                        .insert(name.text.clone(), event);
                }
                set
            }
        };
        self.decls.interface_mut(id).receivable_events = Some(set);
        Ok(())
    }

    fn bind_machine(
        &mut self,
        idx: NodeIndex,
        data: &relay_parser::parser::node::MachineDeclData,
    ) -> Result<(), BindError> {
        let id = self.decl_of(idx);
        self.machine = Some(id);
        let (assume, assert) = Self::cardinality_pair(data.cardinality);
        {
            let machine = self.decls.machine_mut(id);
            machine.assume = assume;
            machine.assert = assert;
        }
        debug!(name = %self.decls[id].name, is_spec = data.is_spec, "binding machine");

        if data.is_spec {
            // The observe list is mandatory for spec machines and becomes
            // an anonymous set named `<MachineName>$eventset`.
            let set_name = format!("{}$eventset", self.decls[id].name);
            let set = self.alloc_anonymous_set(set_name.clone());
            for name in &data.observes {
                let event = self.lookup_set_event(&set_name, name, idx)?;
                self.decls
                    .event_set_mut(set)
                    .events
                    .insert(name.text.clone(), event);
            }
            self.decls.machine_mut(id).observes = Some(set);
        } else {
            for name in &data.interfaces {
                let interface = self
                    .scopes
                    .lookup(self.current_scope(), DeclKind::Interface, &name.text)
                    .ok_or_else(|| BindError::MissingDeclaration {
                        name: name.text.clone(),
                        node: idx,
                    })?;
                self.decls.machine_mut(id).interfaces.push(interface);
            }
        }
        Ok(())
    }

    fn finish_machine(&mut self, idx: NodeIndex) -> Result<(), BindError> {
        let Some(id) = self.machine.take() else {
            return Ok(());
        };
        if self.decls.machine(id).start_state.is_none() {
            return Err(BindError::MachineWithoutStartState {
                machine: self.decls[id].name.clone(),
                node: idx,
            });
        }
        Ok(())
    }

    /// `receives`/`sends` accumulate into a per-machine anonymous set.
    fn bind_machine_event_list(
        &mut self,
        idx: NodeIndex,
        receives: bool,
        data: &EventListData,
    ) -> Result<(), BindError> {
        let Some(machine) = self.machine else {
            return Ok(());
        };
        let existing = if receives {
            self.decls.machine(machine).receives
        } else {
            self.decls.machine(machine).sends
        };
        let set = match existing {
            Some(set) => set,
            None => {
                let suffix = if receives { "$receives" } else { "$sends" };
                let set = self.alloc_anonymous_set(format!(
                    "{}{suffix}",
                    self.decls[machine].name
                ));
                let slot = self.decls.machine_mut(machine);
                if receives {
                    slot.receives = Some(set);
                } else {
                    slot.sends = Some(set);
                }
                set
            }
        };
        let set_name = self.decls[set].name.clone();
        for name in &data.events {
            let event = self.lookup_set_event(&set_name, name, idx)?;
            self.decls
                .event_set_mut(set)
                .events
                .insert(name.text.clone(), event);
        }
        Ok(())
    }

    fn bind_machine_proto(
        &mut self,
        arena: &NodeArena,
        idx: NodeIndex,
        data: &relay_parser::parser::node::MachineProtoDeclData,
    ) -> Result<(), BindError> {
        let id = self.decl_of(idx);
        let ty = self.resolve_type(arena, data.payload_type)?;
        self.decls.machine_proto_mut(id).payload_type = ty;
        Ok(())
    }

    fn bind_function_proto(
        &mut self,
        arena: &NodeArena,
        idx: NodeIndex,
        data: &relay_parser::parser::node::FunctionProtoDeclData,
    ) -> Result<(), BindError> {
        let id = self.decl_of(idx);
        self.proto = Some(id);
        let ty = self.resolve_type(arena, data.return_type)?;
        self.decls.function_proto_mut(id).signature.return_type = ty;
        for name in &data.creates {
            let machine = self
                .scopes
                .lookup(self.current_scope(), DeclKind::Machine, &name.text)
                .ok_or_else(|| BindError::MissingDeclaration {
                    name: name.text.clone(),
                    node: idx,
                })?;
            self.decls.function_proto_mut(id).creates.push(machine);
        }
        Ok(())
    }

    fn bind_parameter(
        &mut self,
        arena: &NodeArena,
        idx: NodeIndex,
        data: &relay_parser::parser::node::ParameterData,
    ) -> Result<(), BindError> {
        let ty = self.resolve_type(arena, Some(data.ty))?;
        if let Some(proto) = self.proto {
            // Formal parameters of a prototype carry a name and type but
            // never enter any scope.
            self.decls
                .function_proto_mut(proto)
                .signature
                .parameters
                .push(FormalParameter {
                    name: data.name.text.clone(),
                    ty,
                });
        } else {
            let id = self.decl_of(idx);
            self.decls.variable_mut(id).ty = ty;
        }
        Ok(())
    }

    fn bind_function(
        &mut self,
        arena: &NodeArena,
        idx: NodeIndex,
        data: &relay_parser::parser::node::FunctionDeclData,
    ) -> Result<(), BindError> {
        if data.body.is_none() {
            return Err(BindError::NotImplemented {
                feature: "foreign functions",
                node: idx,
            });
        }
        let id = self.decl_of(idx);
        if let Some(machine) = self.machine {
            self.decls.function_mut(id).owner = Some(machine);
            self.decls.machine_mut(machine).methods.push(id);
        }
        let ty = self.resolve_type(arena, data.return_type)?;
        self.decls.function_mut(id).signature.return_type = ty;
        self.fun_stack.push(id);
        Ok(())
    }

    fn bind_variable(
        &mut self,
        arena: &NodeArena,
        idx: NodeIndex,
        data: &relay_parser::parser::node::VariableDeclData,
    ) -> Result<(), BindError> {
        let id = self.decl_of(idx);
        let ty = self.resolve_type(arena, Some(data.ty))?;
        self.decls.variable_mut(id).ty = ty;
        if let Some(&fun) = self.fun_stack.last() {
            self.decls.function_mut(fun).locals.push(id);
        } else if let Some(machine) = self.machine {
            self.decls.machine_mut(machine).fields.push(id);
        }
        Ok(())
    }

    fn bind_group(&mut self, idx: NodeIndex) -> Result<(), BindError> {
        let id = self.decl_of(idx);
        if let Some(&parent) = self.group_stack.last() {
            self.decls.group_mut(parent).groups.push(id);
        } else if let Some(machine) = self.machine {
            self.decls.machine_mut(machine).groups.push(id);
        }
        self.group_stack.push(id);
        Ok(())
    }

    fn bind_state(
        &mut self,
        idx: NodeIndex,
        data: &relay_parser::parser::node::StateDeclData,
    ) -> Result<(), BindError> {
        let id = self.decl_of(idx);
        {
            let state = self.decls.state_mut(id);
            state.temperature = data.temperature;
            state.is_start = data.is_start;
        }
        if let Some(&group) = self.group_stack.last() {
            self.decls.group_mut(group).states.push(id);
        } else if let Some(machine) = self.machine {
            self.decls.machine_mut(machine).states.push(id);
        }
        if data.is_start
            && let Some(machine) = self.machine
        {
            if let Some(existing) = self.decls.machine(machine).start_state {
                return Err(BindError::DuplicateStartState {
                    machine: self.decls[machine].name.clone(),
                    existing: self.decls[existing].name.clone(),
                    conflicting: self.decls[id].name.clone(),
                    node: idx,
                });
            }
            self.decls.machine_mut(machine).start_state = Some(id);
        }
        self.state = Some(id);
        Ok(())
    }

    /// The machine's payload is whatever its start state's entry handler
    /// returns, or `Null` without an entry handler.
    fn finish_state(&mut self) {
        let Some(id) = self.state.take() else {
            return;
        };
        if !self.decls.state(id).is_start {
            return;
        }
        let Some(machine) = self.machine else {
            return;
        };
        let payload = self
            .decls
            .state(id)
            .entry
            .map(|entry| self.decls.function(entry).signature.return_type.clone())
            .unwrap_or(Type::Null);
        self.decls.machine_mut(machine).payload_type = payload;
    }

    fn bind_handler_slot(
        &mut self,
        idx: NodeIndex,
        kind: SyntaxKind,
        data: &relay_parser::parser::node::HandlerSlotData,
    ) -> Result<(), BindError> {
        let fun = self.resolve_handler(&data.handler, idx)?;
        let Some(state) = self.state else {
            return Ok(());
        };
        if kind == SyntaxKind::EntryDeclaration {
            if self.decls.state(state).entry.is_some() {
                return Err(BindError::DuplicateEntry {
                    state: self.decls[state].name.clone(),
                    node: idx,
                });
            }
            self.decls.state_mut(state).entry = Some(fun);
        } else {
            if self.decls.state(state).exit.is_some() {
                return Err(BindError::DuplicateExit {
                    state: self.decls[state].name.clone(),
                    node: idx,
                });
            }
            self.decls.state_mut(state).exit = Some(fun);
        }
        Ok(())
    }

    fn bind_defer_ignore(
        &mut self,
        idx: NodeIndex,
        defer: bool,
        data: &EventListData,
    ) -> Result<(), BindError> {
        for name in &data.events {
            let event = self.lookup_event(name, idx)?;
            let action = if defer {
                StateAction::Defer { event }
            } else {
                StateAction::Ignore { event }
            };
            self.add_state_action(idx, action)?;
        }
        Ok(())
    }

    fn bind_on(
        &mut self,
        arena: &NodeArena,
        idx: NodeIndex,
        data: &relay_parser::parser::node::OnDeclData,
    ) -> Result<(), BindError> {
        enum Resolved {
            Do(DeclId),
            Goto(DeclId, Option<DeclId>),
            Push(DeclId),
        }

        let resolved = match &data.action {
            OnAction::Do(handler) => Resolved::Do(self.resolve_handler(handler, idx)?),
            OnAction::Goto { target, with } => {
                let Some(machine) = self.machine else {
                    return Ok(());
                };
                let state = self.resolve_qualified_state(arena, machine, *target)?;
                let transition = match with {
                    Some(handler) => Some(self.resolve_handler(handler, idx)?),
                    None => None,
                };
                Resolved::Goto(state, transition)
            }
            OnAction::Push { target } => {
                let Some(machine) = self.machine else {
                    return Ok(());
                };
                Resolved::Push(self.resolve_qualified_state(arena, machine, *target)?)
            }
        };

        for name in &data.events {
            let event = self.lookup_event(name, idx)?;
            let action = match &resolved {
                Resolved::Do(function) => StateAction::Do {
                    event,
                    function: *function,
                },
                Resolved::Goto(target, transition) => StateAction::Goto {
                    event,
                    target: *target,
                    transition: *transition,
                },
                Resolved::Push(target) => StateAction::Push {
                    event,
                    target: *target,
                },
            };
            self.add_state_action(idx, action)?;
        }
        Ok(())
    }

    fn bind_anonymous_handler(&mut self, idx: NodeIndex) {
        let id = self.decl_of(idx);
        if let Some(machine) = self.machine {
            self.decls.function_mut(id).owner = Some(machine);
            self.decls.machine_mut(machine).methods.push(id);
        }
        self.fun_stack.push(id);
    }
}

impl Visitor for BindPass<'_> {
    type Error = BindError;

    fn enter(&mut self, arena: &NodeArena, idx: NodeIndex) -> Result<(), Self::Error> {
        // The scope stack is rebuilt from the map pass 1 wrote, before any
        // kind-specific work resolves names against the current scope.
        if let Some(&scope) = self.node_scopes.get(&idx) {
            self.scope_stack.push(scope);
        }
        let Some(node) = arena.get(idx) else {
            return Ok(());
        };
        match &node.data {
            NodeData::AnnotationSet(_) => {
                return Err(BindError::NotImplemented {
                    feature: "annotation sets",
                    node: idx,
                });
            }
            NodeData::EventDecl(data) => self.bind_event(arena, idx, data)?,
            NodeData::EventSetDecl(data) => self.bind_event_set(idx, data)?,
            NodeData::EnumDecl(_) => self.current_enum = Some(self.decl_of(idx)),
            NodeData::EnumElement(data) => self.bind_enum_element(idx, data)?,
            NodeData::TypeDefDecl(data) => self.bind_type_def(arena, idx, data)?,
            NodeData::InterfaceDecl(data) => self.bind_interface(arena, idx, data)?,
            NodeData::MachineDecl(data) => self.bind_machine(idx, data)?,
            NodeData::MachineProtoDecl(data) => self.bind_machine_proto(arena, idx, data)?,
            NodeData::FunctionDecl(data) => self.bind_function(arena, idx, data)?,
            NodeData::FunctionProtoDecl(data) => self.bind_function_proto(arena, idx, data)?,
            NodeData::Parameter(data) => self.bind_parameter(arena, idx, data)?,
            NodeData::VariableDecl(data) => self.bind_variable(arena, idx, data)?,
            NodeData::GroupDecl(_) => self.bind_group(idx)?,
            NodeData::StateDecl(data) => self.bind_state(idx, data)?,
            NodeData::HandlerSlot(data) => self.bind_handler_slot(idx, node.kind, data)?,
            NodeData::EventList(data) => match node.kind {
                SyntaxKind::ReceivesDeclaration => {
                    self.bind_machine_event_list(idx, true, data)?;
                }
                SyntaxKind::SendsDeclaration => {
                    self.bind_machine_event_list(idx, false, data)?;
                }
                SyntaxKind::DeferDeclaration => self.bind_defer_ignore(idx, true, data)?,
                SyntaxKind::IgnoreDeclaration => self.bind_defer_ignore(idx, false, data)?,
                _ => {}
            },
            NodeData::OnDecl(data) => self.bind_on(arena, idx, data)?,
            NodeData::AnonymousHandler(_) => self.bind_anonymous_handler(idx),
            _ => {}
        }
        Ok(())
    }

    fn exit(&mut self, arena: &NodeArena, idx: NodeIndex) -> Result<(), Self::Error> {
        if let Some(node) = arena.get(idx) {
            match &node.data {
                NodeData::MachineDecl(_) => self.finish_machine(idx)?,
                NodeData::EnumDecl(_) => {
                    if let Some(id) = self.current_enum.take() {
                        self.warn_on_value_collisions(id);
                    }
                }
                NodeData::FunctionProtoDecl(_) => self.proto = None,
                NodeData::FunctionDecl(_) | NodeData::AnonymousHandler(_) => {
                    self.fun_stack.pop();
                }
                NodeData::GroupDecl(_) => {
                    self.group_stack.pop();
                }
                NodeData::StateDecl(_) => self.finish_state(),
                _ => {}
            }
        }
        if self.node_scopes.contains_key(&idx) {
            self.scope_stack.pop();
        }
        Ok(())
    }
}
