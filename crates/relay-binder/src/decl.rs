//! Declaration objects and their arena.
//!
//! One `Decl` per declaration in the source, addressed by `DeclId`. The
//! kind-specific payload lives in `DeclData`; references between
//! declarations are `DeclId`s into the same arena, so the whole graph is
//! index-based with no back-pointers.

use std::collections::BTreeMap;
use std::ops::{Index, IndexMut};

use indexmap::IndexMap;
use relay_parser::NodeIndex;
use relay_parser::parser::node::Temperature;
use smallvec::SmallVec;

use crate::scope::ScopeId;
use crate::types::Type;

/// Index of a declaration in a `DeclArena`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub u32);

/// The namespace a declaration lives in. Scope tables are partitioned by
/// kind, and collision checking is indexed by the kind being inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Event,
    EventSet,
    Enum,
    EnumElem,
    TypeDef,
    Interface,
    Machine,
    MachineProto,
    Function,
    FunctionProto,
    StateGroup,
    State,
    Variable,
}

/// An event declaration. Cardinalities are `-1` when not written.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDecl {
    pub payload_type: Type,
    pub assume: i64,
    pub assert: i64,
}

impl EventDecl {
    pub(crate) fn unbounded() -> Self {
        Self {
            payload_type: Type::Null,
            assume: -1,
            assert: -1,
        }
    }
}

/// A set of events, iterated in name order for deterministic diagnostics
/// and code generation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventSetDecl {
    pub events: BTreeMap<String, DeclId>,
    /// Synthetic sets owned by a machine or interface; they have no
    /// originating syntax node and never enter a scope.
    pub is_anonymous: bool,
}

/// An enum; `elements` is in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumDecl {
    pub elements: Vec<DeclId>,
}

/// One enum constant. The parent link is exclusive: attaching an element
/// to a new enum detaches it from the previous one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumElemDecl {
    pub value: i64,
    pub parent: Option<DeclId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeDefDecl {
    pub ty: Type,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterfaceDecl {
    pub payload_type: Type,
    /// The named event set, or an anonymous one built from a literal.
    pub receivable_events: Option<DeclId>,
}

/// A machine (or spec machine, when `is_spec`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MachineDecl {
    pub is_spec: bool,
    pub payload_type: Type,
    pub assume: i64,
    pub assert: i64,
    pub interfaces: SmallVec<[DeclId; 2]>,
    pub receives: Option<DeclId>,
    pub sends: Option<DeclId>,
    /// Mandatory for spec machines, absent otherwise.
    pub observes: Option<DeclId>,
    pub fields: Vec<DeclId>,
    pub methods: Vec<DeclId>,
    /// Top-level states; states inside groups hang off the group.
    pub states: Vec<DeclId>,
    /// Top-level groups.
    pub groups: Vec<DeclId>,
    pub start_state: Option<DeclId>,
    pub scope: Option<ScopeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MachineProtoDecl {
    pub payload_type: Type,
}

/// Parameters are stub-created `Variable` declarations living in the
/// function's scope; the return type defaults to `Null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    pub parameters: Vec<DeclId>,
    pub return_type: Type,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionDecl {
    pub owner: Option<DeclId>,
    pub signature: Signature,
    pub locals: Vec<DeclId>,
    pub scope: Option<ScopeId>,
}

/// A formal parameter of a function prototype. Never entered into any
/// scope.
#[derive(Debug, Clone, PartialEq)]
pub struct FormalParameter {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProtoSignature {
    pub parameters: Vec<FormalParameter>,
    pub return_type: Type,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionProtoDecl {
    pub signature: ProtoSignature,
    /// Machines this prototype may construct.
    pub creates: SmallVec<[DeclId; 2]>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateGroupDecl {
    pub states: Vec<DeclId>,
    pub groups: Vec<DeclId>,
    pub scope: Option<ScopeId>,
}

/// Action taken by a state when an event arrives. Every variant carries
/// its triggering event.
#[derive(Debug, Clone, PartialEq)]
pub enum StateAction {
    Defer {
        event: DeclId,
    },
    Ignore {
        event: DeclId,
    },
    Do {
        event: DeclId,
        function: DeclId,
    },
    Goto {
        event: DeclId,
        target: DeclId,
        transition: Option<DeclId>,
    },
    Push {
        event: DeclId,
        target: DeclId,
    },
}

impl StateAction {
    #[must_use]
    pub fn event(&self) -> DeclId {
        match self {
            StateAction::Defer { event }
            | StateAction::Ignore { event }
            | StateAction::Do { event, .. }
            | StateAction::Goto { event, .. }
            | StateAction::Push { event, .. } => *event,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateDecl {
    pub temperature: Temperature,
    pub is_start: bool,
    pub entry: Option<DeclId>,
    pub exit: Option<DeclId>,
    /// One action per triggering event, in declaration order.
    pub actions: IndexMap<DeclId, StateAction>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableDecl {
    pub ty: Type,
    pub is_param: bool,
}

/// Kind-specific payload of a declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclData {
    Event(EventDecl),
    EventSet(EventSetDecl),
    Enum(EnumDecl),
    EnumElem(EnumElemDecl),
    TypeDef(TypeDefDecl),
    Interface(InterfaceDecl),
    Machine(MachineDecl),
    MachineProto(MachineProtoDecl),
    Function(FunctionDecl),
    FunctionProto(FunctionProtoDecl),
    StateGroup(StateGroupDecl),
    State(StateDecl),
    Variable(VariableDecl),
}

impl DeclData {
    /// Empty payload for a freshly stubbed declaration of `kind`.
    #[must_use]
    pub fn empty(kind: DeclKind) -> Self {
        match kind {
            DeclKind::Event => DeclData::Event(EventDecl::unbounded()),
            DeclKind::EventSet => DeclData::EventSet(EventSetDecl::default()),
            DeclKind::Enum => DeclData::Enum(EnumDecl::default()),
            DeclKind::EnumElem => DeclData::EnumElem(EnumElemDecl::default()),
            DeclKind::TypeDef => DeclData::TypeDef(TypeDefDecl::default()),
            DeclKind::Interface => DeclData::Interface(InterfaceDecl::default()),
            DeclKind::Machine => DeclData::Machine(MachineDecl::default()),
            DeclKind::MachineProto => DeclData::MachineProto(MachineProtoDecl::default()),
            DeclKind::Function => DeclData::Function(FunctionDecl::default()),
            DeclKind::FunctionProto => DeclData::FunctionProto(FunctionProtoDecl::default()),
            DeclKind::StateGroup => DeclData::StateGroup(StateGroupDecl::default()),
            DeclKind::State => DeclData::State(StateDecl::default()),
            DeclKind::Variable => DeclData::Variable(VariableDecl::default()),
        }
    }

    #[must_use]
    pub fn kind(&self) -> DeclKind {
        match self {
            DeclData::Event(_) => DeclKind::Event,
            DeclData::EventSet(_) => DeclKind::EventSet,
            DeclData::Enum(_) => DeclKind::Enum,
            DeclData::EnumElem(_) => DeclKind::EnumElem,
            DeclData::TypeDef(_) => DeclKind::TypeDef,
            DeclData::Interface(_) => DeclKind::Interface,
            DeclData::Machine(_) => DeclKind::Machine,
            DeclData::MachineProto(_) => DeclKind::MachineProto,
            DeclData::Function(_) => DeclKind::Function,
            DeclData::FunctionProto(_) => DeclKind::FunctionProto,
            DeclData::StateGroup(_) => DeclKind::StateGroup,
            DeclData::State(_) => DeclKind::State,
            DeclData::Variable(_) => DeclKind::Variable,
        }
    }
}

/// A declaration: its name, its originating syntax node, and its payload.
///
/// `node` is `None` only for the built-in events and for anonymous event
/// sets, which are synthesized during binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    pub name: String,
    pub node: Option<NodeIndex>,
    pub data: DeclData,
}

impl Decl {
    #[must_use]
    pub fn kind(&self) -> DeclKind {
        self.data.kind()
    }
}

macro_rules! payload_accessor {
    ($name:ident, $name_mut:ident, $variant:ident, $ty:ty, $what:literal) => {
        /// Kind-checked payload access; the caller guarantees the kind.
        #[must_use]
        pub fn $name(&self, id: DeclId) -> &$ty {
            match &self[id].data {
                DeclData::$variant(data) => data,
                _ => panic!(concat!("declaration is not ", $what)),
            }
        }

        #[must_use]
        pub fn $name_mut(&mut self, id: DeclId) -> &mut $ty {
            match &mut self[id].data {
                DeclData::$variant(data) => data,
                _ => panic!(concat!("declaration is not ", $what)),
            }
        }
    };
}

/// Arena holding every declaration of a compilation unit.
#[derive(Debug, Default)]
pub struct DeclArena {
    decls: Vec<Decl>,
}

impl DeclArena {
    #[must_use]
    pub fn new() -> Self {
        Self { decls: Vec::new() }
    }

    /// Add a declaration and return its id.
    pub fn alloc(
        &mut self,
        name: impl Into<String>,
        node: Option<NodeIndex>,
        data: DeclData,
    ) -> DeclId {
        let id = DeclId(u32::try_from(self.decls.len()).unwrap_or(u32::MAX));
        self.decls.push(Decl {
            name: name.into(),
            node,
            data,
        });
        id
    }

    #[must_use]
    pub fn get(&self, id: DeclId) -> Option<&Decl> {
        self.decls.get(id.0 as usize)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.decls.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DeclId, &Decl)> {
        self.decls
            .iter()
            .enumerate()
            .map(|(i, decl)| (DeclId(u32::try_from(i).unwrap_or(u32::MAX)), decl))
    }

    /// Attach an enum element to an enum, detaching it from any previous
    /// parent first. The value list keeps declaration order.
    pub fn attach_enum_element(&mut self, parent: DeclId, element: DeclId) {
        let old_parent = self.enum_elem(element).parent;
        if let Some(old) = old_parent
            && old != parent
        {
            self.enum_mut(old).elements.retain(|&e| e != element);
        }
        self.enum_elem_mut(element).parent = Some(parent);
        let elements = &mut self.enum_mut(parent).elements;
        if !elements.contains(&element) {
            elements.push(element);
        }
    }

    payload_accessor!(event, event_mut, Event, EventDecl, "an event");
    payload_accessor!(event_set, event_set_mut, EventSet, EventSetDecl, "an event set");
    payload_accessor!(enum_decl, enum_mut, Enum, EnumDecl, "an enum");
    payload_accessor!(enum_elem, enum_elem_mut, EnumElem, EnumElemDecl, "an enum element");
    payload_accessor!(type_def, type_def_mut, TypeDef, TypeDefDecl, "a type definition");
    payload_accessor!(interface, interface_mut, Interface, InterfaceDecl, "an interface");
    payload_accessor!(machine, machine_mut, Machine, MachineDecl, "a machine");
    payload_accessor!(
        machine_proto,
        machine_proto_mut,
        MachineProto,
        MachineProtoDecl,
        "a machine prototype"
    );
    payload_accessor!(function, function_mut, Function, FunctionDecl, "a function");
    payload_accessor!(
        function_proto,
        function_proto_mut,
        FunctionProto,
        FunctionProtoDecl,
        "a function prototype"
    );
    payload_accessor!(group, group_mut, StateGroup, StateGroupDecl, "a state group");
    payload_accessor!(state, state_mut, State, StateDecl, "a state");
    payload_accessor!(variable, variable_mut, Variable, VariableDecl, "a variable");
}

impl Index<DeclId> for DeclArena {
    type Output = Decl;

    fn index(&self, id: DeclId) -> &Decl {
        &self.decls[id.0 as usize]
    }
}

impl IndexMut<DeclId> for DeclArena {
    fn index_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id.0 as usize]
    }
}
