//! Arena-backed syntax tree.
//!
//! Every node lives in a `NodeArena` and is addressed by `NodeIndex`. A
//! node carries its `SyntaxKind`, its source span, and a kind-specific
//! payload. Consumers go through the typed `get_*` accessors rather than
//! matching on `NodeData` directly.

use relay_common::Span;
use relay_scanner::SyntaxKind;

/// Index of a node in a `NodeArena`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    pub const NONE: NodeIndex = NodeIndex(u32::MAX);

    #[must_use]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

/// An ordered list of child nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeList {
    pub nodes: Vec<NodeIndex>,
}

impl NodeList {
    #[must_use]
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn push(&mut self, idx: NodeIndex) {
        self.nodes.push(idx);
    }
}

/// An identifier occurrence: its text plus where it appeared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRef {
    pub text: String,
    pub span: Span,
}

impl NameRef {
    #[must_use]
    pub fn new(text: impl Into<String>, span: Span) -> Self {
        Self {
            text: text.into(),
            span,
        }
    }
}

/// `assume N` / `assert N` queue-bound annotation on events and machines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cardinality {
    pub kind: CardinalityKind,
    pub bound: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardinalityKind {
    Assume,
    Assert,
}

/// State temperature marker (liveness monitoring).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Temperature {
    #[default]
    Warm,
    Hot,
    Cold,
}

/// Reference to a handler: either a named function or an inline body.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerRef {
    Named(NameRef),
    Anonymous(NodeIndex),
}

/// Receivable events of an interface: a named event set or a literal list.
#[derive(Debug, Clone, PartialEq)]
pub enum EventsRef {
    Named(NameRef),
    Literal(Vec<NameRef>),
}

/// Action attached to an `on` declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum OnAction {
    Do(HandlerRef),
    Goto {
        target: NodeIndex,
        with: Option<HandlerRef>,
    },
    Push {
        target: NodeIndex,
    },
}

/// Builtin type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinType {
    Null,
    Bool,
    Int,
    Float,
    String,
    Event,
    Machine,
    Any,
}

/// A literal constant in an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Null,
}

// ===== Node payloads =====

#[derive(Debug, Clone, PartialEq)]
pub struct ProgramData {
    pub file_name: String,
    pub declarations: NodeList,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationSetData {
    pub names: Vec<NameRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventDeclData {
    pub name: NameRef,
    pub cardinality: Option<Cardinality>,
    pub payload_type: Option<NodeIndex>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventSetDeclData {
    pub name: NameRef,
    pub events: Vec<NameRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDeclData {
    pub name: NameRef,
    pub elements: NodeList,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumElementData {
    pub name: NameRef,
    pub value: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefDeclData {
    pub name: NameRef,
    /// `None` for a foreign type declaration (`type T;`).
    pub ty: Option<NodeIndex>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDeclData {
    pub name: NameRef,
    pub payload_type: Option<NodeIndex>,
    pub events: EventsRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MachineDeclData {
    pub name: NameRef,
    pub is_spec: bool,
    pub cardinality: Option<Cardinality>,
    /// Implemented interfaces (impl machines only).
    pub interfaces: Vec<NameRef>,
    /// Observed events (spec machines only).
    pub observes: Vec<NameRef>,
    pub items: NodeList,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MachineProtoDeclData {
    pub name: NameRef,
    pub payload_type: Option<NodeIndex>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclData {
    pub name: NameRef,
    pub parameters: NodeList,
    pub return_type: Option<NodeIndex>,
    /// `None` for a foreign function declaration (`fun f(...);`).
    pub body: Option<NodeIndex>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionProtoDeclData {
    pub name: NameRef,
    pub parameters: NodeList,
    pub return_type: Option<NodeIndex>,
    pub creates: Vec<NameRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterData {
    pub name: NameRef,
    pub ty: NodeIndex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclData {
    pub name: NameRef,
    pub ty: NodeIndex,
}

/// Shared payload for `receives`, `sends`, `defer`, and `ignore`
/// declarations; the node kind tells them apart.
#[derive(Debug, Clone, PartialEq)]
pub struct EventListData {
    pub events: Vec<NameRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupDeclData {
    pub name: NameRef,
    pub items: NodeList,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateDeclData {
    pub name: NameRef,
    pub is_start: bool,
    pub temperature: Temperature,
    pub items: NodeList,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HandlerSlotData {
    pub handler: HandlerRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OnDeclData {
    pub events: Vec<NameRef>,
    pub action: OnAction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnonymousHandlerData {
    pub body: NodeIndex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QualifiedNameData {
    /// Group names followed by the final state name.
    pub parts: Vec<NameRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuiltinTypeData {
    pub builtin: BuiltinType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedTypeData {
    pub name: NameRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeqTypeData {
    pub element: NodeIndex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapTypeData {
    pub key: NodeIndex,
    pub value: NodeIndex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TupleTypeData {
    pub elements: NodeList,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockData {
    pub statements: NodeList,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfData {
    pub condition: NodeIndex,
    pub then_branch: NodeIndex,
    pub else_branch: Option<NodeIndex>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileData {
    pub condition: NodeIndex,
    pub body: NodeIndex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnData {
    pub value: Option<NodeIndex>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RaiseData {
    pub event: NodeIndex,
    pub payload: Option<NodeIndex>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SendData {
    pub target: NodeIndex,
    pub event: NodeIndex,
    pub payload: Option<NodeIndex>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignData {
    pub target: NodeIndex,
    pub value: NodeIndex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStatementData {
    pub expression: NodeIndex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryData {
    pub op: SyntaxKind,
    pub left: NodeIndex,
    pub right: NodeIndex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryData {
    pub op: SyntaxKind,
    pub operand: NodeIndex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallData {
    pub callee: NodeIndex,
    pub arguments: NodeList,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberData {
    pub object: NodeIndex,
    pub member: NameRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewData {
    pub machine: NameRef,
    pub arguments: NodeList,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NameData {
    pub name: NameRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralData {
    pub value: LiteralValue,
}

/// Kind-specific payload of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    None,
    Program(ProgramData),
    AnnotationSet(AnnotationSetData),
    EventDecl(EventDeclData),
    EventSetDecl(EventSetDeclData),
    EnumDecl(EnumDeclData),
    EnumElement(EnumElementData),
    TypeDefDecl(TypeDefDeclData),
    InterfaceDecl(InterfaceDeclData),
    MachineDecl(MachineDeclData),
    MachineProtoDecl(MachineProtoDeclData),
    FunctionDecl(FunctionDeclData),
    FunctionProtoDecl(FunctionProtoDeclData),
    Parameter(ParameterData),
    VariableDecl(VariableDeclData),
    EventList(EventListData),
    GroupDecl(GroupDeclData),
    StateDecl(StateDeclData),
    HandlerSlot(HandlerSlotData),
    OnDecl(OnDeclData),
    AnonymousHandler(AnonymousHandlerData),
    QualifiedName(QualifiedNameData),
    BuiltinType(BuiltinTypeData),
    NamedType(NamedTypeData),
    SeqType(SeqTypeData),
    MapType(MapTypeData),
    TupleType(TupleTypeData),
    Block(BlockData),
    If(IfData),
    While(WhileData),
    Return(ReturnData),
    Raise(RaiseData),
    Send(SendData),
    Assign(AssignData),
    ExpressionStatement(ExpressionStatementData),
    Binary(BinaryData),
    Unary(UnaryData),
    Call(CallData),
    Member(MemberData),
    New(NewData),
    Name(NameData),
    Literal(LiteralData),
}

/// A syntax node: kind, source span, payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: SyntaxKind,
    pub span: Span,
    pub data: NodeData,
}

impl Node {
    #[must_use]
    pub fn has_data(&self) -> bool {
        !matches!(self.data, NodeData::None)
    }
}

macro_rules! typed_accessor {
    ($name:ident, $at:ident, $variant:ident, $ty:ty) => {
        #[must_use]
        pub fn $name<'a>(&self, node: &'a Node) -> Option<&'a $ty> {
            match &node.data {
                NodeData::$variant(data) => Some(data),
                _ => None,
            }
        }

        #[must_use]
        pub fn $at(&self, idx: NodeIndex) -> Option<&$ty> {
            self.get(idx).and_then(|node| match &node.data {
                NodeData::$variant(data) => Some(data),
                _ => None,
            })
        }
    };
}

/// Arena holding every node of a compilation unit.
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    #[must_use]
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Add a node and return its index.
    pub fn add(&mut self, kind: SyntaxKind, span: Span, data: NodeData) -> NodeIndex {
        let idx = NodeIndex(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(Node { kind, span, data });
        idx
    }

    #[must_use]
    pub fn get(&self, idx: NodeIndex) -> Option<&Node> {
        if idx.is_none() {
            return None;
        }
        self.nodes.get(idx.0 as usize)
    }

    #[must_use]
    pub fn kind(&self, idx: NodeIndex) -> Option<SyntaxKind> {
        self.get(idx).map(|node| node.kind)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    typed_accessor!(get_program, get_program_at, Program, ProgramData);
    typed_accessor!(
        get_annotation_set,
        get_annotation_set_at,
        AnnotationSet,
        AnnotationSetData
    );
    typed_accessor!(get_event_decl, get_event_decl_at, EventDecl, EventDeclData);
    typed_accessor!(
        get_event_set_decl,
        get_event_set_decl_at,
        EventSetDecl,
        EventSetDeclData
    );
    typed_accessor!(get_enum_decl, get_enum_decl_at, EnumDecl, EnumDeclData);
    typed_accessor!(
        get_enum_element,
        get_enum_element_at,
        EnumElement,
        EnumElementData
    );
    typed_accessor!(
        get_type_def_decl,
        get_type_def_decl_at,
        TypeDefDecl,
        TypeDefDeclData
    );
    typed_accessor!(
        get_interface_decl,
        get_interface_decl_at,
        InterfaceDecl,
        InterfaceDeclData
    );
    typed_accessor!(
        get_machine_decl,
        get_machine_decl_at,
        MachineDecl,
        MachineDeclData
    );
    typed_accessor!(
        get_machine_proto_decl,
        get_machine_proto_decl_at,
        MachineProtoDecl,
        MachineProtoDeclData
    );
    typed_accessor!(
        get_function_decl,
        get_function_decl_at,
        FunctionDecl,
        FunctionDeclData
    );
    typed_accessor!(
        get_function_proto_decl,
        get_function_proto_decl_at,
        FunctionProtoDecl,
        FunctionProtoDeclData
    );
    typed_accessor!(get_parameter, get_parameter_at, Parameter, ParameterData);
    typed_accessor!(
        get_variable_decl,
        get_variable_decl_at,
        VariableDecl,
        VariableDeclData
    );
    typed_accessor!(get_event_list, get_event_list_at, EventList, EventListData);
    typed_accessor!(get_group_decl, get_group_decl_at, GroupDecl, GroupDeclData);
    typed_accessor!(get_state_decl, get_state_decl_at, StateDecl, StateDeclData);
    typed_accessor!(
        get_handler_slot,
        get_handler_slot_at,
        HandlerSlot,
        HandlerSlotData
    );
    typed_accessor!(get_on_decl, get_on_decl_at, OnDecl, OnDeclData);
    typed_accessor!(
        get_anonymous_handler,
        get_anonymous_handler_at,
        AnonymousHandler,
        AnonymousHandlerData
    );
    typed_accessor!(
        get_qualified_name,
        get_qualified_name_at,
        QualifiedName,
        QualifiedNameData
    );
    typed_accessor!(
        get_builtin_type,
        get_builtin_type_at,
        BuiltinType,
        BuiltinTypeData
    );
    typed_accessor!(get_named_type, get_named_type_at, NamedType, NamedTypeData);
    typed_accessor!(get_seq_type, get_seq_type_at, SeqType, SeqTypeData);
    typed_accessor!(get_map_type, get_map_type_at, MapType, MapTypeData);
    typed_accessor!(get_tuple_type, get_tuple_type_at, TupleType, TupleTypeData);
    typed_accessor!(get_block, get_block_at, Block, BlockData);
}

#[cfg(test)]
#[path = "tests/node_tests.rs"]
mod tests;
