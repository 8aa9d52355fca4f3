//! Document-order traversal of a syntax tree.
//!
//! `walk` delivers an `enter` event for a node, recurses into its children
//! in source order, then delivers `exit`. A visitor error aborts the walk
//! immediately. Passes that need a scope stack hook `enter`/`exit` for
//! every node and push/pop there.

use super::node::{HandlerRef, NodeArena, NodeData, NodeIndex, OnAction};

/// Enter/exit callbacks over a syntax tree.
pub trait Visitor {
    type Error;

    fn enter(&mut self, arena: &NodeArena, idx: NodeIndex) -> Result<(), Self::Error>;

    fn exit(&mut self, arena: &NodeArena, idx: NodeIndex) -> Result<(), Self::Error>;
}

/// Walk the subtree rooted at `root`, delivering enter/exit in document order.
pub fn walk<V: Visitor>(
    arena: &NodeArena,
    root: NodeIndex,
    visitor: &mut V,
) -> Result<(), V::Error> {
    visitor.enter(arena, root)?;
    for child in children_of(arena, root) {
        walk(arena, child, visitor)?;
    }
    visitor.exit(arena, root)
}

fn push_handler(out: &mut Vec<NodeIndex>, handler: &HandlerRef) {
    if let HandlerRef::Anonymous(idx) = handler {
        out.push(*idx);
    }
}

/// Children of a node, in source order.
#[must_use]
pub fn children_of(arena: &NodeArena, idx: NodeIndex) -> Vec<NodeIndex> {
    let Some(node) = arena.get(idx) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    match &node.data {
        NodeData::None | NodeData::AnnotationSet(_) => {}
        NodeData::Program(data) => out.extend(&data.declarations.nodes),
        NodeData::EventDecl(data) => out.extend(data.payload_type),
        NodeData::EventSetDecl(_) => {}
        NodeData::EnumDecl(data) => out.extend(&data.elements.nodes),
        NodeData::EnumElement(_) => {}
        NodeData::TypeDefDecl(data) => out.extend(data.ty),
        NodeData::InterfaceDecl(data) => out.extend(data.payload_type),
        NodeData::MachineDecl(data) => out.extend(&data.items.nodes),
        NodeData::MachineProtoDecl(data) => out.extend(data.payload_type),
        NodeData::FunctionDecl(data) => {
            out.extend(&data.parameters.nodes);
            out.extend(data.return_type);
            out.extend(data.body);
        }
        NodeData::FunctionProtoDecl(data) => {
            out.extend(&data.parameters.nodes);
            out.extend(data.return_type);
        }
        NodeData::Parameter(data) => out.push(data.ty),
        NodeData::VariableDecl(data) => out.push(data.ty),
        NodeData::EventList(_) => {}
        NodeData::GroupDecl(data) => out.extend(&data.items.nodes),
        NodeData::StateDecl(data) => out.extend(&data.items.nodes),
        NodeData::HandlerSlot(data) => push_handler(&mut out, &data.handler),
        NodeData::OnDecl(data) => match &data.action {
            OnAction::Do(handler) => push_handler(&mut out, handler),
            OnAction::Goto { target, with } => {
                out.push(*target);
                if let Some(handler) = with {
                    push_handler(&mut out, handler);
                }
            }
            OnAction::Push { target } => out.push(*target),
        },
        NodeData::AnonymousHandler(data) => out.push(data.body),
        NodeData::QualifiedName(_) => {}
        NodeData::BuiltinType(_) | NodeData::NamedType(_) => {}
        NodeData::SeqType(data) => out.push(data.element),
        NodeData::MapType(data) => {
            out.push(data.key);
            out.push(data.value);
        }
        NodeData::TupleType(data) => out.extend(&data.elements.nodes),
        NodeData::Block(data) => out.extend(&data.statements.nodes),
        NodeData::If(data) => {
            out.push(data.condition);
            out.push(data.then_branch);
            out.extend(data.else_branch);
        }
        NodeData::While(data) => {
            out.push(data.condition);
            out.push(data.body);
        }
        NodeData::Return(data) => out.extend(data.value),
        NodeData::Raise(data) => {
            out.push(data.event);
            out.extend(data.payload);
        }
        NodeData::Send(data) => {
            out.push(data.target);
            out.push(data.event);
            out.extend(data.payload);
        }
        NodeData::Assign(data) => {
            out.push(data.target);
            out.push(data.value);
        }
        NodeData::ExpressionStatement(data) => out.push(data.expression),
        NodeData::Binary(data) => {
            out.push(data.left);
            out.push(data.right);
        }
        NodeData::Unary(data) => out.push(data.operand),
        NodeData::Call(data) => {
            out.push(data.callee);
            out.extend(&data.arguments.nodes);
        }
        NodeData::Member(data) => out.push(data.object),
        NodeData::New(data) => out.extend(&data.arguments.nodes),
        NodeData::Name(_) | NodeData::Literal(_) => {}
    }
    out
}
