//! Resolved types and the type-resolver seam.
//!
//! The binder does not interpret type syntax itself; it hands the type
//! subtree and the current scope to a `TypeResolver`. The structural
//! resolver below covers the whole surface grammar and is what the tests
//! and the default pipeline use; a checker with richer rules can slot in
//! its own implementation.

use relay_parser::parser::node::{BuiltinType, NodeData};
use relay_parser::{NodeArena, NodeIndex};
use tracing::debug;

use crate::decl::{DeclArena, DeclId, DeclKind};
use crate::error::BindError;
use crate::scope::{ScopeId, ScopeTree};

/// A fully resolved type.
///
/// `Named` points at the `TypeDef` or `Enum` declaration the name bound
/// to; aliases are not expanded here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Type {
    #[default]
    Null,
    Bool,
    Int,
    Float,
    String,
    Event,
    Machine,
    Any,
    Seq(Box<Type>),
    Map(Box<Type>, Box<Type>),
    Tuple(Vec<Type>),
    Named(DeclId),
}

/// Resolves a type subtree against a scope.
pub trait TypeResolver {
    fn resolve(
        &mut self,
        arena: &NodeArena,
        node: NodeIndex,
        scope: ScopeId,
        scopes: &ScopeTree,
        decls: &DeclArena,
    ) -> Result<Type, BindError>;
}

/// Structural resolver: builtins map directly, compound types recurse,
/// and a bare name must resolve to a type definition or an enum.
#[derive(Debug, Default)]
pub struct StructuralTypeResolver;

impl TypeResolver for StructuralTypeResolver {
    fn resolve(
        &mut self,
        arena: &NodeArena,
        node: NodeIndex,
        scope: ScopeId,
        scopes: &ScopeTree,
        decls: &DeclArena,
    ) -> Result<Type, BindError> {
        let Some(n) = arena.get(node) else {
            return Ok(Type::Null);
        };
        match &n.data {
            NodeData::BuiltinType(data) => Ok(match data.builtin {
                BuiltinType::Null => Type::Null,
                BuiltinType::Bool => Type::Bool,
                BuiltinType::Int => Type::Int,
                BuiltinType::Float => Type::Float,
                BuiltinType::String => Type::String,
                BuiltinType::Event => Type::Event,
                BuiltinType::Machine => Type::Machine,
                BuiltinType::Any => Type::Any,
            }),
            NodeData::SeqType(data) => {
                let element = self.resolve(arena, data.element, scope, scopes, decls)?;
                Ok(Type::Seq(Box::new(element)))
            }
            NodeData::MapType(data) => {
                let key = self.resolve(arena, data.key, scope, scopes, decls)?;
                let value = self.resolve(arena, data.value, scope, scopes, decls)?;
                Ok(Type::Map(Box::new(key), Box::new(value)))
            }
            NodeData::TupleType(data) => {
                let mut elements = Vec::with_capacity(data.elements.len());
                for &element in &data.elements.nodes {
                    elements.push(self.resolve(arena, element, scope, scopes, decls)?);
                }
                Ok(Type::Tuple(elements))
            }
            NodeData::NamedType(data) => {
                let name = &data.name.text;
                let id = scopes
                    .lookup(scope, DeclKind::TypeDef, name)
                    .or_else(|| scopes.lookup(scope, DeclKind::Enum, name));
                match id {
                    Some(id) => {
                        debug!(name, id = id.0, "resolved named type");
                        Ok(Type::Named(id))
                    }
                    None => Err(BindError::MissingDeclaration {
                        name: name.clone(),
                        node,
                    }),
                }
            }
            _ => Ok(Type::Null),
        }
    }
}
