//! Syntax tree and parser for the Relay compiler front-end.
//!
//! This crate provides:
//! - `NodeArena` / `NodeIndex` - the arena-backed syntax tree
//! - typed payload structs for every grammar production, with `get_*`
//!   accessors on the arena
//! - `ParserState` - the recursive-descent parser
//! - `walk` - a document-order enter/exit visitor over a tree
//!
//! Multiple source files are parsed into one shared arena so that a
//! `NodeIndex` is unique across a whole compilation unit.

pub mod parser;

pub use parser::node::{NodeArena, NodeIndex, NodeList};
pub use parser::state::{ParseError, ParserState, parse_source};
pub use parser::walk::{Visitor, walk};
