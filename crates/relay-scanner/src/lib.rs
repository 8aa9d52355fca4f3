//! Scanner and syntax kinds for the Relay compiler front-end.
//!
//! This crate provides:
//! - `SyntaxKind` - token and syntax node kinds shared by the scanner,
//!   parser, and binder
//! - `ScannerState` - the hand-rolled scanner producing one token at a time

pub mod scanner;
pub mod syntax_kind;

pub use scanner::ScannerState;
pub use syntax_kind::SyntaxKind;
