//! Common types and utilities for the Relay compiler front-end.
//!
//! This crate provides foundational types used across all relay crates:
//! - Source spans (`Span`, `Spanned`)
//! - Position/line-map types for turning byte offsets into line/column
//!   locations when rendering diagnostics

pub mod span;
pub use span::{Span, Spanned};

pub mod position;
pub use position::{LineMap, Position};
