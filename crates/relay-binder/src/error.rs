//! Typed errors surfaced by the stub and binding passes.
//!
//! Every variant carries the names involved plus the syntax node the error
//! was detected at, so a driver can render a located diagnostic. The first
//! error aborts analysis; later phases are never entered on failure.

use relay_parser::NodeIndex;
use thiserror::Error;

use crate::decl::DeclId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// A name clash in one scope, per the collision rules.
    #[error("duplicate declaration of `{name}`")]
    DuplicateDeclaration {
        name: String,
        node: NodeIndex,
        existing: DeclId,
    },

    /// A referenced identifier did not resolve.
    #[error("`{name}` is not declared")]
    MissingDeclaration { name: String, node: NodeIndex },

    /// An event named in an event-set literal did not resolve.
    #[error("event `{name}` is not declared (while building event set `{set}`)")]
    MissingEvent {
        set: String,
        name: String,
        node: NodeIndex,
    },

    /// A second state marked `start` in one machine.
    #[error(
        "machine `{machine}` already has start state `{existing}`; `{conflicting}` cannot also be a start state"
    )]
    DuplicateStartState {
        machine: String,
        existing: String,
        conflicting: String,
        node: NodeIndex,
    },

    #[error("state `{state}` already has an entry handler")]
    DuplicateEntry { state: String, node: NodeIndex },

    #[error("state `{state}` already has an exit handler")]
    DuplicateExit { state: String, node: NodeIndex },

    /// A second action for the same event in one state.
    #[error("state `{state}` already handles event `{event}`")]
    DuplicateHandler {
        state: String,
        event: String,
        node: NodeIndex,
    },

    /// A machine body closed without a `start` state.
    #[error("machine `{machine}` has no start state")]
    MachineWithoutStartState { machine: String, node: NodeIndex },

    /// Recognized syntax the binder deliberately refuses.
    #[error("{feature} are not implemented")]
    NotImplemented {
        feature: &'static str,
        node: NodeIndex,
    },
}
