//! Machine errors.

use super::action::ActionError;
use super::guard::GuardError;
use crate::core::{PortId, StateId, TransitionId};
use thiserror::Error;

/// Errors raised while editing or running a model.
///
/// Unknown ids and duplicate names are construction mistakes; guard and
/// action failures come from the host collaborators and name the transition
/// they happened on.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("No state with id {0:?} in this model")]
    UnknownState(StateId),

    #[error("No transition with id {0:?} in this model")]
    UnknownTransition(TransitionId),

    #[error("A state named '{0}' already exists")]
    DuplicateState(String),

    #[error("A port named '{0}' already exists")]
    DuplicatePort(PortId),

    #[error("Transition '{transition}' does not leave the current state '{current}'")]
    NotOutgoing { transition: String, current: String },

    #[error("Guard of transition '{transition}' failed: {source}")]
    Guard {
        transition: String,
        #[source]
        source: GuardError,
    },

    #[error("Action of transition '{transition}' failed: {source}")]
    Action {
        transition: String,
        #[source]
        source: ActionError,
    },
}
