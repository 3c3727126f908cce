//! Build errors for model and transition builders.

use crate::machine::MachineError;
use thiserror::Error;

/// A structural problem found while validating a model description.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelViolation {
    #[error("Initial state '{0}' is not declared")]
    UndeclaredInitial(String),

    #[error("State '{0}' is declared more than once")]
    DuplicateState(String),

    #[error("Port '{0}' is declared more than once")]
    DuplicatePort(String),

    #[error("Transition '{transition}' refers to undeclared state '{state}'")]
    UnknownState { transition: String, state: String },

    #[error("Transition '{transition}' writes '{port}', which is not a declared output")]
    UnknownOutput { transition: String, port: String },

    #[error("Refinement '{refinement}' is attached to undeclared state '{state}'")]
    UnknownRefinementState { refinement: String, state: String },
}

/// Errors that can occur when building models and transitions.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("Transition source state not specified. Call .from(state)")]
    MissingFromState,

    #[error("Transition target state not specified. Call .to(state)")]
    MissingToState,

    #[error("State '{0}' is not declared")]
    UnknownState(String),

    #[error("Model description has {} violation(s): {}", .violations.len(), summary(.violations))]
    Invalid { violations: Vec<ModelViolation> },

    #[error(transparent)]
    Machine(#[from] MachineError),
}

fn summary(violations: &[ModelViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
