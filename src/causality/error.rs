//! Causality analysis errors.

use crate::machine::{MachineError, ParseError};
use thiserror::Error;

/// Errors that abort a causality analysis.
///
/// A failed analysis never leaves a cached result behind; the next query
/// recomputes from scratch.
#[derive(Debug, Error)]
pub enum CausalityError {
    #[error("Cannot parse guard '{guard}' of transition '{transition}': {source}")]
    GuardParse {
        transition: String,
        guard: String,
        #[source]
        source: ParseError,
    },

    #[error("Refinement '{refinement}' cannot report its causality: {message}")]
    Refinement { refinement: String, message: String },

    #[error(transparent)]
    Structure(#[from] MachineError),
}
