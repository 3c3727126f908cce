//! The state machine model and its firing protocol.
//!
//! # Key Concepts
//!
//! - **States and transitions** live in arenas inside [`FsmModel`]
//! - **Actions** are tagged as choice (speculative, repeatable) or commit
//!   (once, at postfire)
//! - **Guards** are evaluated by a host [`GuardEvaluator`], which also keeps
//!   each transition's relation list current
//!
//! Expression evaluation and parsing stay outside this crate, behind the
//! [`GuardEvaluator`], [`GuardParser`] and [`ActionSink`] traits.

mod action;
mod error;
mod guard;
mod model;
mod port;
mod state;
mod transition;

pub use action::{Action, ActionBody, ActionError, ActionSink, Assignment, Destination};
pub use error::MachineError;
pub use guard::{GuardError, GuardEvaluator, GuardParser, IdentifierCollector, ParseError};
pub use model::{FsmModel, DEFAULT_HISTORY_LIMIT};
pub use port::{Port, PortDirection, PortKind};
pub use state::State;
pub use transition::Transition;
