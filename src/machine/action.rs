//! Transition actions.
//!
//! An action is a list of assignments. Whether it runs speculatively at
//! choice time or once at postfire is carried by the [`Action`] variant.

use crate::core::PortId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Where an assignment writes its value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Destination {
    /// An output port of the FSM actor.
    Output(PortId),
    /// A parameter or variable of the containing model.
    Parameter(String),
}

impl Destination {
    /// The output port written, if this destination is one.
    pub fn output_port(&self) -> Option<&PortId> {
        match self {
            Self::Output(port) => Some(port),
            Self::Parameter(_) => None,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Output(port) => write!(f, "{port}"),
            Self::Parameter(name) => write!(f, "{name}"),
        }
    }
}

/// `destination = expression`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub destination: Destination,
    pub expression: String,
}

impl Assignment {
    pub fn output(port: impl Into<PortId>, expression: impl Into<String>) -> Self {
        Self {
            destination: Destination::Output(port.into()),
            expression: expression.into(),
        }
    }

    pub fn parameter(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            destination: Destination::Parameter(name.into()),
            expression: expression.into(),
        }
    }
}

/// Failure reported by the host while applying an assignment.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Assignment to '{destination}' failed: {message}")]
pub struct ActionError {
    pub destination: String,
    pub message: String,
}

impl ActionError {
    pub fn new(destination: &Destination, message: impl Into<String>) -> Self {
        Self {
            destination: destination.to_string(),
            message: message.into(),
        }
    }
}

/// Host side of action execution.
///
/// The sink evaluates the expression and performs the write, so the core
/// never deals with token values.
pub trait ActionSink {
    fn assign(&mut self, destination: &Destination, expression: &str) -> Result<(), ActionError>;
}

/// Ordered assignments of one action.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionBody {
    assignments: Vec<Assignment>,
}

impl ActionBody {
    pub fn new(assignments: impl IntoIterator<Item = Assignment>) -> Self {
        Self {
            assignments: assignments.into_iter().collect(),
        }
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Apply every assignment in order, stopping at the first failure.
    pub fn execute(&self, sink: &mut dyn ActionSink) -> Result<(), ActionError> {
        for assignment in &self.assignments {
            sink.assign(&assignment.destination, &assignment.expression)?;
        }
        Ok(())
    }

    pub fn destinations(&self) -> impl Iterator<Item = &Destination> {
        self.assignments.iter().map(|a| &a.destination)
    }
}

/// An action attached to a transition.
///
/// Choice actions may run several times while the scheduler iterates to a
/// fixed point, so they must only write values that can be overwritten.
/// Commit actions run exactly once, when the transition is taken.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Choice(ActionBody),
    Commit(ActionBody),
}

impl Action {
    pub fn choice(assignments: impl IntoIterator<Item = Assignment>) -> Self {
        Self::Choice(ActionBody::new(assignments))
    }

    pub fn commit(assignments: impl IntoIterator<Item = Assignment>) -> Self {
        Self::Commit(ActionBody::new(assignments))
    }

    pub fn body(&self) -> &ActionBody {
        match self {
            Self::Choice(body) | Self::Commit(body) => body,
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self, Self::Choice(_))
    }

    pub fn execute(&self, sink: &mut dyn ActionSink) -> Result<(), ActionError> {
        self.body().execute(sink)
    }

    pub fn destinations(&self) -> impl Iterator<Item = &Destination> {
        self.body().destinations()
    }
}
