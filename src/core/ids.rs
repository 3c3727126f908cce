//! Handles used to refer to model elements without owning them.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Index of a state in its model's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StateId(pub(crate) usize);

impl StateId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of a transition in its model's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransitionId(pub(crate) usize);

impl TransitionId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Name of a port. Port names are unique within a model.
///
/// # Example
///
/// ```rust
/// use fsm_causality::core::PortId;
///
/// let port = PortId::from("speed");
/// assert_eq!(port.as_str(), "speed");
/// assert_eq!(port.to_string(), "speed");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortId(String);

impl PortId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PortId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for PortId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Borrow<str> for PortId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
