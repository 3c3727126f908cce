//! Port declarations of an FSM actor.

use crate::core::PortId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    Input,
    Output,
}

/// How an input delivers values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortKind {
    #[default]
    Regular,
    /// A continuously settable input that behaves like a parameter. Its value
    /// can influence state selection in ways guard scanning cannot see.
    Parameter,
}

/// A named port declared on a model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    id: PortId,
    direction: PortDirection,
    kind: PortKind,
}

impl Port {
    pub fn input(name: impl Into<PortId>) -> Self {
        Self {
            id: name.into(),
            direction: PortDirection::Input,
            kind: PortKind::Regular,
        }
    }

    /// A parameter-style input port.
    pub fn parameter(name: impl Into<PortId>) -> Self {
        Self {
            id: name.into(),
            direction: PortDirection::Input,
            kind: PortKind::Parameter,
        }
    }

    pub fn output(name: impl Into<PortId>) -> Self {
        Self {
            id: name.into(),
            direction: PortDirection::Output,
            kind: PortKind::Regular,
        }
    }

    pub fn id(&self) -> &PortId {
        &self.id
    }

    pub fn direction(&self) -> PortDirection {
        self.direction
    }

    pub fn kind(&self) -> PortKind {
        self.kind
    }

    pub fn is_input(&self) -> bool {
        self.direction == PortDirection::Input
    }

    pub fn is_output(&self) -> bool {
        self.direction == PortDirection::Output
    }

    pub fn is_parameter(&self) -> bool {
        self.is_input() && self.kind == PortKind::Parameter
    }
}
