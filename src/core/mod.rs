//! Leaf types shared by the machine model and the causality analysis.
//!
//! - Relation nodes and lists that track threshold crossings of guards
//! - Handles for states, transitions and ports
//! - Immutable history of committed transitions
//!
//! Nothing in this module depends on the rest of the crate.

mod history;
mod ids;
mod relation;
mod relation_list;

pub use history::{TransitionHistory, TransitionRecord};
pub use ids::{PortId, StateId, TransitionId};
pub use relation::{RelationNode, RelationType};
pub use relation_list::RelationList;
