//! Ordered relation bookkeeping for one transition guard.

use super::relation::{RelationNode, RelationType};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// All relational sub-expressions of one guard, in guard-text order.
///
/// The guard evaluator fills the list on its first pass (construction) and
/// updates it in place afterwards. The index reported through
/// [`RelationList::previous_maximum_distance`] is only meaningful right after
/// [`RelationList::maximum_difference`] and before the next mutation.
///
/// # Example
///
/// ```rust
/// use fsm_causality::core::{RelationList, RelationType};
///
/// let mut relations = RelationList::new();
/// relations.add_relation(RelationType::LessThan, -4.0);
/// relations.add_relation(RelationType::LessThan, -1.0);
/// relations.commit_all();
///
/// relations.set_relation(0, RelationType::LessThan, -2.0);
/// relations.set_relation(1, RelationType::GreaterThan, 0.5);
/// assert!(relations.has_event());
///
/// assert_eq!(relations.maximum_difference(), 0.5);
/// assert_eq!(relations.previous_maximum_distance(), -1.0);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationList {
    nodes: Vec<RelationNode>,
    #[serde(skip)]
    maximum_index: usize,
}

impl RelationList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a relation and return its index.
    pub fn add_relation(&mut self, relation_type: RelationType, distance: f64) -> usize {
        self.nodes.push(RelationNode::new(relation_type, distance));
        self.nodes.len() - 1
    }

    /// Update the relation at `index`, appending it during the construction pass.
    ///
    /// Evaluators visit relations in a stable order, so an index equal to the
    /// current length is the next relation of a guard seen for the first time.
    /// An index past that is ignored, leaving existing indices aligned.
    pub fn set_relation(&mut self, index: usize, relation_type: RelationType, distance: f64) {
        let len = self.nodes.len();
        match self.nodes.get_mut(index) {
            Some(node) => {
                node.set_type(relation_type);
                node.set_distance(distance);
            }
            None if index == len => {
                self.add_relation(relation_type, distance);
            }
            None => trace!(index, len, "Ignoring relation reported out of order"),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: usize) -> Option<&RelationNode> {
        self.nodes.get(index)
    }

    pub fn node_mut(&mut self, index: usize) -> Option<&mut RelationNode> {
        self.nodes.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RelationNode> {
        self.nodes.iter()
    }

    /// True when any relation crossed its threshold since the last commit.
    pub fn has_event(&self) -> bool {
        self.nodes.iter().any(RelationNode::has_event)
    }

    /// Largest absolute distance among relations whose type changed.
    ///
    /// Records which relation achieved it; the first one wins ties. Returns
    /// `0.0` when nothing changed, leaving the recorded index at 0.
    pub fn maximum_difference(&mut self) -> f64 {
        let mut maximum = 0.0;
        self.maximum_index = 0;

        for (index, node) in self.nodes.iter().enumerate() {
            if !node.type_changed() {
                continue;
            }
            let difference = node.current_distance().abs();
            if difference > maximum {
                maximum = difference;
                self.maximum_index = index;
            }
        }

        maximum
    }

    /// Committed distance of the relation picked by the last
    /// [`RelationList::maximum_difference`] call.
    pub fn previous_maximum_distance(&self) -> f64 {
        self.nodes
            .get(self.maximum_index)
            .map_or(0.0, RelationNode::previous_distance)
    }

    pub fn reset_all(&mut self) {
        self.nodes.iter_mut().for_each(RelationNode::reset);
    }

    pub fn commit_all(&mut self) {
        self.nodes.iter_mut().for_each(RelationNode::commit);
    }

    /// Drop every relation, e.g. when the guard text changes.
    pub fn destroy(&mut self) {
        self.nodes.clear();
        self.maximum_index = 0;
    }
}
