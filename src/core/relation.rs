//! Per-relation bookkeeping for threshold crossing detection.
//!
//! A guard such as `x >= 10 && y < 3` contains two relational sub-expressions.
//! Each one is tracked by a [`RelationNode`] that remembers how the relation
//! was classified on the current evaluation and on the last committed one,
//! together with the signed distance to its threshold.

use serde::{Deserialize, Serialize};

/// Classification of a relational sub-expression on one evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationType {
    /// No committed value to compare against.
    #[default]
    Invalid,
    /// A boolean-valued relation that evaluated to true.
    True,
    /// A boolean-valued relation that evaluated to false.
    False,
    /// The two sides are equal (or unequal) within tolerance.
    EqualOrInequal,
    /// The left side is below the right side.
    LessThan,
    /// The left side is above the right side.
    GreaterThan,
}

impl RelationType {
    /// Classify a signed `lhs - rhs` difference.
    ///
    /// Differences inside `[-tolerance, tolerance]` are reported as
    /// [`RelationType::EqualOrInequal`], so touching a threshold is not a
    /// crossing by itself.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fsm_causality::core::RelationType;
    ///
    /// assert_eq!(RelationType::from_difference(-2.0, 1e-9), RelationType::LessThan);
    /// assert_eq!(RelationType::from_difference(0.5, 1e-9), RelationType::GreaterThan);
    /// assert_eq!(RelationType::from_difference(0.0, 1e-9), RelationType::EqualOrInequal);
    /// ```
    pub fn from_difference(difference: f64, tolerance: f64) -> Self {
        if difference < -tolerance {
            Self::LessThan
        } else if difference > tolerance {
            Self::GreaterThan
        } else {
            Self::EqualOrInequal
        }
    }

    /// Classify a purely boolean relation.
    pub fn from_bool(value: bool) -> Self {
        if value {
            Self::True
        } else {
            Self::False
        }
    }

    pub fn is_invalid(self) -> bool {
        matches!(self, Self::Invalid)
    }
}

/// Current and committed state of one relational sub-expression.
///
/// The guard evaluator overwrites the current fields on every evaluation,
/// including speculative ones. Rolling back is simply not calling
/// [`RelationNode::commit`].
///
/// # Example
///
/// ```rust
/// use fsm_causality::core::{RelationNode, RelationType};
///
/// let mut node = RelationNode::new(RelationType::LessThan, -3.0);
/// node.commit();
///
/// node.set_type(RelationType::GreaterThan);
/// node.set_distance(0.25);
/// assert!(node.has_event());
///
/// // Accept the evaluation as the new baseline.
/// node.commit();
/// assert!(!node.has_event());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelationNode {
    current_type: RelationType,
    previous_type: RelationType,
    current_distance: f64,
    previous_distance: f64,
}

impl RelationNode {
    pub fn new(relation_type: RelationType, distance: f64) -> Self {
        Self {
            current_type: relation_type,
            previous_type: relation_type,
            current_distance: distance,
            previous_distance: distance,
        }
    }

    /// Forget the committed history.
    ///
    /// Used when the machine re-enters a state so that stale values from an
    /// earlier visit cannot produce a spurious event.
    pub fn reset(&mut self) {
        self.previous_type = RelationType::Invalid;
        self.previous_distance = 0.0;
    }

    /// Accept the current values as the new baseline.
    ///
    /// Must be called at most once per accepted step; a second call in the
    /// same step overwrites the history the first one established.
    pub fn commit(&mut self) {
        self.previous_type = self.current_type;
        self.previous_distance = self.current_distance;
    }

    pub fn set_type(&mut self, relation_type: RelationType) {
        self.current_type = relation_type;
    }

    pub fn set_distance(&mut self, distance: f64) {
        self.current_distance = distance;
    }

    pub fn current_type(&self) -> RelationType {
        self.current_type
    }

    pub fn previous_type(&self) -> RelationType {
        self.previous_type
    }

    pub fn current_distance(&self) -> f64 {
        self.current_distance
    }

    pub fn previous_distance(&self) -> f64 {
        self.previous_distance
    }

    /// True when the relation crossed its threshold since the last commit.
    ///
    /// Only a change straight between [`RelationType::LessThan`] and
    /// [`RelationType::GreaterThan`] counts. Boolean flips and moves into or
    /// out of [`RelationType::EqualOrInequal`] are not level crossings.
    pub fn has_event(&self) -> bool {
        self.type_changed()
            && matches!(
                (self.previous_type, self.current_type),
                (RelationType::LessThan, RelationType::GreaterThan)
                    | (RelationType::GreaterThan, RelationType::LessThan)
            )
    }

    /// True when a committed type exists and differs from the current one.
    pub fn type_changed(&self) -> bool {
        !self.previous_type.is_invalid() && self.previous_type != self.current_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TYPES: [RelationType; 6] = [
        RelationType::Invalid,
        RelationType::True,
        RelationType::False,
        RelationType::EqualOrInequal,
        RelationType::LessThan,
        RelationType::GreaterThan,
    ];

    #[test]
    fn new_node_mirrors_current_into_previous() {
        let node = RelationNode::new(RelationType::GreaterThan, 4.5);

        assert_eq!(node.current_type(), RelationType::GreaterThan);
        assert_eq!(node.previous_type(), RelationType::GreaterThan);
        assert_eq!(node.current_distance(), 4.5);
        assert_eq!(node.previous_distance(), 4.5);
        assert!(!node.type_changed());
    }

    #[test]
    fn commit_then_reset_clears_history() {
        let mut node = RelationNode::new(RelationType::LessThan, -1.0);
        node.set_type(RelationType::GreaterThan);
        node.set_distance(2.0);

        node.commit();
        node.reset();

        assert_eq!(node.previous_type(), RelationType::Invalid);
        assert_eq!(node.previous_distance(), 0.0);
        assert!(!node.type_changed());
        assert!(!node.has_event());
    }

    #[test]
    fn setters_leave_previous_untouched() {
        let mut node = RelationNode::new(RelationType::LessThan, -1.0);
        node.set_type(RelationType::EqualOrInequal);
        node.set_distance(0.0);

        assert_eq!(node.previous_type(), RelationType::LessThan);
        assert_eq!(node.previous_distance(), -1.0);
        assert!(node.type_changed());
    }

    #[test]
    fn event_only_for_level_crossings() {
        for previous in ALL_TYPES {
            for current in ALL_TYPES {
                let mut node = RelationNode::new(previous, 1.0);
                node.set_type(current);

                let crossing = matches!(
                    (previous, current),
                    (RelationType::LessThan, RelationType::GreaterThan)
                        | (RelationType::GreaterThan, RelationType::LessThan)
                );
                assert_eq!(
                    node.has_event(),
                    crossing,
                    "previous {previous:?}, current {current:?}"
                );
            }
        }
    }

    #[test]
    fn boolean_flip_is_a_change_but_not_an_event() {
        let mut node = RelationNode::new(RelationType::False, 0.0);
        node.set_type(RelationType::True);

        assert!(node.type_changed());
        assert!(!node.has_event());
    }

    #[test]
    fn invalid_previous_never_reports_change() {
        let mut node = RelationNode::new(RelationType::LessThan, -2.0);
        node.reset();
        node.set_type(RelationType::GreaterThan);

        assert!(!node.type_changed());
        assert!(!node.has_event());
    }

    #[test]
    fn discarded_evaluation_keeps_committed_baseline() {
        let mut node = RelationNode::new(RelationType::LessThan, -3.0);

        // Speculative evaluation that is never committed.
        node.set_type(RelationType::GreaterThan);
        node.set_distance(1.0);
        assert!(node.has_event());

        // Re-evaluation at a smaller step lands before the threshold.
        node.set_type(RelationType::LessThan);
        node.set_distance(-0.5);
        assert!(!node.has_event());
        assert_eq!(node.previous_distance(), -3.0);
    }

    #[test]
    fn from_difference_respects_tolerance() {
        assert_eq!(
            RelationType::from_difference(-0.01, 0.1),
            RelationType::EqualOrInequal
        );
        assert_eq!(
            RelationType::from_difference(-0.2, 0.1),
            RelationType::LessThan
        );
        assert_eq!(
            RelationType::from_difference(0.2, 0.1),
            RelationType::GreaterThan
        );
        assert_eq!(RelationType::from_bool(true), RelationType::True);
        assert_eq!(RelationType::from_bool(false), RelationType::False);
    }

    #[test]
    fn node_serializes_correctly() {
        let node = RelationNode::new(RelationType::EqualOrInequal, 0.125);
        let json = serde_json::to_string(&node).unwrap();
        let deserialized: RelationNode = serde_json::from_str(&json).unwrap();
        assert_eq!(node, deserialized);
    }
}
