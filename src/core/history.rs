//! Record of transitions taken by a state machine.
//!
//! Only transitions that reached postfire are recorded; speculative choices
//! never appear here. The log can be bounded, in which case the oldest
//! records are dropped first.

use super::ids::{StateId, TransitionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Record of a single committed transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Position of this commit among all commits since the history was
    /// created, starting at 0. Unaffected by dropped records.
    pub step: u64,
    /// The transition that was taken
    pub transition: TransitionId,
    /// The state being left
    pub from: StateId,
    /// The state being entered
    pub to: StateId,
    /// Wall-clock time of the commit. Diagnostic only; simulated time is
    /// owned by the scheduler.
    pub timestamp: DateTime<Utc>,
}

/// Ordered history of committed transitions.
///
/// # Example
///
/// ```rust
/// use fsm_causality::core::TransitionHistory;
///
/// let history = TransitionHistory::bounded(16);
/// assert!(history.is_empty());
/// assert_eq!(history.limit(), Some(16));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionHistory {
    records: VecDeque<TransitionRecord>,
    limit: Option<usize>,
    committed: u64,
}

impl TransitionHistory {
    /// An unbounded history.
    pub fn new() -> Self {
        Self::default()
    }

    /// A history keeping at most `limit` of the most recent records.
    pub fn bounded(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Append a commit of `transition` from `from` to `to`.
    ///
    /// The step index is assigned here. Returns it.
    pub fn push(&mut self, transition: TransitionId, from: StateId, to: StateId) -> u64 {
        let step = self.committed;
        self.committed += 1;

        if self.limit == Some(0) {
            return step;
        }
        if let Some(limit) = self.limit {
            while self.records.len() >= limit {
                self.records.pop_front();
            }
        }
        self.records.push_back(TransitionRecord {
            step,
            transition,
            from,
            to,
            timestamp: Utc::now(),
        });
        step
    }

    /// Forget every record and restart step numbering.
    pub fn clear(&mut self) {
        self.records.clear();
        self.committed = 0;
    }

    /// Get the path of states traversed by the retained records.
    ///
    /// Returns the source of the oldest record, then the destination of each
    /// record in order. Empty when nothing is retained.
    pub fn get_path(&self) -> Vec<StateId> {
        let mut path = Vec::with_capacity(self.records.len() + 1);
        if let Some(first) = self.records.front() {
            path.push(first.from);
        }
        path.extend(self.records.iter().map(|r| r.to));
        path
    }

    /// Time elapsed between the oldest and newest retained record.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.records.front()?, self.records.back()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    /// Retained records, oldest first.
    pub fn transitions(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Commits seen so far, including dropped ones.
    pub fn committed(&self) -> u64 {
        self.committed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_history_is_empty() {
        let history = TransitionHistory::new();
        assert!(history.is_empty());
        assert!(history.get_path().is_empty());
        assert!(history.duration().is_none());
        assert_eq!(history.limit(), None);
    }

    #[test]
    fn push_appends_in_place_with_steps() {
        let mut history = TransitionHistory::new();

        assert_eq!(history.push(TransitionId(0), StateId(0), StateId(1)), 0);
        assert_eq!(history.push(TransitionId(3), StateId(1), StateId(2)), 1);

        assert_eq!(history.len(), 2);
        let steps: Vec<_> = history.transitions().map(|r| r.step).collect();
        assert_eq!(steps, vec![0, 1]);
    }

    #[test]
    fn get_path_returns_state_sequence() {
        let mut history = TransitionHistory::new();
        history.push(TransitionId(0), StateId(0), StateId(1));
        history.push(TransitionId(3), StateId(1), StateId(2));

        assert_eq!(history.get_path(), vec![StateId(0), StateId(1), StateId(2)]);
    }

    #[test]
    fn bounded_history_drops_oldest() {
        let mut history = TransitionHistory::bounded(2);
        for i in 0..5 {
            history.push(TransitionId(i), StateId(i), StateId(i + 1));
        }

        assert_eq!(history.len(), 2);
        assert_eq!(history.committed(), 5);
        assert_eq!(history.get_path(), vec![StateId(3), StateId(4), StateId(5)]);
        let steps: Vec<_> = history.transitions().map(|r| r.step).collect();
        assert_eq!(steps, vec![3, 4]);
    }

    #[test]
    fn zero_limit_keeps_only_the_count() {
        let mut history = TransitionHistory::bounded(0);
        history.push(TransitionId(0), StateId(0), StateId(1));

        assert!(history.is_empty());
        assert_eq!(history.committed(), 1);
    }

    #[test]
    fn clear_restarts_numbering() {
        let mut history = TransitionHistory::bounded(4);
        history.push(TransitionId(0), StateId(0), StateId(1));
        history.clear();

        assert!(history.is_empty());
        assert_eq!(history.limit(), Some(4));
        assert_eq!(history.push(TransitionId(1), StateId(1), StateId(0)), 0);
    }

    #[test]
    fn single_record_has_zero_duration() {
        let mut history = TransitionHistory::new();
        history.push(TransitionId(0), StateId(0), StateId(1));
        assert_eq!(history.duration(), Some(Duration::from_secs(0)));
    }

    #[test]
    fn history_serializes_correctly() {
        let mut history = TransitionHistory::bounded(8);
        history.push(TransitionId(2), StateId(1), StateId(0));

        let json = serde_json::to_string(&history).unwrap();
        let deserialized: TransitionHistory = serde_json::from_str(&json).unwrap();

        assert_eq!(history, deserialized);
    }
}
