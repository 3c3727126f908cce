//! Guarded transitions between sibling states.

use super::action::{Action, ActionBody};
use crate::core::{PortId, RelationList, StateId};

/// A transition owned by an [`FsmModel`](super::FsmModel).
///
/// Source and destination are ids into the same model. The relation list
/// belongs to the guard and is cleared whenever the guard text changes.
#[derive(Clone, Debug)]
pub struct Transition {
    name: String,
    source: StateId,
    destination: StateId,
    guard: String,
    actions: Vec<Action>,
    relations: RelationList,
    is_default: bool,
}

impl Transition {
    pub(crate) fn new(
        name: impl Into<String>,
        source: StateId,
        destination: StateId,
        guard: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source,
            destination,
            guard: guard.into(),
            actions: Vec::new(),
            relations: RelationList::new(),
            is_default: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> StateId {
        self.source
    }

    pub fn destination(&self) -> StateId {
        self.destination
    }

    pub fn guard(&self) -> &str {
        &self.guard
    }

    /// False for empty or whitespace-only guards.
    pub fn has_guard(&self) -> bool {
        !self.guard.trim().is_empty()
    }

    /// A default transition is only taken when no other outgoing transition
    /// of its source is enabled.
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn choice_actions(&self) -> impl Iterator<Item = &ActionBody> {
        self.actions.iter().filter_map(|action| match action {
            Action::Choice(body) => Some(body),
            Action::Commit(_) => None,
        })
    }

    pub fn commit_actions(&self) -> impl Iterator<Item = &ActionBody> {
        self.actions.iter().filter_map(|action| match action {
            Action::Commit(body) => Some(body),
            Action::Choice(_) => None,
        })
    }

    /// Output ports written by choice actions.
    ///
    /// Commit actions are left out: they run at postfire and cannot affect
    /// outputs of the current instant.
    pub fn choice_outputs(&self) -> impl Iterator<Item = &PortId> {
        self.choice_actions()
            .flat_map(ActionBody::destinations)
            .filter_map(|destination| destination.output_port())
    }

    pub fn relations(&self) -> &RelationList {
        &self.relations
    }

    pub(crate) fn relations_mut(&mut self) -> &mut RelationList {
        &mut self.relations
    }

    pub(crate) fn set_guard(&mut self, guard: String) {
        self.guard = guard;
        self.relations.destroy();
    }

    pub(crate) fn set_default(&mut self, is_default: bool) {
        self.is_default = is_default;
    }

    pub(crate) fn push_action(&mut self, action: Action) {
        self.actions.push(action);
    }
}
