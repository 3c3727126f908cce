//! Builder for describing transitions.

use crate::builder::error::BuildError;
use crate::machine::{Action, Assignment};

/// A validated transition description, with states referred to by name.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionSpec {
    pub name: String,
    pub from: String,
    pub to: String,
    pub guard: String,
    pub actions: Vec<Action>,
    pub is_default: bool,
}

/// Builder for transitions with a fluent API.
#[derive(Clone, Debug, Default)]
pub struct TransitionBuilder {
    name: Option<String>,
    from: Option<String>,
    to: Option<String>,
    guard: String,
    actions: Vec<Action>,
    is_default: bool,
}

impl TransitionBuilder {
    /// Create a new transition builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Name the transition. Defaults to `"<from>-><to>"`.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the source state (required).
    pub fn from(mut self, state: impl Into<String>) -> Self {
        self.from = Some(state.into());
        self
    }

    /// Set the target state (required).
    pub fn to(mut self, state: impl Into<String>) -> Self {
        self.to = Some(state.into());
        self
    }

    /// Set the guard expression. An empty guard is always enabled.
    pub fn guard(mut self, guard: impl Into<String>) -> Self {
        self.guard = guard.into();
        self
    }

    /// Add a choice action.
    pub fn choice(mut self, assignments: impl IntoIterator<Item = Assignment>) -> Self {
        self.actions.push(Action::choice(assignments));
        self
    }

    /// Add a commit action.
    pub fn commit(mut self, assignments: impl IntoIterator<Item = Assignment>) -> Self {
        self.actions.push(Action::commit(assignments));
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Only take this transition when nothing else is enabled.
    pub fn default_transition(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Build the transition description.
    pub fn build(self) -> Result<TransitionSpec, BuildError> {
        let from = self.from.ok_or(BuildError::MissingFromState)?;
        let to = self.to.ok_or(BuildError::MissingToState)?;
        let name = self.name.unwrap_or_else(|| format!("{from}->{to}"));

        Ok(TransitionSpec {
            name,
            from,
            to,
            guard: self.guard,
            actions: self.actions,
            is_default: self.is_default,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_from_state() {
        let result = TransitionBuilder::new().to("B").build();
        assert!(matches!(result, Err(BuildError::MissingFromState)));
    }

    #[test]
    fn builder_requires_to_state() {
        let result = TransitionBuilder::new().from("A").build();
        assert!(matches!(result, Err(BuildError::MissingToState)));
    }

    #[test]
    fn builder_names_transition_after_states() {
        let spec = TransitionBuilder::new().from("A").to("B").build().unwrap();

        assert_eq!(spec.name, "A->B");
        assert!(spec.guard.is_empty());
        assert!(!spec.is_default);
    }

    #[test]
    fn builder_keeps_action_order() {
        let spec = TransitionBuilder::new()
            .named("go")
            .from("A")
            .to("B")
            .guard("x > 0")
            .commit([Assignment::parameter("n", "0")])
            .choice([Assignment::output("y", "x")])
            .default_transition()
            .build()
            .unwrap();

        assert_eq!(spec.name, "go");
        assert!(!spec.actions[0].is_choice());
        assert!(spec.actions[1].is_choice());
        assert!(spec.is_default);
    }
}
