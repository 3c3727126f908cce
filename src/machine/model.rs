//! The FSM model: arenas of states and transitions plus the firing protocol.

use super::action::ActionSink;
use super::error::MachineError;
use super::guard::GuardEvaluator;
use super::port::Port;
use super::state::State;
use super::transition::Transition;
use super::Action;
use crate::causality::Refinement;
use crate::core::{PortId, RelationList, StateId, TransitionHistory, TransitionId};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// Records kept by a new model's history.
pub const DEFAULT_HISTORY_LIMIT: usize = 1024;

/// Versions are drawn from one process-wide sequence, so two models never
/// report the same version unless one is an unedited clone of the other.
static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

fn next_version() -> u64 {
    NEXT_VERSION.fetch_add(1, Ordering::Relaxed)
}

/// A finite-state machine with guarded transitions.
///
/// States and transitions live in arenas owned by the model; cross
/// references are ids. Every structural edit moves [`FsmModel::version`] to a
/// value no other model has used, which is what cached causality analyses
/// compare against.
///
/// The firing protocol for one scheduler iteration is:
///
/// 1. [`FsmModel::enabled_transition`] evaluates the current state's guards.
/// 2. [`FsmModel::run_choice_actions`] may run any number of times.
/// 3. [`FsmModel::run_commit_actions_and_advance`] runs once for the accepted
///    transition and moves the current state.
///
/// The model is not synchronized. Editing it while another party queries a
/// causality analysis of it is a precondition violation.
///
/// # Example
///
/// ```rust
/// use fsm_causality::core::RelationList;
/// use fsm_causality::machine::{FsmModel, GuardError, Port};
///
/// let mut model = FsmModel::new("counter", "Idle");
/// model.add_port(Port::input("go")).unwrap();
/// let idle = model.initial_state();
/// let busy = model.add_state("Busy", false).unwrap();
/// let start = model.add_transition("start", idle, busy, "go").unwrap();
///
/// let mut evaluator = |_: &str, _: &mut RelationList| Ok::<_, GuardError>(true);
/// let enabled = model.enabled_transition(idle, &mut evaluator).unwrap();
/// assert_eq!(enabled, Some(start));
/// ```
#[derive(Clone, Debug)]
pub struct FsmModel {
    name: String,
    ports: Vec<Port>,
    states: Vec<State>,
    transitions: Vec<Transition>,
    initial: StateId,
    current: StateId,
    version: u64,
    history: TransitionHistory,
}

impl FsmModel {
    /// Create a model containing only its initial state.
    pub fn new(name: impl Into<String>, initial_state: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ports: Vec::new(),
            states: vec![State::new(initial_state, false)],
            transitions: Vec::new(),
            initial: StateId(0),
            current: StateId(0),
            version: next_version(),
            history: TransitionHistory::bounded(DEFAULT_HISTORY_LIMIT),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Structural version. Grows on every edit and is unique across models.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn initial_state(&self) -> StateId {
        self.initial
    }

    pub fn current_state(&self) -> StateId {
        self.current
    }

    /// Whether the current state is final.
    pub fn is_final(&self) -> bool {
        self.states[self.current.0].is_final()
    }

    pub fn history(&self) -> &TransitionHistory {
        &self.history
    }

    /// Replace the history with an empty one keeping at most `limit` records,
    /// or every record when `None`.
    pub fn set_history_limit(&mut self, limit: Option<usize>) {
        self.history = match limit {
            Some(limit) => TransitionHistory::bounded(limit),
            None => TransitionHistory::new(),
        };
    }

    pub fn add_port(&mut self, port: Port) -> Result<(), MachineError> {
        if self.port(port.id().as_str()).is_some() {
            return Err(MachineError::DuplicatePort(port.id().clone()));
        }
        self.ports.push(port);
        self.bump();
        Ok(())
    }

    pub fn add_state(
        &mut self,
        name: impl Into<String>,
        is_final: bool,
    ) -> Result<StateId, MachineError> {
        let name = name.into();
        if self.state_by_name(&name).is_some() {
            return Err(MachineError::DuplicateState(name));
        }
        self.states.push(State::new(name, is_final));
        self.bump();
        Ok(StateId(self.states.len() - 1))
    }

    pub fn set_final(&mut self, state: StateId, is_final: bool) -> Result<(), MachineError> {
        self.state_mut(state)?.set_final(is_final);
        self.bump();
        Ok(())
    }

    /// Add a transition between two states of this model.
    ///
    /// It is appended to the source's outgoing list, so declaration order is
    /// preserved.
    pub fn add_transition(
        &mut self,
        name: impl Into<String>,
        source: StateId,
        destination: StateId,
        guard: impl Into<String>,
    ) -> Result<TransitionId, MachineError> {
        self.state(destination)?;
        let id = TransitionId(self.transitions.len());
        self.state_mut(source)?.push_outgoing(id);
        self.transitions
            .push(Transition::new(name, source, destination, guard));
        self.bump();
        Ok(id)
    }

    pub fn add_action(
        &mut self,
        transition: TransitionId,
        action: Action,
    ) -> Result<(), MachineError> {
        self.transition_mut(transition)?.push_action(action);
        self.bump();
        Ok(())
    }

    /// Replace the guard text. The transition's relation list is rebuilt on
    /// the next evaluation.
    pub fn set_guard(
        &mut self,
        transition: TransitionId,
        guard: impl Into<String>,
    ) -> Result<(), MachineError> {
        self.transition_mut(transition)?.set_guard(guard.into());
        self.bump();
        Ok(())
    }

    pub fn set_default(
        &mut self,
        transition: TransitionId,
        is_default: bool,
    ) -> Result<(), MachineError> {
        self.transition_mut(transition)?.set_default(is_default);
        self.bump();
        Ok(())
    }

    pub fn add_refinement(
        &mut self,
        state: StateId,
        refinement: Refinement,
    ) -> Result<(), MachineError> {
        self.state_mut(state)?.push_refinement(refinement);
        self.bump();
        Ok(())
    }

    pub fn state(&self, id: StateId) -> Result<&State, MachineError> {
        self.states.get(id.0).ok_or(MachineError::UnknownState(id))
    }

    pub fn transition(&self, id: TransitionId) -> Result<&Transition, MachineError> {
        self.transitions
            .get(id.0)
            .ok_or(MachineError::UnknownTransition(id))
    }

    pub fn states(&self) -> impl Iterator<Item = (StateId, &State)> {
        self.states.iter().enumerate().map(|(i, s)| (StateId(i), s))
    }

    pub fn transitions(&self) -> impl Iterator<Item = (TransitionId, &Transition)> {
        self.transitions
            .iter()
            .enumerate()
            .map(|(i, t)| (TransitionId(i), t))
    }

    pub fn state_by_name(&self, name: &str) -> Option<StateId> {
        self.states
            .iter()
            .position(|s| s.name() == name)
            .map(StateId)
    }

    pub fn outgoing(&self, state: StateId) -> Result<&[TransitionId], MachineError> {
        Ok(self.state(state)?.outgoing())
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn inputs(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter().filter(|p| p.is_input())
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter().filter(|p| p.is_output())
    }

    /// Resolve a port by name.
    pub fn port(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.id().as_str() == name)
    }

    /// Resolve a name to an input port, ignoring outputs.
    pub fn input_port(&self, name: &str) -> Option<&PortId> {
        self.port(name).filter(|p| p.is_input()).map(Port::id)
    }

    pub fn relation_list(&self, transition: TransitionId) -> Result<&RelationList, MachineError> {
        Ok(self.transition(transition)?.relations())
    }

    /// Every enabled outgoing transition of `state`, in declaration order.
    ///
    /// All guards are evaluated, so every relation list of the state is
    /// refreshed. Default transitions are listed only when no other
    /// transition is enabled. Empty guards are enabled without consulting the
    /// evaluator.
    pub fn enabled_transitions(
        &mut self,
        state: StateId,
        evaluator: &mut dyn GuardEvaluator,
    ) -> Result<Vec<TransitionId>, MachineError> {
        let outgoing = self.outgoing(state)?.to_vec();
        let mut enabled = Vec::new();
        let mut defaults = Vec::new();

        for id in outgoing {
            let transition = self.transition_mut(id)?;
            let is_enabled = if transition.has_guard() {
                let guard = transition.guard().to_string();
                evaluator
                    .evaluate(&guard, transition.relations_mut())
                    .map_err(|source| MachineError::Guard {
                        transition: transition.name().to_string(),
                        source,
                    })?
            } else {
                true
            };

            trace!(transition = %transition.name(), enabled = is_enabled, "Evaluated guard");
            if is_enabled {
                if transition.is_default() {
                    defaults.push(id);
                } else {
                    enabled.push(id);
                }
            }
        }

        Ok(if enabled.is_empty() { defaults } else { enabled })
    }

    /// The transition the machine would take from `state`, if any.
    ///
    /// Picks the first enabled transition in declaration order. `None` means
    /// the machine stays where it is and no actions run.
    pub fn enabled_transition(
        &mut self,
        state: StateId,
        evaluator: &mut dyn GuardEvaluator,
    ) -> Result<Option<TransitionId>, MachineError> {
        Ok(self
            .enabled_transitions(state, evaluator)?
            .into_iter()
            .next())
    }

    /// Run the choice actions of `transition`.
    ///
    /// Safe to call repeatedly within one iteration; nothing in the model
    /// changes.
    pub fn run_choice_actions(
        &self,
        transition: TransitionId,
        sink: &mut dyn ActionSink,
    ) -> Result<(), MachineError> {
        let transition = self.transition(transition)?;
        for body in transition.choice_actions() {
            body.execute(sink).map_err(|source| MachineError::Action {
                transition: transition.name().to_string(),
                source,
            })?;
        }
        Ok(())
    }

    /// Run the commit actions of `transition` and move to its destination.
    ///
    /// The transition must leave the current state. After the move, the
    /// relation lists of the new state's outgoing transitions are reset so
    /// history from an earlier visit cannot raise an event.
    pub fn run_commit_actions_and_advance(
        &mut self,
        transition: TransitionId,
        sink: &mut dyn ActionSink,
    ) -> Result<StateId, MachineError> {
        let taken = self.transition(transition)?;
        if taken.source() != self.current {
            return Err(MachineError::NotOutgoing {
                transition: taken.name().to_string(),
                current: self.states[self.current.0].name().to_string(),
            });
        }

        for body in taken.commit_actions() {
            body.execute(sink).map_err(|source| MachineError::Action {
                transition: taken.name().to_string(),
                source,
            })?;
        }

        let from = self.current;
        let to = taken.destination();
        debug!(
            model = %self.name,
            transition = %taken.name(),
            from = %self.states[from.0].name(),
            to = %self.states[to.0].name(),
            "Committed transition"
        );

        self.current = to;
        self.history.push(transition, from, to);
        self.reset_relations(to)?;
        Ok(to)
    }

    /// Return to the initial state with fresh relation history.
    pub fn initialize(&mut self) {
        self.current = self.initial;
        self.history.clear();
        for transition in &mut self.transitions {
            transition.relations_mut().reset_all();
        }
    }

    /// True when any guard leaving `state` crossed a threshold since the last
    /// commit.
    pub fn has_crossing_event(&self, state: StateId) -> Result<bool, MachineError> {
        for id in self.outgoing(state)? {
            if self.transition(*id)?.relations().has_event() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Accept the latest guard evaluations of `state` as the new baseline.
    pub fn commit_relations(&mut self, state: StateId) -> Result<(), MachineError> {
        for id in self.outgoing(state)?.to_vec() {
            self.transition_mut(id)?.relations_mut().commit_all();
        }
        Ok(())
    }

    pub fn reset_relations(&mut self, state: StateId) -> Result<(), MachineError> {
        for id in self.outgoing(state)?.to_vec() {
            self.transition_mut(id)?.relations_mut().reset_all();
        }
        Ok(())
    }

    fn state_mut(&mut self, id: StateId) -> Result<&mut State, MachineError> {
        self.states
            .get_mut(id.0)
            .ok_or(MachineError::UnknownState(id))
    }

    fn transition_mut(&mut self, id: TransitionId) -> Result<&mut Transition, MachineError> {
        self.transitions
            .get_mut(id.0)
            .ok_or(MachineError::UnknownTransition(id))
    }

    fn bump(&mut self) {
        self.version = next_version();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RelationType;
    use crate::machine::{ActionError, Assignment, Destination, GuardError};
    use std::collections::HashMap;

    #[derive(Default)]
    struct RecordingSink {
        writes: Vec<String>,
    }

    impl ActionSink for RecordingSink {
        fn assign(
            &mut self,
            destination: &Destination,
            expression: &str,
        ) -> Result<(), ActionError> {
            self.writes.push(format!("{destination}={expression}"));
            Ok(())
        }
    }

    /// Evaluates guards of the form `<name>` against a table of booleans.
    struct TableEvaluator(HashMap<&'static str, bool>);

    impl GuardEvaluator for TableEvaluator {
        fn evaluate(
            &mut self,
            guard: &str,
            relations: &mut RelationList,
        ) -> Result<bool, GuardError> {
            let value = *self
                .0
                .get(guard)
                .ok_or_else(|| GuardError::new(guard, "unknown name"))?;
            relations.set_relation(0, RelationType::from_bool(value), 0.0);
            Ok(value)
        }
    }

    fn two_state_model() -> (FsmModel, StateId, StateId, TransitionId) {
        let mut model = FsmModel::new("m", "A");
        model.add_port(Port::input("x")).unwrap();
        model.add_port(Port::output("y")).unwrap();
        let a = model.initial_state();
        let b = model.add_state("B", true).unwrap();
        let t = model.add_transition("a_to_b", a, b, "go").unwrap();
        model
            .add_action(t, Action::choice([Assignment::output("y", "x")]))
            .unwrap();
        model
            .add_action(t, Action::commit([Assignment::parameter("n", "n + 1")]))
            .unwrap();
        (model, a, b, t)
    }

    #[test]
    fn edits_bump_version() {
        let mut model = FsmModel::new("m", "A");
        let v0 = model.version();
        let b = model.add_state("B", false).unwrap();
        let v1 = model.version();
        model
            .add_transition("t", model.initial_state(), b, "")
            .unwrap();

        assert!(v1 > v0);
        assert!(model.version() > v1);
    }

    #[test]
    fn versions_are_not_shared_between_models() {
        let mut first = FsmModel::new("m", "A");
        let mut second = FsmModel::new("m", "A");
        assert_ne!(first.version(), second.version());

        first.add_state("B", false).unwrap();
        second.add_state("B", false).unwrap();
        assert_ne!(first.version(), second.version());

        let mut copy = first.clone();
        assert_eq!(copy.version(), first.version());
        copy.set_final(copy.initial_state(), true).unwrap();
        first.set_final(first.initial_state(), true).unwrap();
        assert_ne!(copy.version(), first.version());
    }

    #[test]
    fn history_is_bounded_by_default() {
        let mut model = FsmModel::new("m", "A");
        let a = model.initial_state();
        let t = model.add_transition("loop", a, a, "").unwrap();
        let mut sink = RecordingSink::default();

        for _ in 0..DEFAULT_HISTORY_LIMIT + 3 {
            model.run_commit_actions_and_advance(t, &mut sink).unwrap();
        }

        assert_eq!(model.history().len(), DEFAULT_HISTORY_LIMIT);
        assert_eq!(model.history().committed(), DEFAULT_HISTORY_LIMIT as u64 + 3);

        model.set_history_limit(Some(1));
        model.run_commit_actions_and_advance(t, &mut sink).unwrap();
        model.run_commit_actions_and_advance(t, &mut sink).unwrap();
        assert_eq!(model.history().len(), 1);
        assert_eq!(model.history().transitions().next().map(|r| r.step), Some(1));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut model = FsmModel::new("m", "A");
        model.add_port(Port::input("x")).unwrap();

        assert!(matches!(
            model.add_state("A", false),
            Err(MachineError::DuplicateState(_))
        ));
        assert!(matches!(
            model.add_port(Port::output("x")),
            Err(MachineError::DuplicatePort(_))
        ));
    }

    #[test]
    fn transition_to_unknown_state_is_structural_error() {
        let mut model = FsmModel::new("m", "A");
        let result = model.add_transition("t", model.initial_state(), StateId(7), "");

        assert!(matches!(result, Err(MachineError::UnknownState(StateId(7)))));
        assert!(model.outgoing(model.initial_state()).unwrap().is_empty());
    }

    #[test]
    fn enabled_transition_follows_declaration_order() {
        let mut model = FsmModel::new("m", "A");
        let a = model.initial_state();
        let b = model.add_state("B", false).unwrap();
        let c = model.add_state("C", false).unwrap();
        let _never = model.add_transition("never", a, b, "no").unwrap();
        let first = model.add_transition("first", a, b, "yes").unwrap();
        let _second = model.add_transition("second", a, c, "yes").unwrap();

        let mut evaluator = TableEvaluator(HashMap::from([("yes", true), ("no", false)]));

        assert_eq!(
            model.enabled_transition(a, &mut evaluator).unwrap(),
            Some(first)
        );
        assert_eq!(model.enabled_transitions(a, &mut evaluator).unwrap().len(), 2);
    }

    #[test]
    fn default_transition_only_when_nothing_else_enabled() {
        let mut model = FsmModel::new("m", "A");
        let a = model.initial_state();
        let b = model.add_state("B", false).unwrap();
        let fallback = model.add_transition("fallback", a, a, "").unwrap();
        model.set_default(fallback, true).unwrap();
        let guarded = model.add_transition("guarded", a, b, "go").unwrap();

        let mut on = TableEvaluator(HashMap::from([("go", true)]));
        assert_eq!(model.enabled_transition(a, &mut on).unwrap(), Some(guarded));

        let mut off = TableEvaluator(HashMap::from([("go", false)]));
        assert_eq!(model.enabled_transition(a, &mut off).unwrap(), Some(fallback));
    }

    #[test]
    fn no_enabled_transition_stays_put() {
        let (mut model, a, _, _) = two_state_model();
        let mut evaluator = TableEvaluator(HashMap::from([("go", false)]));

        assert_eq!(model.enabled_transition(a, &mut evaluator).unwrap(), None);
        assert_eq!(model.current_state(), a);
        assert!(model.history().is_empty());
    }

    #[test]
    fn guard_failure_names_transition() {
        let (mut model, a, _, _) = two_state_model();
        let mut evaluator = TableEvaluator(HashMap::new());

        let err = model.enabled_transition(a, &mut evaluator).unwrap_err();
        match err {
            MachineError::Guard { transition, source } => {
                assert_eq!(transition, "a_to_b");
                assert_eq!(source.guard, "go");
            }
            other => panic!("Expected guard error, got {other:?}"),
        }
    }

    #[test]
    fn choice_actions_are_repeatable_and_do_not_move_state() {
        let (model, a, _, t) = two_state_model();
        let mut sink = RecordingSink::default();

        model.run_choice_actions(t, &mut sink).unwrap();
        model.run_choice_actions(t, &mut sink).unwrap();

        assert_eq!(sink.writes, vec!["y=x", "y=x"]);
        assert_eq!(model.current_state(), a);
    }

    #[test]
    fn commit_runs_commit_actions_and_advances() {
        let (mut model, a, b, t) = two_state_model();
        let mut sink = RecordingSink::default();
        let version = model.version();

        let to = model.run_commit_actions_and_advance(t, &mut sink).unwrap();

        assert_eq!(to, b);
        assert_eq!(model.current_state(), b);
        assert!(model.is_final());
        assert_eq!(sink.writes, vec!["n=n + 1"]);
        assert_eq!(model.history().get_path(), vec![a, b]);
        assert_eq!(model.version(), version);
    }

    #[test]
    fn commit_from_wrong_state_is_rejected() {
        let (mut model, _, _, t) = two_state_model();
        let mut sink = RecordingSink::default();
        model.run_commit_actions_and_advance(t, &mut sink).unwrap();

        let err = model
            .run_commit_actions_and_advance(t, &mut sink)
            .unwrap_err();
        assert!(matches!(err, MachineError::NotOutgoing { .. }));
    }

    #[test]
    fn entering_a_state_resets_its_relation_history() {
        let mut model = FsmModel::new("m", "A");
        let a = model.initial_state();
        let b = model.add_state("B", false).unwrap();
        let there = model.add_transition("there", a, b, "go").unwrap();
        let back = model.add_transition("back", b, a, "level").unwrap();

        // Give the return guard a committed baseline, then leave it pending.
        let mut crossing = |guard: &str, relations: &mut RelationList| {
            let kind = if guard == "level" {
                RelationType::LessThan
            } else {
                RelationType::True
            };
            relations.set_relation(0, kind, -1.0);
            Ok::<_, GuardError>(true)
        };
        model.enabled_transitions(b, &mut crossing).unwrap();
        model.commit_relations(b).unwrap();
        let mut flipped = |_: &str, relations: &mut RelationList| {
            relations.set_relation(0, RelationType::GreaterThan, 1.0);
            Ok::<_, GuardError>(true)
        };
        model.enabled_transitions(b, &mut flipped).unwrap();
        assert!(model.has_crossing_event(b).unwrap());

        let mut sink = RecordingSink::default();
        model.run_commit_actions_and_advance(there, &mut sink).unwrap();

        assert!(!model.has_crossing_event(b).unwrap());
        assert!(model
            .relation_list(back)
            .unwrap()
            .iter()
            .all(|n| n.previous_type().is_invalid()));
    }

    #[test]
    fn initialize_returns_to_initial_state() {
        let (mut model, a, _, t) = two_state_model();
        let mut sink = RecordingSink::default();
        model.run_commit_actions_and_advance(t, &mut sink).unwrap();

        model.initialize();

        assert_eq!(model.current_state(), a);
        assert!(model.history().is_empty());
    }

    #[test]
    fn set_guard_clears_relation_list() {
        let (mut model, a, _, t) = two_state_model();
        let mut evaluator = TableEvaluator(HashMap::from([("go", true)]));
        model.enabled_transition(a, &mut evaluator).unwrap();
        assert_eq!(model.relation_list(t).unwrap().len(), 1);

        model.set_guard(t, "stop").unwrap();

        assert!(model.relation_list(t).unwrap().is_empty());
        assert_eq!(model.transition(t).unwrap().guard(), "stop");
    }
}
