//! States of an FSM model.

use crate::causality::Refinement;
use crate::core::TransitionId;

/// A state owned by an [`FsmModel`](super::FsmModel).
///
/// Outgoing transitions are kept as ids in declaration order, which is the
/// order the scheduler's tie-break sees.
#[derive(Clone, Debug)]
pub struct State {
    name: String,
    is_final: bool,
    outgoing: Vec<TransitionId>,
    refinements: Vec<Refinement>,
}

impl State {
    pub(crate) fn new(name: impl Into<String>, is_final: bool) -> Self {
        Self {
            name: name.into(),
            is_final,
            outgoing: Vec::new(),
            refinements: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Final states end a run at the scheduler's discretion.
    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn outgoing(&self) -> &[TransitionId] {
        &self.outgoing
    }

    pub fn refinements(&self) -> &[Refinement] {
        &self.refinements
    }

    pub(crate) fn set_final(&mut self, is_final: bool) {
        self.is_final = is_final;
    }

    pub(crate) fn push_outgoing(&mut self, transition: TransitionId) {
        self.outgoing.push(transition);
    }

    pub(crate) fn push_refinement(&mut self, refinement: Refinement) {
        self.refinements.push(refinement);
    }
}
