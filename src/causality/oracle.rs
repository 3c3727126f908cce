//! Causality of nested refinements.

use super::error::CausalityError;
use crate::core::PortId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Causality information a refinement exposes to its container.
pub trait RefinementCausality: Send + Sync {
    /// Inputs of the refinement that `output` depends on.
    fn dependent_ports(&self, output: &PortId) -> Result<BTreeSet<PortId>, CausalityError>;

    /// Inputs that must be resolved together with `input`, including itself.
    fn equivalent_ports(&self, input: &PortId) -> Result<BTreeSet<PortId>, CausalityError>;
}

/// A sub-model attached to a state.
///
/// Port names of the refinement are matched by name against the ports of
/// the enclosing model.
#[derive(Clone)]
pub struct Refinement {
    name: String,
    outputs: Vec<PortId>,
    causality: Arc<dyn RefinementCausality>,
}

impl Refinement {
    pub fn new(
        name: impl Into<String>,
        outputs: impl IntoIterator<Item = impl Into<PortId>>,
        causality: Arc<dyn RefinementCausality>,
    ) -> Self {
        Self {
            name: name.into(),
            outputs: outputs.into_iter().map(Into::into).collect(),
            causality,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn outputs(&self) -> &[PortId] {
        &self.outputs
    }

    pub fn causality(&self) -> &dyn RefinementCausality {
        self.causality.as_ref()
    }
}

impl fmt::Debug for Refinement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refinement")
            .field("name", &self.name)
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

/// Table-backed causality, for refinements whose analysis is already known.
///
/// # Example
///
/// ```rust
/// use fsm_causality::causality::{RefinementCausality, StaticCausality};
/// use fsm_causality::core::PortId;
///
/// let oracle = StaticCausality::new()
///     .depends("out", ["a"])
///     .equivalent(["a", "b"]);
///
/// let inputs = oracle.dependent_ports(&PortId::from("out")).unwrap();
/// assert!(inputs.contains("a"));
/// assert_eq!(oracle.equivalent_ports(&PortId::from("b")).unwrap().len(), 2);
/// assert_eq!(oracle.equivalent_ports(&PortId::from("c")).unwrap().len(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticCausality {
    dependents: BTreeMap<PortId, BTreeSet<PortId>>,
    equivalents: BTreeMap<PortId, BTreeSet<PortId>>,
}

impl StaticCausality {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `output` depends on each of `inputs`.
    pub fn depends(
        mut self,
        output: impl Into<PortId>,
        inputs: impl IntoIterator<Item = impl Into<PortId>>,
    ) -> Self {
        self.dependents
            .entry(output.into())
            .or_default()
            .extend(inputs.into_iter().map(Into::into));
        self
    }

    /// Make every port of `group` equivalent to every other.
    pub fn equivalent(mut self, group: impl IntoIterator<Item = impl Into<PortId>>) -> Self {
        let group: BTreeSet<PortId> = group.into_iter().map(Into::into).collect();
        for port in &group {
            self.equivalents
                .entry(port.clone())
                .or_default()
                .extend(group.iter().cloned());
        }
        self
    }
}

impl RefinementCausality for StaticCausality {
    fn dependent_ports(&self, output: &PortId) -> Result<BTreeSet<PortId>, CausalityError> {
        Ok(self.dependents.get(output).cloned().unwrap_or_default())
    }

    fn equivalent_ports(&self, input: &PortId) -> Result<BTreeSet<PortId>, CausalityError> {
        Ok(self
            .equivalents
            .get(input)
            .cloned()
            .unwrap_or_else(|| BTreeSet::from([input.clone()])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equivalence_groups_are_symmetric() {
        let oracle = StaticCausality::new().equivalent(["a", "b", "c"]);

        for name in ["a", "b", "c"] {
            let class = oracle.equivalent_ports(&PortId::from(name)).unwrap();
            assert_eq!(class.len(), 3);
        }
    }

    #[test]
    fn unknown_output_has_no_dependents() {
        let oracle = StaticCausality::new().depends("y", ["x"]);
        assert!(oracle
            .dependent_ports(&PortId::from("z"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn refinement_debug_omits_oracle() {
        let refinement = Refinement::new("inner", ["y"], Arc::new(StaticCausality::new()));
        let debug = format!("{refinement:?}");

        assert!(debug.contains("inner"));
        assert_eq!(refinement.outputs(), &[PortId::from("y")]);
    }
}
