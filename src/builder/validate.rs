//! Structural validation of model descriptions.
//!
//! Uses Stillwater's `Validation` to report ALL violations in one pass
//! instead of stopping at the first one.

use crate::builder::error::ModelViolation;
use crate::builder::transition::TransitionSpec;
use crate::causality::Refinement;
use crate::machine::Port;
use std::collections::BTreeSet;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

pub type ModelValidation = Validation<(), NonEmptyVec<ModelViolation>>;

fn check(ok: bool, violation: impl FnOnce() -> ModelViolation) -> ModelValidation {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(violation())
    }
}

/// Check a model description, accumulating every violation.
pub(crate) fn validate_model(
    initial: Option<&str>,
    states: &[(String, bool)],
    ports: &[Port],
    transitions: &[TransitionSpec],
    refinements: &[(String, Refinement)],
) -> ModelValidation {
    let mut checks: Vec<ModelValidation> = Vec::new();

    let mut declared = BTreeSet::new();
    for (name, _) in states {
        let first = declared.insert(name.as_str());
        checks.push(check(first, || ModelViolation::DuplicateState(name.clone())));
    }

    if let Some(initial) = initial {
        checks.push(check(declared.contains(initial), || {
            ModelViolation::UndeclaredInitial(initial.to_string())
        }));
    }

    let mut port_names = BTreeSet::new();
    for port in ports {
        let first = port_names.insert(port.id().as_str());
        checks.push(check(first, || {
            ModelViolation::DuplicatePort(port.id().to_string())
        }));
    }

    let outputs: BTreeSet<&str> = ports
        .iter()
        .filter(|p| p.is_output())
        .map(|p| p.id().as_str())
        .collect();

    for spec in transitions {
        for state in [&spec.from, &spec.to] {
            checks.push(check(declared.contains(state.as_str()), || {
                ModelViolation::UnknownState {
                    transition: spec.name.clone(),
                    state: state.clone(),
                }
            }));
        }

        for port in spec
            .actions
            .iter()
            .flat_map(|action| action.destinations())
            .filter_map(|destination| destination.output_port())
        {
            checks.push(check(outputs.contains(port.as_str()), || {
                ModelViolation::UnknownOutput {
                    transition: spec.name.clone(),
                    port: port.to_string(),
                }
            }));
        }
    }

    for (state, refinement) in refinements {
        checks.push(check(declared.contains(state.as_str()), || {
            ModelViolation::UnknownRefinementState {
                refinement: refinement.name().to_string(),
                state: state.clone(),
            }
        }));
    }

    Validation::all_vec(checks).map(|_| ())
}
