//! Builder for constructing FSM models.

use crate::builder::error::BuildError;
use crate::builder::transition::{TransitionBuilder, TransitionSpec};
use crate::builder::validate::{validate_model, ModelValidation};
use crate::causality::Refinement;
use crate::machine::{FsmModel, Port};
use stillwater::validation::Validation;

/// Builder for constructing models with a fluent API.
///
/// States are referred to by name; names are resolved to ids when the
/// model is built, after the whole description has been validated.
///
/// # Example
///
/// ```rust
/// use fsm_causality::builder::{ModelBuilder, TransitionBuilder};
/// use fsm_causality::machine::Assignment;
///
/// let model = ModelBuilder::new("bouncer")
///     .input("height")
///     .output("bounce")
///     .state("Falling")
///     .initial("Falling")
///     .transition(
///         TransitionBuilder::new()
///             .from("Falling")
///             .to("Falling")
///             .guard("height < 0")
///             .choice([Assignment::output("bounce", "true")]),
///     )
///     .unwrap()
///     .build()
///     .unwrap();
///
/// assert_eq!(model.transitions().count(), 1);
/// ```
#[derive(Debug)]
pub struct ModelBuilder {
    name: String,
    ports: Vec<Port>,
    states: Vec<(String, bool)>,
    initial: Option<String>,
    transitions: Vec<TransitionSpec>,
    refinements: Vec<(String, Refinement)>,
}

impl ModelBuilder {
    /// Create a new builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ports: Vec::new(),
            states: Vec::new(),
            initial: None,
            transitions: Vec::new(),
            refinements: Vec::new(),
        }
    }

    pub fn port(mut self, port: Port) -> Self {
        self.ports.push(port);
        self
    }

    pub fn input(self, name: &str) -> Self {
        self.port(Port::input(name))
    }

    /// Declare a parameter-style input.
    pub fn parameter(self, name: &str) -> Self {
        self.port(Port::parameter(name))
    }

    pub fn output(self, name: &str) -> Self {
        self.port(Port::output(name))
    }

    pub fn state(mut self, name: impl Into<String>) -> Self {
        self.states.push((name.into(), false));
        self
    }

    pub fn final_state(mut self, name: impl Into<String>) -> Self {
        self.states.push((name.into(), true));
        self
    }

    /// Set the initial state (required). It must also be declared.
    pub fn initial(mut self, name: impl Into<String>) -> Self {
        self.initial = Some(name.into());
        self
    }

    /// Add a transition using a builder.
    /// Returns an error if the builder fails validation.
    pub fn transition(mut self, builder: TransitionBuilder) -> Result<Self, BuildError> {
        let spec = builder.build()?;
        self.transitions.push(spec);
        Ok(self)
    }

    /// Add a pre-built transition description.
    pub fn add_transition(mut self, spec: TransitionSpec) -> Self {
        self.transitions.push(spec);
        self
    }

    /// Attach a refinement to a state.
    pub fn refinement(mut self, state: impl Into<String>, refinement: Refinement) -> Self {
        self.refinements.push((state.into(), refinement));
        self
    }

    /// Check the description without building it.
    pub fn validate(&self) -> ModelValidation {
        validate_model(
            self.initial.as_deref(),
            &self.states,
            &self.ports,
            &self.transitions,
            &self.refinements,
        )
    }

    /// Build the model.
    /// Returns every structural violation at once if the description is invalid.
    pub fn build(self) -> Result<FsmModel, BuildError> {
        let initial = self.initial.clone().ok_or(BuildError::MissingInitialState)?;

        if let Validation::Failure(errors) = self.validate() {
            return Err(BuildError::Invalid {
                violations: errors.iter().cloned().collect(),
            });
        }

        let mut model = FsmModel::new(self.name, initial.clone());
        for port in self.ports {
            model.add_port(port)?;
        }
        for (name, is_final) in self.states {
            if name == initial {
                model.set_final(model.initial_state(), is_final)?;
            } else {
                model.add_state(name, is_final)?;
            }
        }

        let resolve = |model: &FsmModel, name: &str| {
            model
                .state_by_name(name)
                .ok_or_else(|| BuildError::UnknownState(name.to_string()))
        };

        for spec in self.transitions {
            let from = resolve(&model, &spec.from)?;
            let to = resolve(&model, &spec.to)?;
            let id = model.add_transition(spec.name, from, to, spec.guard)?;
            for action in spec.actions {
                model.add_action(id, action)?;
            }
            if spec.is_default {
                model.set_default(id, true)?;
            }
        }

        for (state, refinement) in self.refinements {
            let id = resolve(&model, &state)?;
            model.add_refinement(id, refinement)?;
        }

        Ok(model)
    }
}
