//! Cached input/output causality of an FSM model.

use super::config::CausalityConfig;
use super::dependency::Dependency;
use super::error::CausalityError;
use super::oracle::{Refinement, StaticCausality};
use crate::core::{PortId, StateId, TransitionId};
use crate::machine::{FsmModel, GuardParser, IdentifierCollector, Port};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, trace};

type DependencyMap<D> = BTreeMap<PortId, BTreeMap<PortId, D>>;

/// Everything one recompute produces.
#[derive(Debug)]
struct Analysis<D> {
    /// input -> output -> dependency
    forward: DependencyMap<D>,
    /// output -> input -> dependency
    reverse: DependencyMap<D>,
    equivalence: BTreeMap<PortId, Arc<BTreeSet<PortId>>>,
}

impl<D: Clone> Analysis<D> {
    fn record(&mut self, input: &PortId, output: &PortId, dependency: D) {
        self.forward
            .entry(input.clone())
            .or_default()
            .insert(output.clone(), dependency.clone());
        self.reverse
            .entry(output.clone())
            .or_default()
            .insert(input.clone(), dependency);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CacheKey {
    version: u64,
    state: Option<StateId>,
}

/// Conservative causality analysis of an [`FsmModel`].
///
/// An output depends directly on every input named in the guard of a
/// transition whose choice actions write that output. Inputs that jointly
/// decide the next state are placed in one equivalence class, together with
/// inputs that reach a refinement's outputs.
///
/// Results are cached against [`FsmModel::version`] (and the current state
/// in state-dependent mode). Versions are unique across models, so one
/// interface may be queried with different models; an unedited clone shares
/// its original's analysis. The cache assumes a single writer: the model must
/// not be edited while a query runs.
///
/// # Example
///
/// ```rust
/// use fsm_causality::causality::{BooleanDependency, CausalityInterface};
/// use fsm_causality::core::PortId;
/// use fsm_causality::machine::{Action, Assignment, FsmModel, Port};
///
/// let mut model = FsmModel::new("thermostat", "Off");
/// model.add_port(Port::input("temp")).unwrap();
/// model.add_port(Port::input("mode")).unwrap();
/// model.add_port(Port::output("heat")).unwrap();
/// let off = model.initial_state();
/// let on = model.add_state("On", false).unwrap();
/// let t = model.add_transition("cold", off, on, "temp < 18").unwrap();
/// model.add_action(t, Action::choice([Assignment::output("heat", "true")])).unwrap();
///
/// let mut causality = CausalityInterface::new(BooleanDependency::INDEPENDENT);
/// let temp = PortId::from("temp");
/// let mode = PortId::from("mode");
/// let heat = PortId::from("heat");
///
/// assert_eq!(
///     causality.dependency(&model, &temp, Some(&heat)).unwrap(),
///     BooleanDependency::DEPENDENT
/// );
/// assert_eq!(
///     causality.dependency(&model, &mode, Some(&heat)).unwrap(),
///     BooleanDependency::INDEPENDENT
/// );
/// assert_eq!(causality.recompute_count(), 1);
/// ```
pub struct CausalityInterface<D: Dependency, P: GuardParser = IdentifierCollector> {
    default_dependency: D,
    parser: P,
    config: CausalityConfig,
    cache: Option<(CacheKey, Analysis<D>)>,
    recomputes: usize,
}

impl<D: Dependency> CausalityInterface<D, IdentifierCollector> {
    /// Analyze with the built-in identifier scanner.
    pub fn new(default_dependency: D) -> Self {
        Self::with_parser(default_dependency, IdentifierCollector)
    }
}

impl<D: Dependency, P: GuardParser> CausalityInterface<D, P> {
    pub fn with_parser(default_dependency: D, parser: P) -> Self {
        Self {
            default_dependency,
            parser,
            config: CausalityConfig::default(),
            cache: None,
            recomputes: 0,
        }
    }

    pub fn with_config(mut self, config: CausalityConfig) -> Self {
        self.config = config;
        self.cache = None;
        self
    }

    pub fn config(&self) -> &CausalityConfig {
        &self.config
    }

    pub fn default_dependency(&self) -> &D {
        &self.default_dependency
    }

    /// Number of full recomputes so far.
    pub fn recompute_count(&self) -> usize {
        self.recomputes
    }

    /// Drop the cached analysis regardless of the model version.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// How strongly `output` depends on `input`.
    ///
    /// Returns the additive identity when nothing is recorded. Passing no
    /// output only refreshes the analysis.
    pub fn dependency(
        &mut self,
        model: &FsmModel,
        input: &PortId,
        output: Option<&PortId>,
    ) -> Result<D, CausalityError> {
        let analysis = self.analysis(model)?;
        let recorded = output
            .and_then(|output| analysis.forward.get(input)?.get(output))
            .cloned();
        Ok(recorded.unwrap_or_else(|| self.default_dependency.o_plus_identity()))
    }

    /// Inputs that must be resolved together with `input`, itself included.
    ///
    /// Ports that share a class share the same allocation.
    pub fn equivalence_class(
        &mut self,
        model: &FsmModel,
        input: &PortId,
    ) -> Result<Arc<BTreeSet<PortId>>, CausalityError> {
        let analysis = self.analysis(model)?;
        Ok(analysis
            .equivalence
            .get(input)
            .cloned()
            .unwrap_or_else(|| Arc::new(BTreeSet::from([input.clone()]))))
    }

    /// Ports on the other side of recorded dependencies.
    ///
    /// For an output port, the inputs it depends on; for an input port, the
    /// outputs that depend on it.
    pub fn dependent_ports(
        &mut self,
        model: &FsmModel,
        port: &PortId,
    ) -> Result<BTreeSet<PortId>, CausalityError> {
        let none = self.default_dependency.o_plus_identity();
        let is_output = model.port(port.as_str()).is_some_and(Port::is_output);
        let analysis = self.analysis(model)?;
        let map = if is_output {
            &analysis.reverse
        } else {
            &analysis.forward
        };

        Ok(map
            .get(port)
            .map(|targets| {
                targets
                    .iter()
                    .filter(|(_, dependency)| **dependency != none)
                    .map(|(target, _)| target.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Freeze the current analysis into a table another model can use as
    /// a refinement oracle.
    pub fn snapshot(&mut self, model: &FsmModel) -> Result<StaticCausality, CausalityError> {
        let mut snapshot = StaticCausality::new();
        for output in model.outputs() {
            let inputs = self.dependent_ports(model, output.id())?;
            snapshot = snapshot.depends(output.id().clone(), inputs);
        }
        for input in model.inputs() {
            let class = self.equivalence_class(model, input.id())?;
            snapshot = snapshot.equivalent(class.iter().cloned());
        }
        Ok(snapshot)
    }

    /// Package `model` as a refinement for an enclosing model.
    pub fn as_refinement(&mut self, model: &FsmModel) -> Result<Refinement, CausalityError> {
        let snapshot = self.snapshot(model)?;
        Ok(Refinement::new(
            model.name(),
            model.outputs().map(|p| p.id().clone()),
            Arc::new(snapshot),
        ))
    }

    fn analysis(&mut self, model: &FsmModel) -> Result<&Analysis<D>, CausalityError> {
        let key = CacheKey {
            version: model.version(),
            state: self
                .config
                .state_dependent
                .then(|| model.current_state()),
        };

        let analysis = match self.cache.take() {
            Some((cached, analysis)) if cached == key => analysis,
            _ => {
                let analysis = self.compute(model)?;
                self.recomputes += 1;
                analysis
            }
        };
        Ok(&self.cache.insert((key, analysis)).1)
    }

    fn compute(&self, model: &FsmModel) -> Result<Analysis<D>, CausalityError> {
        let mut analysis = Analysis {
            forward: BTreeMap::new(),
            reverse: BTreeMap::new(),
            equivalence: model
                .inputs()
                .map(|p| (p.id().clone(), Arc::new(BTreeSet::from([p.id().clone()]))))
                .collect(),
        };

        let (transitions, states): (Vec<TransitionId>, Vec<StateId>) =
            if self.config.state_dependent {
                let current = model.current_state();
                (model.outgoing(current)?.to_vec(), vec![current])
            } else {
                (
                    model.transitions().map(|(id, _)| id).collect(),
                    model.states().map(|(id, _)| id).collect(),
                )
            };

        let direct = self.default_dependency.o_times_identity();
        let mut state_equivalent = BTreeSet::new();

        for id in &transitions {
            let transition = model.transition(*id)?;
            let outputs: BTreeSet<&PortId> = transition
                .choice_outputs()
                .filter(|port| model.port(port.as_str()).is_some_and(Port::is_output))
                .collect();

            if !transition.has_guard() {
                trace!(transition = %transition.name(), "Skipping transition without guard");
                continue;
            }

            let names = self
                .parser
                .free_variables(transition.guard())
                .map_err(|source| CausalityError::GuardParse {
                    transition: transition.name().to_string(),
                    guard: transition.guard().to_string(),
                    source,
                })?;
            let inputs: BTreeSet<&PortId> = names
                .iter()
                .filter_map(|name| self.resolve_input(model, name))
                .collect();

            if inputs.is_empty() {
                trace!(transition = %transition.name(), "Guard reads no input ports");
                continue;
            }

            for input in &inputs {
                for output in &outputs {
                    analysis.record(input, output, direct.clone());
                }
            }
            state_equivalent.extend(inputs.into_iter().cloned());
        }

        for state in &states {
            for refinement in model.state(*state)?.refinements() {
                self.merge_refinement(model, refinement, &mut state_equivalent)?;
            }
        }

        if model.inputs().any(Port::is_parameter) {
            debug!(model = %model.name(), "Parameter input present, all inputs are equivalent");
            state_equivalent = model.inputs().map(|p| p.id().clone()).collect();
        }

        let merged = state_equivalent.len();
        if !state_equivalent.is_empty() {
            let class = Arc::new(state_equivalent);
            for port in class.iter() {
                analysis.equivalence.insert(port.clone(), Arc::clone(&class));
            }
        }

        debug!(
            model = %model.name(),
            version = model.version(),
            transitions = transitions.len(),
            merged,
            "Recomputed causality"
        );
        Ok(analysis)
    }

    /// Inputs that feed a refinement's outputs must be resolved at the same
    /// time as the inputs that decide the outer transition.
    fn merge_refinement(
        &self,
        model: &FsmModel,
        refinement: &Refinement,
        state_equivalent: &mut BTreeSet<PortId>,
    ) -> Result<(), CausalityError> {
        let causality = refinement.causality();
        for output in refinement.outputs() {
            for inner in causality.dependent_ports(output)? {
                for equivalent in causality.equivalent_ports(&inner)? {
                    match model.input_port(equivalent.as_str()) {
                        Some(outer) => {
                            state_equivalent.insert(outer.clone());
                        }
                        None => trace!(
                            refinement = %refinement.name(),
                            port = %equivalent,
                            "No matching outer input"
                        ),
                    }
                }
            }
        }
        Ok(())
    }

    fn resolve_input<'m>(&self, model: &'m FsmModel, name: &str) -> Option<&'m PortId> {
        if let Some(port) = model.input_port(name) {
            return Some(port);
        }
        let suffix = self.config.presence_suffix.as_deref()?;
        name.strip_suffix(suffix)
            .and_then(|base| model.input_port(base))
    }
}
