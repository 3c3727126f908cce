//! Causality interface exposed to the enclosing scheduler.
//!
//! The scheduler asks two questions of an FSM actor:
//!
//! - does an output depend instantaneously on an input
//!   ([`CausalityInterface::dependency`])?
//! - which inputs must be resolved together
//!   ([`CausalityInterface::equivalence_class`])?
//!
//! Both answers are conservative over-approximations computed from guard
//! free variables and choice-action destinations, plus the causality of any
//! refinements. Exact inference is out of reach in general, so the analysis
//! errs on the side of reporting more dependencies.

mod config;
mod dependency;
mod error;
mod interface;
mod oracle;

pub use config::{CausalityConfig, DEFAULT_PRESENCE_SUFFIX};
pub use dependency::{BooleanDependency, Dependency, RealDependency};
pub use error::CausalityError;
pub use interface::CausalityInterface;
pub use oracle::{Refinement, RefinementCausality, StaticCausality};
