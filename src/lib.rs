//! fsm-causality: causality analysis and guard tracking for modal models
//!
//! An FSM actor embedded in a dataflow or hybrid scheduler has to answer two
//! kinds of questions. Statically, which of its outputs depend on which
//! inputs, and which inputs must be resolved together. Dynamically, whether a
//! continuous guard such as `x >= 10` crossed its threshold during the last
//! step, and by how much.
//!
//! # Core Concepts
//!
//! - **Relations**: per-guard bookkeeping of threshold crossings with
//!   commit/rollback ([`core::RelationList`])
//! - **Model**: states, guarded transitions, choice and commit actions
//!   ([`machine::FsmModel`])
//! - **Causality**: cached, conservative input/output dependencies and input
//!   equivalence classes ([`causality::CausalityInterface`])
//!
//! # Example
//!
//! ```rust
//! use fsm_causality::builder::{guarded_transition, ModelBuilder};
//! use fsm_causality::causality::{BooleanDependency, CausalityInterface};
//! use fsm_causality::core::PortId;
//! use fsm_causality::machine::Assignment;
//!
//! let model = ModelBuilder::new("switch")
//!     .input("a")
//!     .input("b")
//!     .output("c")
//!     .state("Off")
//!     .state("On")
//!     .initial("Off")
//!     .transition(guarded_transition("Off", "On", "a > b").choice([Assignment::output("c", "a")]))
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let mut causality = CausalityInterface::new(BooleanDependency::INDEPENDENT);
//! let a = causality.equivalence_class(&model, &PortId::from("a")).unwrap();
//! let b = causality.equivalence_class(&model, &PortId::from("b")).unwrap();
//! assert_eq!(a, b);
//! assert_eq!(a.len(), 2);
//! ```
//!
//! All types are single-threaded in spirit: a cached analysis is only valid
//! while nobody edits the model it was computed from.

pub mod builder;
pub mod causality;
pub mod core;
pub mod machine;

// Re-export commonly used types
pub use crate::causality::{CausalityInterface, Dependency, RefinementCausality};
pub use crate::core::{PortId, RelationList, RelationNode, RelationType};
pub use crate::machine::{Action, FsmModel};
