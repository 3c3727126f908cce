//! Builder API for ergonomic model construction.
//!
//! This module provides fluent builders for describing models by state
//! name, with all structural problems reported together at build time.

pub mod error;
pub mod machine;
pub mod transition;
pub mod validate;

pub use error::{BuildError, ModelViolation};
pub use machine::ModelBuilder;
pub use transition::{TransitionBuilder, TransitionSpec};
pub use validate::ModelValidation;

/// Start a transition guarded by `guard`.
///
/// # Example
///
/// ```
/// use fsm_causality::builder::guarded_transition;
///
/// let spec = guarded_transition("Idle", "Busy", "request_isPresent")
///     .build()
///     .unwrap();
/// assert_eq!(spec.guard, "request_isPresent");
/// ```
pub fn guarded_transition(from: &str, to: &str, guard: &str) -> TransitionBuilder {
    TransitionBuilder::new().from(from).to(to).guard(guard)
}

/// Start a default transition, taken only when nothing else is enabled.
pub fn default_transition(from: &str, to: &str) -> TransitionBuilder {
    TransitionBuilder::new()
        .from(from)
        .to(to)
        .default_transition()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guarded_transition_sets_guard() {
        let spec = guarded_transition("A", "B", "x > 1").build().unwrap();

        assert_eq!(spec.from, "A");
        assert_eq!(spec.to, "B");
        assert_eq!(spec.guard, "x > 1");
    }

    #[test]
    fn default_transition_is_flagged() {
        let spec = default_transition("A", "A").build().unwrap();
        assert!(spec.is_default);
        assert!(spec.guard.is_empty());
    }
}
