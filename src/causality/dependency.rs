//! Dependency algebras.
//!
//! A dependency value says how strongly an output depends on an input. The
//! values form an idempotent semiring supplied by the scheduler; the analysis
//! only ever needs its two identities.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// A value of a dependency semiring.
///
/// The identities are taken from an existing value, the scheduler's default
/// dependency, so that algebras carrying extra context can produce them.
pub trait Dependency: Clone + PartialEq + Debug {
    /// Additive identity: no dependency at all.
    fn o_plus_identity(&self) -> Self;

    /// Multiplicative identity: a direct, instantaneous dependency.
    fn o_times_identity(&self) -> Self;
}

/// `false` means independent, `true` means dependent.
///
/// # Example
///
/// ```rust
/// use fsm_causality::causality::{BooleanDependency, Dependency};
///
/// let none = BooleanDependency::INDEPENDENT;
/// assert_eq!(none.o_times_identity(), BooleanDependency::DEPENDENT);
/// assert_eq!(none.o_plus(BooleanDependency::DEPENDENT), BooleanDependency::DEPENDENT);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BooleanDependency(pub bool);

impl BooleanDependency {
    pub const INDEPENDENT: Self = Self(false);
    pub const DEPENDENT: Self = Self(true);

    /// Parallel composition.
    pub fn o_plus(self, other: Self) -> Self {
        Self(self.0 || other.0)
    }

    /// Serial composition.
    pub fn o_times(self, other: Self) -> Self {
        Self(self.0 && other.0)
    }
}

impl Dependency for BooleanDependency {
    fn o_plus_identity(&self) -> Self {
        Self::INDEPENDENT
    }

    fn o_times_identity(&self) -> Self {
        Self::DEPENDENT
    }
}

/// Minimum delay from input to output.
///
/// `0.0` is a direct dependency and `+inf` means the output never sees the
/// input.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RealDependency(pub f64);

impl RealDependency {
    pub const INDEPENDENT: Self = Self(f64::INFINITY);
    pub const DIRECT: Self = Self(0.0);

    /// Parallel composition keeps the shorter path.
    pub fn o_plus(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }

    /// Serial composition adds delays.
    pub fn o_times(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl Dependency for RealDependency {
    fn o_plus_identity(&self) -> Self {
        Self::INDEPENDENT
    }

    fn o_times_identity(&self) -> Self {
        Self::DIRECT
    }
}
