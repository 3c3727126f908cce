//! Configuration of the causality analysis.

use serde::{Deserialize, Serialize};

/// Suffix hosts use for "is a token present on this port" guard variables.
pub const DEFAULT_PRESENCE_SUFFIX: &str = "_isPresent";

/// Options controlling which transitions are analyzed and how guard names
/// map to ports.
///
/// # Example
///
/// ```rust
/// use fsm_causality::causality::CausalityConfig;
///
/// let config = CausalityConfig::default().with_state_dependent(true);
/// assert!(config.state_dependent);
/// assert_eq!(config.presence_suffix.as_deref(), Some("_isPresent"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CausalityConfig {
    /// Analyze only the current state's outgoing transitions and refinements
    /// instead of the whole model.
    pub state_dependent: bool,

    /// Guard names ending with this suffix also resolve to the port named by
    /// the rest of the name.
    pub presence_suffix: Option<String>,
}

impl Default for CausalityConfig {
    fn default() -> Self {
        Self {
            state_dependent: false,
            presence_suffix: Some(DEFAULT_PRESENCE_SUFFIX.to_string()),
        }
    }
}

impl CausalityConfig {
    pub fn with_state_dependent(mut self, state_dependent: bool) -> Self {
        self.state_dependent = state_dependent;
        self
    }

    pub fn with_presence_suffix(mut self, suffix: Option<String>) -> Self {
        self.presence_suffix = suffix;
        self
    }
}
