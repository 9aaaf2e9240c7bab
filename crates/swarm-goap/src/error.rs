use std::path::PathBuf;

use thiserror::Error;

/// Why the planner returned no plan. A normal outcome, not a fault: callers usually fall back
/// to a lower-priority goal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("goal `{goal}` is unreachable ({expansions} nodes expanded)")]
    Unreachable { goal: String, expansions: usize },

    #[error("search budget exhausted planning for `{goal}` after {expansions} expansions")]
    BudgetExhausted { goal: String, expansions: usize },

    #[error("plan step {index} (`{action}`) is not eligible in its simulated state")]
    InvalidStep { index: usize, action: String },
}

impl PlanError {
    pub fn expansions(&self) -> usize {
        match self {
            PlanError::Unreachable { expansions, .. }
            | PlanError::BudgetExhausted { expansions, .. } => *expansions,
            PlanError::InvalidStep { .. } => 0,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}
