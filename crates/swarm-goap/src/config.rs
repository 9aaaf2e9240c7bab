//! Tunables for planning, execution and the role loop, loadable from YAML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Top-level configuration, usually loaded from a per-role `goap.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoapConfig {
    pub planner: PlannerConfig,
    pub executor: ExecutorConfig,
    pub role: RoleConfig,
}

impl GoapConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Like [`GoapConfig::load`], but a missing file means defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Search bounds. Both `max_depth` and `max_expansions` always apply: increment effects
/// (gather one more seed) would otherwise make the state space unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Longest plan the search will build.
    pub max_depth: usize,

    /// Node expansions before the search gives up.
    pub max_expansions: usize,

    /// Floor applied to every action cost so that the search always terminates.
    pub min_action_cost: f64,

    /// Weight of the "unmet goal conditions" heuristic. `0.0` expands strictly
    /// lowest-cost-first; larger values trade optimality for speed.
    pub heuristic_weight: f64,

    /// On budget exhaustion, return the closest partial plan instead of nothing.
    pub allow_partial: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_depth: 16,
            max_expansions: 4096,
            min_action_cost: 0.001,
            heuristic_weight: 0.0,
            allow_partial: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Consecutive failed steps before the whole plan is abandoned.
    pub max_failures: u32,

    /// Changed fact keys (relative to the plan's snapshot) tolerated before the plan is
    /// considered stale.
    pub drift_threshold: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_failures: 3,
            drift_threshold: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleConfig {
    /// Minimum interval (in ticks) between cancelling a running plan and starting a new one.
    /// This avoids thrash when inputs fluctuate.
    pub min_replan_interval_ticks: u32,

    /// Number of times a plan may be started for the same goal before the role gives up on it.
    ///
    /// Guards against "no progress" loops where every step reports success but the goal never
    /// becomes true (the modelled effects did not happen).
    pub max_plan_starts_per_goal: Option<u32>,

    /// Run the executor's drift check once per tick.
    pub check_drift: bool,
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            min_replan_interval_ticks: 0,
            max_plan_starts_per_goal: None,
            check_drift: true,
        }
    }
}
