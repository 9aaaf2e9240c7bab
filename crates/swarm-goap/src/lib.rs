//! Deterministic GOAP planning and plan execution for swarm game agents.
//!
//! Actions are stateless [`GoapAction`] descriptors; the [`GoapPlanner`] searches over
//! [`swarm_core::WorldState`] snapshots and the [`PlanExecutor`] drives the resulting plan one
//! task poll per tick. [`RoleLoop`] and [`Swarm`] glue both into a per-agent game loop.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod action;
pub mod condition;
pub mod config;
pub mod effect;
pub mod error;
pub mod executor;
pub mod goal;
pub mod plan;
pub mod planner;
pub mod role;
pub mod swarm;

pub use action::{Cost, GoapAction};
pub use condition::{Compare, Condition, Evaluator, Precondition};
pub use config::{ExecutorConfig, GoapConfig, PlannerConfig, RoleConfig};
pub use effect::Effect;
pub use error::{ConfigError, PlanError};
pub use executor::{ExecutorState, ExecutorStats, PlanExecutor, ReplanReason};
pub use goal::Goal;
pub use plan::{Plan, PlanStep, SearchStats};
pub use planner::GoapPlanner;
pub use role::{GoalFn, PerceiveFn, RoleLoop, RoleStatus};
pub use swarm::Swarm;
