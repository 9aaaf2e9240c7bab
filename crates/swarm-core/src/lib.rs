//! Deterministic kernel primitives for swarm game agents: the fact store, the task contract the
//! executor polls, and the blackboard hosts use to inject collaborators.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod blackboard;
pub mod capability;
pub mod facts;
pub mod task;
pub mod tick;

pub use blackboard::{BbKey, Blackboard, BlackboardTypeMismatch};
pub use capability::{
    negotiation, Capabilities, Capability, DeliveryStatus, Negotiation, NEGOTIATION,
};
pub use facts::{FactError, FactKind, FactValue, WorldState};
pub use task::{ActionOutcome, ActionStatus, ActionTask, TaskError, TaskFactory};
pub use tick::{AgentId, GameWorld, TickContext};
