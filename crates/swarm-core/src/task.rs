use std::borrow::Cow;

use thiserror::Error;

use crate::{Blackboard, GameWorld, TickContext, WorldState};

/// Result of polling an [`ActionTask`] for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    Running,
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Success,
    Failure,
}

impl From<ActionOutcome> for ActionStatus {
    fn from(value: ActionOutcome) -> Self {
        match value {
            ActionOutcome::Success => ActionStatus::Success,
            ActionOutcome::Failure => ActionStatus::Failure,
        }
    }
}

impl ActionStatus {
    pub fn outcome(self) -> Option<ActionOutcome> {
        match self {
            ActionStatus::Running => None,
            ActionStatus::Success => Some(ActionOutcome::Success),
            ActionStatus::Failure => Some(ActionOutcome::Failure),
        }
    }
}

/// Error raised from inside a task. The executor treats any error as a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("missing capability: {0}")]
    MissingCapability(&'static str),

    #[error("interaction failed: {0}")]
    Interaction(Cow<'static, str>),

    #[error("negotiation failed: {0}")]
    Negotiation(Cow<'static, str>),
}

impl TaskError {
    pub fn interaction(message: impl Into<Cow<'static, str>>) -> Self {
        TaskError::Interaction(message.into())
    }
}

/// One in-flight execution of a planned action.
///
/// A task is created when the executor reaches its plan step and is polled once per tick until
/// it reports `Success` or `Failure`. Multi-tick work (walking somewhere, waiting for another
/// agent to deliver) keeps its progress here, never in the action descriptor.
pub trait ActionTask<W>: 'static
where
    W: GameWorld,
{
    fn poll(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
        facts: &WorldState,
    ) -> Result<ActionStatus, TaskError>;

    /// Cancellation signal. Must not block; side effects already applied stay applied.
    fn cancel(&mut self) {}
}

/// Builds runtime [`ActionTask`]s from immutable action specs.
///
/// Planners output plans of `Spec` values; the executor turns each spec into a task lazily, one
/// step at a time, right before the step starts.
pub trait TaskFactory<W>: 'static
where
    W: GameWorld,
{
    type Spec: Clone + 'static;

    fn build(
        &self,
        spec: &Self::Spec,
        ctx: &TickContext,
        agent: W::Agent,
        world: &W,
        blackboard: &Blackboard,
    ) -> Box<dyn ActionTask<W>>;
}
