use std::fmt;

use swarm_core::{
    ActionStatus, ActionTask, Blackboard, GameWorld, TaskFactory, TickContext, WorldState,
};
use swarm_tools::{emit as trace_emit, TraceEvent};

use crate::{ExecutorConfig, Plan};

/// Why the executor dropped its plan. Advisory only: the caller decides what to plan next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReplanReason {
    GoalComplete,
    ActionFailed,
    WorldChanged,
    PlanExhausted,
}

impl ReplanReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ReplanReason::GoalComplete => "goal_complete",
            ReplanReason::ActionFailed => "action_failed",
            ReplanReason::WorldChanged => "world_changed",
            ReplanReason::PlanExhausted => "plan_exhausted",
        }
    }
}

impl fmt::Display for ReplanReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    /// No plan loaded.
    Idle,
    /// A plan is loaded and the step at the cursor has not started yet.
    ActionPending,
    /// The step at the cursor returned `Running` and will be polled again.
    ActionRunning,
    /// Every step ran; the plan stays loaded until the next tick or load.
    Complete,
    /// The plan was abandoned (failures, drift or a manual cancel).
    Aborted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutorStats {
    pub actions_executed: u64,
    pub actions_succeeded: u64,
    pub actions_failed: u64,
    pub replans_requested: u64,
}

struct Session<W, S>
where
    W: GameWorld,
{
    plan: Plan<S>,
    cursor: usize,
    active: Option<Box<dyn ActionTask<W>>>,
    consecutive_failures: u32,
    snapshot: WorldState,
}

type ReplanCallback = Box<dyn FnMut(ReplanReason)>;

/// Steps through a loaded plan, one task poll per tick.
///
/// The executor never plans. When it gives up on a plan it clears its session and reports a
/// [`ReplanReason`] through the callback (and [`PlanExecutor::take_replan_request`]); planning
/// again and calling [`PlanExecutor::load_plan`] is the caller's job.
///
/// Failure policy: a failed step is cancelled and skipped; the final step is retried instead,
/// since skipping it would only exhaust the plan. Once `max_failures` attempts in a row have
/// failed the whole plan is dropped with [`ReplanReason::ActionFailed`].
pub struct PlanExecutor<W, F>
where
    W: GameWorld,
    F: TaskFactory<W>,
{
    factory: F,
    config: ExecutorConfig,
    session: Option<Session<W, F::Spec>>,
    state: ExecutorState,
    stats: ExecutorStats,
    on_replan: Option<ReplanCallback>,
    replan_request: Option<ReplanReason>,
}

impl<W, F> PlanExecutor<W, F>
where
    W: GameWorld,
    F: TaskFactory<W>,
{
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            config: ExecutorConfig::default(),
            session: None,
            state: ExecutorState::Idle,
            stats: ExecutorStats::default(),
            on_replan: None,
            replan_request: None,
        }
    }

    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn on_replan(mut self, callback: impl FnMut(ReplanReason) + 'static) -> Self {
        self.on_replan = Some(Box::new(callback));
        self
    }

    pub fn set_on_replan(&mut self, callback: impl FnMut(ReplanReason) + 'static) {
        self.on_replan = Some(Box::new(callback));
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn state(&self) -> ExecutorState {
        self.state
    }

    pub fn stats(&self) -> ExecutorStats {
        self.stats
    }

    pub fn plan(&self) -> Option<&Plan<F::Spec>> {
        self.session.as_ref().map(|s| &s.plan)
    }

    pub fn cursor(&self) -> usize {
        self.session.as_ref().map(|s| s.cursor).unwrap_or(0)
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.session
            .as_ref()
            .map(|s| s.consecutive_failures)
            .unwrap_or(0)
    }

    /// Name of the step at the cursor, if any.
    pub fn current_action(&self) -> Option<&str> {
        let session = self.session.as_ref()?;
        session.plan.steps.get(session.cursor).map(|s| &*s.name)
    }

    pub fn is_executing(&self) -> bool {
        self.session.is_some()
            && matches!(
                self.state,
                ExecutorState::ActionPending | ExecutorState::ActionRunning
            )
    }

    pub fn is_complete(&self) -> bool {
        self.state == ExecutorState::Complete
    }

    /// Percentage of steps finished: `cursor / len * 100`. An empty plan counts as done.
    pub fn progress(&self) -> f64 {
        match self.session.as_ref() {
            None => 0.0,
            Some(session) if session.plan.is_empty() => 100.0,
            Some(session) => session.cursor as f64 / session.plan.len() as f64 * 100.0,
        }
    }

    pub fn status(&self) -> String {
        let Some(session) = self.session.as_ref() else {
            return match (self.state, self.replan_request) {
                (ExecutorState::Aborted, Some(reason)) => format!("aborted ({reason})"),
                (ExecutorState::Aborted, None) => "aborted".to_string(),
                _ => "idle".to_string(),
            };
        };

        let len = session.plan.len();
        let step = session.cursor.min(len);
        match self.state {
            ExecutorState::Complete => format!("complete ({len}/{len} steps)"),
            ExecutorState::ActionRunning | ExecutorState::ActionPending => {
                let name = session
                    .plan
                    .steps
                    .get(session.cursor)
                    .map(|s| &*s.name)
                    .unwrap_or("-");
                let verb = if self.state == ExecutorState::ActionRunning {
                    "running"
                } else {
                    "next"
                };
                format!(
                    "{verb} {name} (step {}/{len}, {} failures)",
                    step + 1,
                    session.consecutive_failures
                )
            }
            ExecutorState::Idle | ExecutorState::Aborted => format!("stopped at {step}/{len}"),
        }
    }

    /// Starts a new session. Any task still running from the previous plan is cancelled.
    pub fn load_plan(&mut self, plan: Plan<F::Spec>, initial: &WorldState) {
        self.cancel_active();
        tracing::debug!(
            goal = %plan.goal,
            steps = plan.len(),
            cost = plan.total_cost,
            "loading plan"
        );
        self.state = if plan.is_empty() {
            ExecutorState::Complete
        } else {
            ExecutorState::ActionPending
        };
        self.replan_request = None;
        self.session = Some(Session {
            plan,
            cursor: 0,
            active: None,
            consecutive_failures: 0,
            snapshot: initial.clone(),
        });
    }

    /// Advances the plan by one poll. Returns `true` while the plan still has work to do.
    pub fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
        facts: &WorldState,
    ) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        if session.plan.is_empty() {
            self.state = ExecutorState::Complete;
            return false;
        }

        if session.active.is_none() && session.cursor >= session.plan.len() {
            trace_emit(
                blackboard,
                TraceEvent::new(ctx.tick, "goap.exec.replan")
                    .with_label(ReplanReason::PlanExhausted.as_str())
                    .with_a(session.plan.len() as u64),
            );
            self.request_replan(ReplanReason::PlanExhausted);
            return false;
        }

        let cursor = session.cursor;
        let len = session.plan.len();
        let step = &session.plan.steps[cursor];

        if session.active.is_none() {
            let task = self
                .factory
                .build(&step.spec, ctx, agent, &*world, &*blackboard);
            self.stats.actions_executed += 1;
            trace_emit(
                blackboard,
                TraceEvent::new(ctx.tick, "goap.exec.start")
                    .with_label(step.name.clone())
                    .with_a(cursor as u64)
                    .with_b(len as u64),
            );
            session.active = Some(task);
        }
        let Some(task) = session.active.as_mut() else {
            return false;
        };

        let status = match task.poll(ctx, agent, world, blackboard, facts) {
            Ok(status) => status,
            Err(err) => {
                tracing::warn!(action = %step.name, error = %err, "action task errored");
                trace_emit(
                    blackboard,
                    TraceEvent::new(ctx.tick, "goap.exec.error")
                        .with_label(step.name.clone())
                        .with_a(cursor as u64),
                );
                ActionStatus::Failure
            }
        };

        match status {
            ActionStatus::Running => {
                self.state = ExecutorState::ActionRunning;
                true
            }
            ActionStatus::Success => {
                trace_emit(
                    blackboard,
                    TraceEvent::new(ctx.tick, "goap.exec.success")
                        .with_label(step.name.clone())
                        .with_a(cursor as u64)
                        .with_b(len as u64),
                );
                session.active = None;
                session.consecutive_failures = 0;
                session.cursor += 1;
                self.stats.actions_succeeded += 1;

                if session.cursor >= len {
                    tracing::debug!(goal = %session.plan.goal, steps = len, "plan complete");
                    self.state = ExecutorState::Complete;
                    false
                } else {
                    self.state = ExecutorState::ActionPending;
                    true
                }
            }
            ActionStatus::Failure => {
                session.consecutive_failures += 1;
                self.stats.actions_failed += 1;
                if let Some(mut task) = session.active.take() {
                    task.cancel();
                }
                let failures = session.consecutive_failures;
                trace_emit(
                    blackboard,
                    TraceEvent::new(ctx.tick, "goap.exec.failure")
                        .with_label(step.name.clone())
                        .with_a(failures as u64)
                        .with_b(cursor as u64),
                );

                if failures >= self.config.max_failures {
                    tracing::debug!(
                        action = %step.name,
                        failures,
                        "too many consecutive failures, abandoning plan"
                    );
                    trace_emit(
                        blackboard,
                        TraceEvent::new(ctx.tick, "goap.exec.replan")
                            .with_label(ReplanReason::ActionFailed.as_str())
                            .with_a(failures as u64),
                    );
                    self.request_replan(ReplanReason::ActionFailed);
                    return false;
                }

                if cursor + 1 < len {
                    session.cursor += 1;
                }
                self.state = ExecutorState::ActionPending;
                true
            }
        }
    }

    /// Drift check, meant to run once per tick from the role loop. When more than
    /// `drift_threshold` fact keys differ from the snapshot the plan was loaded with, the plan
    /// is dropped with [`ReplanReason::WorldChanged`]. Returns whether that happened.
    pub fn check_world_state_change(&mut self, facts: &WorldState) -> bool {
        let Some(session) = self.session.as_ref() else {
            return false;
        };
        let drift = facts.diff(&session.snapshot);
        if drift <= self.config.drift_threshold {
            return false;
        }
        tracing::debug!(
            drift,
            threshold = self.config.drift_threshold,
            "world drifted from plan snapshot"
        );
        self.request_replan(ReplanReason::WorldChanged);
        true
    }

    /// Cancels the running task, drops the plan and notifies the caller.
    pub fn request_replan(&mut self, reason: ReplanReason) {
        self.cancel_active();
        self.session = None;
        self.state = match reason {
            ReplanReason::GoalComplete | ReplanReason::PlanExhausted => ExecutorState::Idle,
            ReplanReason::ActionFailed | ReplanReason::WorldChanged => ExecutorState::Aborted,
        };
        self.stats.replans_requested += 1;
        self.replan_request = Some(reason);
        tracing::debug!(%reason, "replan requested");
        if let Some(callback) = self.on_replan.as_mut() {
            callback(reason);
        }
    }

    /// Manual abort. Behaves like [`PlanExecutor::request_replan`] but always leaves the
    /// executor `Aborted`.
    pub fn cancel(&mut self, reason: ReplanReason) {
        self.request_replan(reason);
        self.state = ExecutorState::Aborted;
    }

    /// Drops the plan without requesting a replan, e.g. when the caller has no goal left.
    pub fn clear(&mut self) {
        self.cancel_active();
        self.session = None;
        self.state = ExecutorState::Idle;
    }

    /// The most recent replan reason not yet consumed by the caller.
    pub fn take_replan_request(&mut self) -> Option<ReplanReason> {
        self.replan_request.take()
    }

    pub fn last_replan_request(&self) -> Option<ReplanReason> {
        self.replan_request
    }

    fn cancel_active(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if let Some(mut task) = session.active.take() {
                task.cancel();
            }
        }
    }
}
