use swarm_core::{Blackboard, Capabilities, GameWorld, TaskFactory, TickContext, WorldState};
use swarm_tools::{emit as trace_emit, TraceEvent};

use crate::{
    ExecutorState, GoapConfig, GoapPlanner, Goal, Plan, PlanError, PlanExecutor, ReplanReason,
    RoleConfig,
};

/// Refreshes the agent's facts from the world. Called once per tick before anything else.
pub type PerceiveFn<W> = Box<
    dyn FnMut(&TickContext, <W as GameWorld>::Agent, &W, &Blackboard, &mut WorldState),
>;

/// Picks the goal to pursue this tick. `None` means the role has nothing to do.
pub type GoalFn<W> = Box<
    dyn FnMut(
        &TickContext,
        <W as GameWorld>::Agent,
        &W,
        &Blackboard,
        &WorldState,
    ) -> Option<Goal>,
>;

/// What a [`RoleLoop`] did on its last tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleStatus {
    /// No goal selected.
    Idle,
    /// The selected goal already holds.
    Satisfied,
    /// A plan is loaded and being executed.
    Running,
    /// A restart is due but throttled by `min_replan_interval_ticks`.
    Waiting,
    /// No plan could be found, or the per-goal start budget ran out.
    Failed,
}

#[derive(Debug, Clone)]
struct PlanCacheEntry<S> {
    goal: Goal,
    facts: WorldState,
    capabilities: Capabilities,
    plan: Result<Plan<S>, PlanError>,
}

/// Per-agent glue around planner and executor: perceive, select a goal, plan when needed,
/// then advance the plan by one step.
///
/// - Plans are cached by `(goal, facts, capabilities)`, so an unchanged failed request does not
///   re-run the search every tick.
/// - A goal that becomes true mid-plan ends the plan with [`ReplanReason::GoalComplete`].
/// - A plan that runs to completion while the goal is still unmet counts as "no progress": the
///   cache is dropped and a new plan is started, subject to `max_plan_starts_per_goal`.
/// - Drift between the facts and the plan's snapshot triggers [`ReplanReason::WorldChanged`].
pub struct RoleLoop<W, F>
where
    W: GameWorld,
    F: TaskFactory<W>,
{
    agent: W::Agent,
    blackboard: Blackboard,
    facts: WorldState,
    planner: GoapPlanner<F::Spec>,
    executor: PlanExecutor<W, F>,
    config: RoleConfig,

    perceive: PerceiveFn<W>,
    select_goal: GoalFn<W>,

    goal: Option<Goal>,
    cache: Option<PlanCacheEntry<F::Spec>>,
    last_planned_tick: Option<u64>,
    starts_for_goal: u32,
    plan_calls: u64,
    plan_starts: u64,
    last_replan: Option<ReplanReason>,
    last_error: Option<PlanError>,
    last_status: RoleStatus,
}

impl<W, F> RoleLoop<W, F>
where
    W: GameWorld,
    F: TaskFactory<W>,
{
    pub fn new(
        agent: W::Agent,
        planner: GoapPlanner<F::Spec>,
        factory: F,
        perceive: impl FnMut(&TickContext, W::Agent, &W, &Blackboard, &mut WorldState) + 'static,
        select_goal: impl FnMut(&TickContext, W::Agent, &W, &Blackboard, &WorldState) -> Option<Goal>
            + 'static,
    ) -> Self {
        Self {
            agent,
            blackboard: Blackboard::new(),
            facts: WorldState::new(),
            planner,
            executor: PlanExecutor::new(factory),
            config: RoleConfig::default(),
            perceive: Box::new(perceive),
            select_goal: Box::new(select_goal),
            goal: None,
            cache: None,
            last_planned_tick: None,
            starts_for_goal: 0,
            plan_calls: 0,
            plan_starts: 0,
            last_replan: None,
            last_error: None,
            last_status: RoleStatus::Idle,
        }
    }

    /// Applies all three config sections: search bounds, executor thresholds and role policy.
    pub fn with_config(mut self, config: &GoapConfig) -> Self {
        self.planner = self.planner.with_config(config.planner);
        self.executor = self.executor.with_config(config.executor);
        self.config = config.role;
        self
    }

    pub fn with_role_config(mut self, config: RoleConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the blackboard, e.g. one pre-loaded with a trace sink and negotiation channel.
    pub fn with_blackboard(mut self, blackboard: Blackboard) -> Self {
        self.blackboard = blackboard;
        self
    }

    pub fn agent(&self) -> W::Agent {
        self.agent
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut self.blackboard
    }

    pub fn facts(&self) -> &WorldState {
        &self.facts
    }

    pub fn goal(&self) -> Option<&Goal> {
        self.goal.as_ref()
    }

    pub fn planner(&self) -> &GoapPlanner<F::Spec> {
        &self.planner
    }

    pub fn executor(&self) -> &PlanExecutor<W, F> {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut PlanExecutor<W, F> {
        &mut self.executor
    }

    pub fn cached_plan(&self) -> Option<&Plan<F::Spec>> {
        self.cache.as_ref()?.plan.as_ref().ok()
    }

    /// Number of times the planner actually searched (cache misses).
    pub fn plan_calls(&self) -> u64 {
        self.plan_calls
    }

    /// Number of plans loaded into the executor, cached or fresh.
    pub fn plan_starts(&self) -> u64 {
        self.plan_starts
    }

    pub fn last_replan(&self) -> Option<ReplanReason> {
        self.last_replan
    }

    pub fn last_error(&self) -> Option<&PlanError> {
        self.last_error.as_ref()
    }

    pub fn status(&self) -> RoleStatus {
        self.last_status
    }

    pub fn tick(&mut self, ctx: &TickContext, world: &mut W) -> RoleStatus {
        let status = self.drive(ctx, world);
        self.last_status = status;
        status
    }

    fn drive(&mut self, ctx: &TickContext, world: &mut W) -> RoleStatus {
        let agent = self.agent;
        (self.perceive)(ctx, agent, &*world, &self.blackboard, &mut self.facts);

        let Some(goal) = (self.select_goal)(ctx, agent, &*world, &self.blackboard, &self.facts)
        else {
            if self.goal.take().is_some() {
                self.executor.clear();
                self.starts_for_goal = 0;
            }
            return RoleStatus::Idle;
        };

        if self.goal.as_ref() != Some(&goal) {
            if let Some(previous) = self.goal.as_ref() {
                tracing::debug!(from = %previous.name, to = %goal.name, "goal changed");
                trace_emit(
                    &mut self.blackboard,
                    TraceEvent::new(ctx.tick, "goap.invalidated").with_label(goal.name.clone()),
                );
            }
            self.executor.clear();
            self.starts_for_goal = 0;
            self.goal = Some(goal.clone());
        }

        if goal.is_satisfied(&self.facts) {
            if self.executor.plan().is_some() {
                self.replan(ctx, ReplanReason::GoalComplete);
            }
            self.starts_for_goal = 0;
            trace_emit(
                &mut self.blackboard,
                TraceEvent::new(ctx.tick, "goap.done").with_label(goal.name.clone()),
            );
            return RoleStatus::Satisfied;
        }

        if self.executor.state() == ExecutorState::Complete {
            // Every step reported success but the goal is still unmet.
            self.cache = None;
            self.executor.clear();
            trace_emit(
                &mut self.blackboard,
                TraceEvent::new(ctx.tick, "goap.no_progress")
                    .with_label(goal.name.clone())
                    .with_a(goal.unmet(&self.facts) as u64),
            );
        }

        if self.config.check_drift && self.executor.check_world_state_change(&self.facts) {
            self.cache = None;
            self.note_replan(ctx, ReplanReason::WorldChanged);
        }

        if let Some(reason) = self.executor.take_replan_request() {
            self.last_replan = Some(reason);
            if reason == ReplanReason::ActionFailed {
                self.cache = None;
            }
        }

        if !self.executor.is_executing() {
            if !self.can_replan_now(ctx.tick) {
                return RoleStatus::Waiting;
            }

            if self.budget_exhausted() {
                trace_emit(
                    &mut self.blackboard,
                    TraceEvent::new(ctx.tick, "goap.budget_exhausted")
                        .with_label(goal.name.clone())
                        .with_a(self.starts_for_goal as u64),
                );
                return RoleStatus::Failed;
            }

            match self.get_or_plan(ctx, &goal) {
                Ok(plan) => {
                    self.last_error = None;
                    self.starts_for_goal = self.starts_for_goal.saturating_add(1);
                    self.plan_starts = self.plan_starts.saturating_add(1);
                    self.last_planned_tick = Some(ctx.tick);
                    trace_emit(
                        &mut self.blackboard,
                        TraceEvent::new(ctx.tick, "goap.plan.start")
                            .with_label(goal.name.clone())
                            .with_a(plan.len() as u64)
                            .with_b(self.starts_for_goal as u64),
                    );
                    self.executor.load_plan(plan, &self.facts);
                }
                Err(err) => {
                    tracing::debug!(goal = %goal.name, error = %err, "no plan for goal");
                    trace_emit(
                        &mut self.blackboard,
                        TraceEvent::new(ctx.tick, "goap.plan.none")
                            .with_label(goal.name.clone())
                            .with_a(err.expansions() as u64),
                    );
                    self.last_error = Some(err);
                    return RoleStatus::Failed;
                }
            }
        }

        self.executor
            .tick(ctx, agent, world, &mut self.blackboard, &self.facts);
        RoleStatus::Running
    }

    fn replan(&mut self, ctx: &TickContext, reason: ReplanReason) {
        self.executor.request_replan(reason);
        self.note_replan(ctx, reason);
    }

    /// Records a replan the role loop triggered itself, so it is not handled twice.
    fn note_replan(&mut self, ctx: &TickContext, reason: ReplanReason) {
        let _ = self.executor.take_replan_request();
        self.last_replan = Some(reason);
        trace_emit(
            &mut self.blackboard,
            TraceEvent::new(ctx.tick, "goap.exec.replan").with_label(reason.as_str()),
        );
    }

    fn can_replan_now(&self, tick: u64) -> bool {
        let min = self.config.min_replan_interval_ticks as u64;
        match self.last_planned_tick {
            None => true,
            Some(last) => tick.saturating_sub(last) >= min,
        }
    }

    fn budget_exhausted(&self) -> bool {
        match self.config.max_plan_starts_per_goal {
            None => false,
            Some(max) => self.starts_for_goal >= max,
        }
    }

    fn get_or_plan(&mut self, ctx: &TickContext, goal: &Goal) -> Result<Plan<F::Spec>, PlanError> {
        let capabilities = Capabilities::detect(&self.blackboard);
        if let Some(entry) = self.cache.as_ref() {
            let hit = entry.goal == *goal
                && entry.facts == self.facts
                && entry.capabilities == capabilities;
            if hit {
                return entry.plan.clone();
            }
        }

        self.plan_calls = self.plan_calls.saturating_add(1);
        trace_emit(
            &mut self.blackboard,
            TraceEvent::new(ctx.tick, "goap.plan.call")
                .with_label(goal.name.clone())
                .with_a(self.facts.len() as u64),
        );
        let plan = self
            .planner
            .plan_with_capabilities(&self.facts, goal, &capabilities);
        trace_emit(
            &mut self.blackboard,
            TraceEvent::new(ctx.tick, "goap.plan.result")
                .with_label(goal.name.clone())
                .with_a(plan.as_ref().map(|p| p.len()).unwrap_or(0) as u64)
                .with_b(plan.as_ref().map(|p| p.stats.expansions).unwrap_or(0) as u64),
        );
        self.cache = Some(PlanCacheEntry {
            goal: goal.clone(),
            facts: self.facts.clone(),
            capabilities,
            plan: plan.clone(),
        });
        plan
    }
}
