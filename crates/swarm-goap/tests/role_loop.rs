use std::ops::RangeInclusive;

use swarm_core::{
    ActionStatus, ActionTask, Blackboard, Capability, DeliveryStatus, GameWorld, Negotiation,
    TaskError, TaskFactory, TickContext, WorldState, NEGOTIATION,
};
use swarm_goap::effect::apply_all;
use swarm_goap::{
    Condition, Effect, ExecutorConfig, GoapAction, GoapConfig, GoapPlanner, Goal, PlanError,
    ReplanReason, RoleConfig, RoleLoop, RoleStatus,
};
use swarm_tools::{TraceLog, TRACE_LOG};

#[derive(Default)]
struct Farm {
    facts: WorldState,
    goal: Option<Goal>,
    attempts: u32,
}

impl GameWorld for Farm {
    type Agent = u64;
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    /// Applies the modelled effects and succeeds.
    Honest,
    /// Reports success without changing anything.
    Lying,
    /// Like `Lying` until the given attempt, then `Honest`.
    HonestFrom(u32),
    Fail,
    /// Never finishes.
    Stall,
}

struct ChoreTask {
    effects: Vec<Effect>,
    mode: Mode,
}

impl ActionTask<Farm> for ChoreTask {
    fn poll(
        &mut self,
        _ctx: &TickContext,
        _agent: u64,
        farm: &mut Farm,
        _blackboard: &mut Blackboard,
        _facts: &WorldState,
    ) -> Result<ActionStatus, TaskError> {
        farm.attempts += 1;
        let honest = match self.mode {
            Mode::Honest => true,
            Mode::Lying => false,
            Mode::HonestFrom(n) => farm.attempts >= n,
            Mode::Fail => return Ok(ActionStatus::Failure),
            Mode::Stall => return Ok(ActionStatus::Running),
        };
        if honest {
            apply_all(&self.effects, &mut farm.facts);
        }
        Ok(ActionStatus::Success)
    }
}

#[derive(Debug, Clone, Copy)]
struct Chores(Mode);

impl TaskFactory<Farm> for Chores {
    type Spec = Vec<Effect>;

    fn build(
        &self,
        spec: &Self::Spec,
        _ctx: &TickContext,
        _agent: u64,
        _farm: &Farm,
        _blackboard: &Blackboard,
    ) -> Box<dyn ActionTask<Farm>> {
        Box::new(ChoreTask {
            effects: spec.clone(),
            mode: self.0,
        })
    }
}

struct Silent;

impl Negotiation for Silent {
    fn broadcast_need(&mut self, _item: &str, _count: u32) -> Result<(), TaskError> {
        Ok(())
    }

    fn poll_delivery(&mut self, _item: &str) -> DeliveryStatus {
        DeliveryStatus::Pending
    }

    fn withdraw_need(&mut self, _item: &str) {}
}

fn chore(name: &'static str, effects: Vec<Effect>) -> GoapAction<Vec<Effect>> {
    let mut action = GoapAction::new(name, effects.clone());
    action.effects = effects;
    action
}

fn farmer_actions() -> Vec<GoapAction<Vec<Effect>>> {
    vec![
        chore("craft_hoe", vec![Effect::set("has.hoe", true)]).with_cost(3.0),
        chore("request_hoe", vec![Effect::set("has.hoe", true)])
            .requiring(Capability::Negotiation),
        chore("till", vec![Effect::set("field.tilled", true)]).when(Condition::is_true("has.hoe")),
        chore(
            "plant",
            vec![Effect::add("inv.seeds", -1.0), Effect::set("field.planted", true)],
        )
        .when(Condition::is_true("field.tilled"))
        .when(Condition::at_least("inv.seeds", 1.0)),
    ]
}

fn farmer_role(actions: Vec<GoapAction<Vec<Effect>>>, mode: Mode) -> RoleLoop<Farm, Chores> {
    let mut blackboard = Blackboard::new();
    blackboard.set(TRACE_LOG, TraceLog::default());
    RoleLoop::new(
        1,
        GoapPlanner::new(actions),
        Chores(mode),
        |_ctx, _agent, farm: &Farm, _bb, facts: &mut WorldState| *facts = farm.facts.clone(),
        |_ctx, _agent, farm: &Farm, _bb, _facts| farm.goal.clone(),
    )
    .with_blackboard(blackboard)
}

fn run(
    role: &mut RoleLoop<Farm, Chores>,
    farm: &mut Farm,
    ticks: RangeInclusive<u64>,
) -> Vec<RoleStatus> {
    ticks
        .map(|tick| role.tick(&TickContext::new(tick, 0.05), farm))
        .collect()
}

fn trace_count(role: &RoleLoop<Farm, Chores>, tag: &str) -> usize {
    role.blackboard().get(TRACE_LOG).map(|log| log.count(tag)).unwrap_or(0)
}

fn goal(key: &'static str) -> Goal {
    Goal::new(key).with(Condition::is_true(key))
}

#[test]
fn role_plans_once_and_reaches_goal() {
    let mut farm = Farm {
        facts: WorldState::new().with("inv.seeds", 1),
        goal: Some(goal("field.planted")),
        ..Farm::default()
    };
    let mut role = farmer_role(farmer_actions(), Mode::Honest);

    let statuses = run(&mut role, &mut farm, 1..=4);

    assert_eq!(
        statuses,
        vec![
            RoleStatus::Running,
            RoleStatus::Running,
            RoleStatus::Running,
            RoleStatus::Satisfied
        ]
    );
    assert!(farm.facts.bool_or("field.planted", false));
    assert_eq!(farm.facts.number_or("inv.seeds", -1.0), 0.0);
    assert_eq!(role.plan_calls(), 1);
    assert_eq!(role.plan_starts(), 1);
    assert_eq!(role.executor().stats().actions_succeeded, 3);
    assert_eq!(role.last_replan(), Some(ReplanReason::GoalComplete));
    assert_eq!(trace_count(&role, "goap.done"), 1);

    assert_eq!(run(&mut role, &mut farm, 5..=5), vec![RoleStatus::Satisfied]);
    assert_eq!(role.executor().stats().replans_requested, 1);
}

#[test]
fn role_replans_when_plan_succeeds_but_goal_is_unmet() {
    let mut farm = Farm {
        goal: Some(goal("fence.built")),
        ..Farm::default()
    };
    let actions = vec![chore("build_fence", vec![Effect::set("fence.built", true)])];
    let mut role = farmer_role(actions, Mode::HonestFrom(2));

    run(&mut role, &mut farm, 1..=3);

    assert!(farm.facts.bool_or("fence.built", false));
    assert_eq!(farm.attempts, 2);
    assert_eq!(role.plan_calls(), 2);
    assert_eq!(role.status(), RoleStatus::Satisfied);
    assert_eq!(trace_count(&role, "goap.no_progress"), 1);
}

#[test]
fn no_progress_budget_stops_success_loop() {
    let mut farm = Farm {
        goal: Some(goal("fence.built")),
        ..Farm::default()
    };
    let actions = vec![chore("build_fence", vec![Effect::set("fence.built", true)])];
    let mut role = farmer_role(actions, Mode::Lying).with_role_config(RoleConfig {
        max_plan_starts_per_goal: Some(2),
        ..RoleConfig::default()
    });

    let statuses = run(&mut role, &mut farm, 1..=10);

    assert_eq!(farm.attempts, 2);
    assert_eq!(role.plan_calls(), 2);
    assert_eq!(role.plan_starts(), 2);
    assert!(statuses[2..].iter().all(|s| *s == RoleStatus::Failed));
    assert_eq!(trace_count(&role, "goap.budget_exhausted"), 8);
}

#[test]
fn failed_search_is_cached_until_facts_change() {
    let mut farm = Farm {
        goal: Some(goal("field.harvested")),
        ..Farm::default()
    };
    let mut role = farmer_role(farmer_actions(), Mode::Honest);

    let statuses = run(&mut role, &mut farm, 1..=3);
    assert_eq!(statuses, vec![RoleStatus::Failed; 3]);
    assert_eq!(role.plan_calls(), 1);
    assert!(matches!(role.last_error(), Some(PlanError::Unreachable { .. })));
    assert_eq!(trace_count(&role, "goap.plan.none"), 3);

    farm.facts.set("weather", "rain");
    run(&mut role, &mut farm, 4..=4);
    assert_eq!(role.plan_calls(), 2);
}

#[test]
fn restarts_are_throttled() {
    let mut farm = Farm {
        goal: Some(goal("ore.mined")),
        ..Farm::default()
    };
    let actions = vec![chore("mine", vec![Effect::set("ore.mined", true)])];
    let config = GoapConfig {
        executor: ExecutorConfig {
            max_failures: 1,
            ..ExecutorConfig::default()
        },
        role: RoleConfig {
            min_replan_interval_ticks: 3,
            ..RoleConfig::default()
        },
        ..GoapConfig::default()
    };
    let mut role = farmer_role(actions, Mode::Fail).with_config(&config);

    let statuses = run(&mut role, &mut farm, 1..=4);

    assert_eq!(
        statuses,
        vec![
            RoleStatus::Running,
            RoleStatus::Waiting,
            RoleStatus::Waiting,
            RoleStatus::Running
        ]
    );
    assert_eq!(farm.attempts, 2);
    assert_eq!(role.plan_calls(), 2);
    assert_eq!(role.last_replan(), Some(ReplanReason::ActionFailed));
}

#[test]
fn drift_restarts_the_plan() {
    let mut farm = Farm {
        goal: Some(goal("has.hoe")),
        ..Farm::default()
    };
    let mut role = farmer_role(farmer_actions(), Mode::Stall);
    run(&mut role, &mut farm, 1..=1);
    assert_eq!(role.plan_starts(), 1);

    for i in 0..6 {
        farm.facts.set(format!("noise.{i}"), true);
    }
    run(&mut role, &mut farm, 2..=2);

    assert_eq!(role.last_replan(), Some(ReplanReason::WorldChanged));
    assert_eq!(role.plan_starts(), 2);
    assert_eq!(role.plan_calls(), 2);
    assert_eq!(role.status(), RoleStatus::Running);
}

#[test]
fn drift_check_can_be_disabled() {
    let mut farm = Farm {
        goal: Some(goal("has.hoe")),
        ..Farm::default()
    };
    let mut role = farmer_role(farmer_actions(), Mode::Stall).with_role_config(RoleConfig {
        check_drift: false,
        ..RoleConfig::default()
    });
    run(&mut role, &mut farm, 1..=1);

    for i in 0..6 {
        farm.facts.set(format!("noise.{i}"), true);
    }
    run(&mut role, &mut farm, 2..=3);

    assert_eq!(role.last_replan(), None);
    assert_eq!(role.plan_starts(), 1);
}

#[test]
fn negotiation_channel_enables_requesting_tools() {
    let mut farm = Farm {
        goal: Some(goal("has.hoe")),
        ..Farm::default()
    };

    let mut solo = farmer_role(farmer_actions(), Mode::Stall);
    run(&mut solo, &mut farm, 1..=1);
    let plan = solo.cached_plan().expect("plan");
    assert_eq!(plan.names(), vec!["craft_hoe"]);

    let mut social = farmer_role(farmer_actions(), Mode::Stall);
    social.blackboard_mut().set(NEGOTIATION, Box::new(Silent) as Box<dyn Negotiation>);
    run(&mut social, &mut farm, 1..=1);
    let plan = social.cached_plan().expect("plan");
    assert_eq!(plan.names(), vec!["request_hoe"]);
}

#[test]
fn goal_changes_and_idle_roles_drop_the_plan() {
    let mut farm = Farm::default();
    let mut role = farmer_role(farmer_actions(), Mode::Stall);

    assert_eq!(run(&mut role, &mut farm, 1..=1), vec![RoleStatus::Idle]);
    assert_eq!(role.plan_calls(), 0);

    farm.goal = Some(goal("has.hoe"));
    assert_eq!(run(&mut role, &mut farm, 2..=2), vec![RoleStatus::Running]);
    assert_eq!(role.executor().current_action(), Some("craft_hoe"));

    farm.facts.set("has.hoe", true);
    farm.goal = Some(goal("field.tilled"));
    assert_eq!(run(&mut role, &mut farm, 3..=3), vec![RoleStatus::Running]);
    assert_eq!(role.goal().map(|g| &*g.name), Some("field.tilled"));
    assert_eq!(role.executor().current_action(), Some("till"));
    assert_eq!(trace_count(&role, "goap.invalidated"), 1);

    farm.goal = None;
    assert_eq!(run(&mut role, &mut farm, 4..=4), vec![RoleStatus::Idle]);
    assert!(role.executor().plan().is_none());
    assert!(role.goal().is_none());
}
