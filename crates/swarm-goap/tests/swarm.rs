use swarm_core::{
    ActionStatus, ActionTask, Blackboard, GameWorld, TaskError, TaskFactory, TickContext,
    WorldState,
};
use swarm_goap::{Condition, Effect, GoapAction, GoapPlanner, Goal, RoleLoop, RoleStatus, Swarm};

#[derive(Default)]
struct Village {
    turns: Vec<u32>,
    wood: u32,
}

impl GameWorld for Village {
    type Agent = u32;
}

struct ChopOnce;

impl ActionTask<Village> for ChopOnce {
    fn poll(
        &mut self,
        _ctx: &TickContext,
        agent: u32,
        village: &mut Village,
        _blackboard: &mut Blackboard,
        _facts: &WorldState,
    ) -> Result<ActionStatus, TaskError> {
        village.turns.push(agent);
        village.wood += 1;
        Ok(ActionStatus::Running)
    }
}

#[derive(Debug, Clone, Copy)]
struct Woodcutters;

impl TaskFactory<Village> for Woodcutters {
    type Spec = ();

    fn build(
        &self,
        _spec: &(),
        _ctx: &TickContext,
        _agent: u32,
        _village: &Village,
        _blackboard: &Blackboard,
    ) -> Box<dyn ActionTask<Village>> {
        Box::new(ChopOnce)
    }
}

fn woodcutter(agent: u32) -> RoleLoop<Village, Woodcutters> {
    let chop = GoapAction::new("chop", ()).effect(Effect::set("wood.cut", true));
    RoleLoop::new(
        agent,
        GoapPlanner::new(vec![chop]),
        Woodcutters,
        |_ctx, _agent, _village: &Village, _bb, _facts: &mut WorldState| {},
        |_ctx, _agent, _village: &Village, _bb, _facts| {
            Some(Goal::new("cut").with(Condition::is_true("wood.cut")))
        },
    )
}

#[test]
fn agents_tick_in_stable_id_order() {
    let mut swarm = Swarm::new()
        .with_role(woodcutter(30))
        .with_role(woodcutter(10))
        .with_role(woodcutter(20));
    let mut village = Village::default();

    swarm.tick(&TickContext::new(1, 0.05), &mut village);
    swarm.tick(&TickContext::new(2, 0.05), &mut village);

    assert_eq!(village.turns, vec![10, 20, 30, 10, 20, 30]);
    assert_eq!(village.wood, 6);
    assert!(swarm
        .statuses()
        .all(|(_, status)| status == RoleStatus::Running));
}

#[test]
fn roles_are_replaced_and_removed_by_agent() {
    let mut swarm = Swarm::new();
    assert!(swarm.is_empty());

    assert!(swarm.add(woodcutter(2)).is_none());
    assert!(swarm.add(woodcutter(1)).is_none());
    let replaced = swarm.add(woodcutter(2)).expect("replaced");
    assert_eq!(replaced.agent(), 2);
    assert_eq!(swarm.len(), 2);

    let agents: Vec<u32> = swarm.roles().map(|r| r.agent()).collect();
    assert_eq!(agents, vec![1, 2]);

    assert!(swarm.remove(1).is_some());
    assert!(swarm.remove(1).is_none());
    assert!(swarm.role(2).is_some());
    assert!(swarm.role_mut(2).is_some());
    assert!(swarm.role(1).is_none());
}
