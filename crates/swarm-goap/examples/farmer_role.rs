//! Two farmers plant their fields. Farmer 1 can ask the village for a hoe over chat; farmer 2
//! has to craft one. Run with `RUST_LOG=swarm_goap=debug` to see planning decisions.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use swarm_core::{
    negotiation, ActionStatus, ActionTask, Blackboard, Capability, DeliveryStatus, GameWorld,
    Negotiation, TaskError, TaskFactory, TickContext, WorldState, NEGOTIATION,
};
use swarm_goap::{
    Condition, Effect, GoapAction, GoapConfig, GoapPlanner, Goal, RoleLoop, RoleStatus, Swarm,
};
use swarm_tools::{TraceLog, TraceSink, TracingSink, TRACE_LOG, TRACE_SINK};

#[derive(Parser)]
#[command(name = "farmer_role")]
#[command(about = "Run GOAP farmers until their fields are planted")]
struct Cli {
    /// GOAP config (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Give up after this many ticks
    #[arg(long, default_value_t = 60)]
    ticks: u64,

    /// Disable village chat for every farmer
    #[arg(long)]
    solo: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Default)]
struct Farmer {
    seeds: u32,
    hoe: bool,
    tilled: bool,
    planted: bool,
}

#[derive(Default)]
struct Homestead {
    farmers: BTreeMap<u32, Farmer>,
}

impl Homestead {
    fn farmer(&mut self, agent: u32) -> Result<&mut Farmer, TaskError> {
        self.farmers
            .get_mut(&agent)
            .ok_or_else(|| TaskError::interaction(format!("farmer {agent} is not on the map")))
    }
}

impl GameWorld for Homestead {
    type Agent = u32;
}

/// Neighbours answer a need after a couple of polls and deliver a little later.
#[derive(Default)]
struct VillageChat {
    open: BTreeMap<String, (u32, u32)>,
}

impl Negotiation for VillageChat {
    fn broadcast_need(&mut self, item: &str, count: u32) -> Result<(), TaskError> {
        tracing::info!(item, count, "asking the village");
        self.open.insert(item.to_string(), (count, 0));
        Ok(())
    }

    fn poll_delivery(&mut self, item: &str) -> DeliveryStatus {
        let Some((count, polls)) = self.open.get_mut(item) else {
            return DeliveryStatus::Declined;
        };
        *polls += 1;
        match *polls {
            0..=1 => DeliveryStatus::Pending,
            2..=3 => DeliveryStatus::Promised,
            _ => {
                let delivered = *count;
                self.open.remove(item);
                DeliveryStatus::Delivered(delivered)
            }
        }
    }

    fn withdraw_need(&mut self, item: &str) {
        self.open.remove(item);
    }
}

#[derive(Debug, Clone, Copy)]
enum Chore {
    GatherSeeds,
    CraftHoe,
    RequestHoe,
    Till,
    Plant,
}

struct ChoreTask {
    chore: Chore,
    ticks: u32,
    asked: bool,
}

impl ChoreTask {
    /// Ticks of work before the chore completes.
    fn duration(&self) -> u32 {
        match self.chore {
            Chore::GatherSeeds => 2,
            Chore::CraftHoe => 5,
            Chore::Till => 3,
            Chore::Plant | Chore::RequestHoe => 1,
        }
    }

    fn request_hoe(
        &mut self,
        farmer: &mut Farmer,
        blackboard: &mut Blackboard,
    ) -> Result<ActionStatus, TaskError> {
        let chat = negotiation(blackboard)?;
        if !self.asked {
            chat.broadcast_need("hoe", 1)?;
            self.asked = true;
            return Ok(ActionStatus::Running);
        }
        match chat.poll_delivery("hoe") {
            DeliveryStatus::Pending | DeliveryStatus::Promised => Ok(ActionStatus::Running),
            DeliveryStatus::Delivered(_) => {
                farmer.hoe = true;
                Ok(ActionStatus::Success)
            }
            DeliveryStatus::Declined => Ok(ActionStatus::Failure),
        }
    }
}

impl ActionTask<Homestead> for ChoreTask {
    fn poll(
        &mut self,
        _ctx: &TickContext,
        agent: u32,
        world: &mut Homestead,
        blackboard: &mut Blackboard,
        _facts: &WorldState,
    ) -> Result<ActionStatus, TaskError> {
        let farmer = world.farmer(agent)?;
        if let Chore::RequestHoe = self.chore {
            return self.request_hoe(farmer, blackboard);
        }

        self.ticks += 1;
        if self.ticks < self.duration() {
            return Ok(ActionStatus::Running);
        }

        match self.chore {
            Chore::GatherSeeds => farmer.seeds += 1,
            Chore::CraftHoe => farmer.hoe = true,
            Chore::Till if farmer.hoe => farmer.tilled = true,
            Chore::Till => return Err(TaskError::interaction("no hoe in hand")),
            Chore::Plant if farmer.tilled && farmer.seeds > 0 => {
                farmer.seeds -= 1;
                farmer.planted = true;
            }
            Chore::Plant => return Ok(ActionStatus::Failure),
            Chore::RequestHoe => {}
        }
        Ok(ActionStatus::Success)
    }
}

#[derive(Debug, Clone, Copy)]
struct FarmTasks;

impl TaskFactory<Homestead> for FarmTasks {
    type Spec = Chore;

    fn build(
        &self,
        spec: &Chore,
        _ctx: &TickContext,
        _agent: u32,
        _world: &Homestead,
        _blackboard: &Blackboard,
    ) -> Box<dyn ActionTask<Homestead>> {
        Box::new(ChoreTask {
            chore: *spec,
            ticks: 0,
            asked: false,
        })
    }
}

fn farmer_actions() -> Vec<GoapAction<Chore>> {
    vec![
        GoapAction::new("gather_seeds", Chore::GatherSeeds).effect(Effect::add("inv.seeds", 1.0)),
        GoapAction::new("craft_hoe", Chore::CraftHoe)
            .effect(Effect::set("has.hoe", true))
            .with_cost(5.0),
        GoapAction::new("request_hoe", Chore::RequestHoe)
            .requiring(Capability::Negotiation)
            .effect(Effect::set("has.hoe", true))
            .with_cost(2.0),
        GoapAction::new("till", Chore::Till)
            .when(Condition::is_true("has.hoe"))
            .effect(Effect::set("field.tilled", true)),
        GoapAction::new("plant", Chore::Plant)
            .when(Condition::is_true("field.tilled"))
            .when(Condition::at_least("inv.seeds", 1.0))
            .effect(Effect::add("inv.seeds", -1.0))
            .effect(Effect::set("field.planted", true)),
    ]
}

fn perceive(
    _ctx: &TickContext,
    agent: u32,
    world: &Homestead,
    _blackboard: &Blackboard,
    facts: &mut WorldState,
) {
    let Some(farmer) = world.farmers.get(&agent) else {
        facts.clear();
        return;
    };
    facts.set("inv.seeds", farmer.seeds);
    facts.set("has.hoe", farmer.hoe);
    facts.set("field.tilled", farmer.tilled);
    facts.set("field.planted", farmer.planted);
}

fn choose_goal(
    _ctx: &TickContext,
    _agent: u32,
    _world: &Homestead,
    _blackboard: &Blackboard,
    facts: &WorldState,
) -> Option<Goal> {
    if facts.bool_or("field.planted", false) {
        return None;
    }
    Some(Goal::new("plant_field").with(Condition::is_true("field.planted")))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    fmt().with_env_filter(filter).with_target(false).init();

    let config = match &cli.config {
        Some(path) => GoapConfig::load(path)
            .with_context(|| format!("loading GOAP config from {}", path.display()))?,
        None => GoapConfig::default(),
    };

    let mut world = Homestead::default();
    let mut swarm = Swarm::new();
    for agent in [2u32, 1] {
        world.farmers.insert(agent, Farmer::default());

        let mut blackboard = Blackboard::new();
        blackboard.set(TRACE_LOG, TraceLog::default());
        blackboard.set(
            TRACE_SINK,
            Box::new(TracingSink {
                agent: agent as u64,
            }) as Box<dyn TraceSink>,
        );
        if agent == 1 && !cli.solo {
            blackboard.set(
                NEGOTIATION,
                Box::new(VillageChat::default()) as Box<dyn Negotiation>,
            );
        }

        let role = RoleLoop::new(
            agent,
            GoapPlanner::new(farmer_actions()),
            FarmTasks,
            perceive,
            choose_goal,
        )
        .with_config(&config)
        .with_blackboard(blackboard);
        swarm.add(role);
    }

    let mut ctx = TickContext::new(0, 0.05);
    let mut finished_at = None;
    for _ in 0..cli.ticks {
        ctx = ctx.next();
        swarm.tick(&ctx, &mut world);
        if swarm.statuses().all(|(_, status)| status == RoleStatus::Idle) {
            finished_at = Some(ctx.tick);
            break;
        }
    }

    match finished_at {
        Some(tick) => tracing::info!(tick, "all fields planted"),
        None => tracing::warn!(ticks = cli.ticks, "gave up before every field was planted"),
    }

    for role in swarm.roles() {
        let events = role
            .blackboard()
            .get(TRACE_LOG)
            .map(|log| log.events.len())
            .unwrap_or(0);
        let stats = role.executor().stats();
        tracing::info!(
            agent = role.agent(),
            status = ?role.status(),
            plan_calls = role.plan_calls(),
            plan_starts = role.plan_starts(),
            actions = stats.actions_executed,
            failed = stats.actions_failed,
            trace_events = events,
            "farmer summary"
        );
    }

    Ok(())
}
