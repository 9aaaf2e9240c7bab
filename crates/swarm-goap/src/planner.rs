use core::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

use swarm_core::{Capabilities, WorldState};

use crate::effect::apply_all;
use crate::{Goal, GoapAction, Plan, PlanError, PlanStep, PlannerConfig, SearchStats};

#[derive(Debug, Clone)]
struct SearchNode {
    state: WorldState,
    g: f64,
    depth: usize,
    parent: Option<usize>,
    action: usize,
    step_cost: f64,
    unmet: usize,
}

#[derive(Debug, Clone, Copy)]
struct OpenNode {
    f: f64,
    g: f64,
    tie: u64,
    node: usize,
}

impl OpenNode {
    fn priority(&self, other: &Self) -> Ordering {
        self.f
            .total_cmp(&other.f)
            .then_with(|| self.g.total_cmp(&other.g))
            .then_with(|| self.tie.cmp(&other.tie))
    }
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.priority(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap behave like a min-heap.
        other.priority(self)
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Bounded best-first GOAP search over fact states.
///
/// Nodes are expanded lowest accumulated cost first (plus an optional weighted count of unmet
/// goal conditions); equal priorities fall back to discovery order, so identical inputs always
/// produce the identical plan.
#[derive(Debug, Clone)]
pub struct GoapPlanner<S> {
    actions: Vec<GoapAction<S>>,
    config: PlannerConfig,
    capabilities: Capabilities,
}

impl<S> GoapPlanner<S>
where
    S: Clone + 'static,
{
    pub fn new(actions: Vec<GoapAction<S>>) -> Self {
        Self {
            actions,
            config: PlannerConfig::default(),
            capabilities: Capabilities::all(),
        }
    }

    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    /// Capabilities assumed present when [`GoapPlanner::plan`] is called. Actions requiring
    /// anything else are never planned.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn actions(&self) -> &[GoapAction<S>] {
        &self.actions
    }

    pub fn action(&self, name: &str) -> Option<&GoapAction<S>> {
        self.actions.iter().find(|a| a.name == name)
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn plan(&self, start: &WorldState, goal: &Goal) -> Result<Plan<S>, PlanError> {
        self.plan_with_capabilities(start, goal, &self.capabilities)
    }

    pub fn plan_with_capabilities(
        &self,
        start: &WorldState,
        goal: &Goal,
        capabilities: &Capabilities,
    ) -> Result<Plan<S>, PlanError> {
        let mut stats = SearchStats::default();

        if goal.is_satisfied(start) {
            return Ok(Plan {
                goal: goal.name.clone(),
                steps: Vec::new(),
                origin: start.clone(),
                expected: start.clone(),
                total_cost: 0.0,
                partial: false,
                stats,
            });
        }

        let weight = self.config.heuristic_weight.max(0.0);
        let f = |g: f64, unmet: usize| g + weight * unmet as f64;

        let mut nodes: Vec<SearchNode> = vec![SearchNode {
            state: start.clone(),
            g: 0.0,
            depth: 0,
            parent: None,
            action: usize::MAX,
            step_cost: 0.0,
            unmet: goal.unmet(start),
        }];
        let mut best_g: BTreeMap<WorldState, f64> = BTreeMap::new();
        best_g.insert(start.clone(), 0.0);

        let mut open = BinaryHeap::<OpenNode>::new();
        let mut tie: u64 = 0;
        open.push(OpenNode {
            f: f(0.0, nodes[0].unmet),
            g: 0.0,
            tie,
            node: 0,
        });
        tie += 1;

        // Closest node to the goal seen so far: fewest unmet conditions, then cheapest.
        let mut closest: usize = 0;
        let mut budget_hit = false;

        while let Some(entry) = open.pop() {
            let current = entry.node;

            let best = best_g
                .get(&nodes[current].state)
                .copied()
                .unwrap_or(f64::INFINITY);
            if nodes[current].g > best {
                continue; // stale heap entry
            }

            if goal.is_satisfied(&nodes[current].state) {
                let plan = self.reconstruct(goal, start, &nodes, current, false, stats);
                tracing::debug!(
                    goal = %goal.name,
                    steps = plan.len(),
                    cost = plan.total_cost,
                    expansions = stats.expansions,
                    "goap plan found"
                );
                return Ok(plan);
            }

            if stats.expansions >= self.config.max_expansions {
                budget_hit = true;
                break;
            }
            stats.expansions += 1;

            if nodes[current].depth >= self.config.max_depth {
                stats.depth_pruned += 1;
                continue;
            }

            let state = nodes[current].state.clone();
            let g = nodes[current].g;
            let depth = nodes[current].depth;

            for (action_idx, action) in self.actions.iter().enumerate() {
                if !capabilities.satisfies(&action.requires) {
                    continue;
                }
                if !action.is_eligible(&state) {
                    continue;
                }
                let Some(cost) = self.clamp_cost(action, action.cost_in(&state)) else {
                    continue;
                };

                let mut next = state.clone();
                apply_all(&action.effects, &mut next);
                if next == state {
                    continue;
                }

                let next_g = g + cost;
                let prev_best = best_g.get(&next).copied().unwrap_or(f64::INFINITY);
                if next_g >= prev_best {
                    continue;
                }

                let unmet = goal.unmet(&next);
                best_g.insert(next.clone(), next_g);
                nodes.push(SearchNode {
                    state: next,
                    g: next_g,
                    depth: depth + 1,
                    parent: Some(current),
                    action: action_idx,
                    step_cost: cost,
                    unmet,
                });
                stats.generated += 1;

                let idx = nodes.len() - 1;
                if is_closer(&nodes[idx], &nodes[closest]) {
                    closest = idx;
                }

                open.push(OpenNode {
                    f: f(next_g, unmet),
                    g: next_g,
                    tie,
                    node: idx,
                });
                tie += 1;
            }
        }

        let bounded = budget_hit || stats.depth_pruned > 0;
        if bounded && self.config.allow_partial && closest != 0 {
            let plan = self.reconstruct(goal, start, &nodes, closest, true, stats);
            tracing::debug!(
                goal = %goal.name,
                steps = plan.len(),
                unmet = nodes[closest].unmet,
                expansions = stats.expansions,
                "goap search bounded, returning partial plan"
            );
            return Ok(plan);
        }

        let goal_name = goal.name.to_string();
        if budget_hit {
            tracing::warn!(
                goal = %goal_name,
                expansions = stats.expansions,
                "goap search budget exhausted"
            );
            Err(PlanError::BudgetExhausted {
                goal: goal_name,
                expansions: stats.expansions,
            })
        } else {
            tracing::debug!(
                goal = %goal_name,
                expansions = stats.expansions,
                "goap goal unreachable"
            );
            Err(PlanError::Unreachable {
                goal: goal_name,
                expansions: stats.expansions,
            })
        }
    }

    /// Replays `plan` from `start` the way the search simulated it: every step must be eligible
    /// in the state produced by the steps before it. Returns the final simulated state.
    pub fn simulate(&self, start: &WorldState, plan: &Plan<S>) -> Result<WorldState, PlanError> {
        let mut state = start.clone();
        for (index, step) in plan.steps.iter().enumerate() {
            let action = self
                .action(&step.name)
                .filter(|a| a.is_eligible(&state))
                .ok_or_else(|| PlanError::InvalidStep {
                    index,
                    action: step.name.to_string(),
                })?;
            apply_all(&action.effects, &mut state);
        }
        Ok(state)
    }

    fn clamp_cost(&self, action: &GoapAction<S>, raw: f64) -> Option<f64> {
        let floor = self.config.min_action_cost.max(f64::MIN_POSITIVE);
        if raw.is_nan() {
            tracing::warn!(action = %action.name, "action cost is NaN, using the minimum cost");
            return Some(floor);
        }
        if raw == f64::INFINITY {
            return None;
        }
        Some(raw.max(floor))
    }

    fn reconstruct(
        &self,
        goal: &Goal,
        start: &WorldState,
        nodes: &[SearchNode],
        last: usize,
        partial: bool,
        stats: SearchStats,
    ) -> Plan<S> {
        let mut steps: Vec<PlanStep<S>> = Vec::new();
        let mut current = last;
        while let Some(parent) = nodes[current].parent {
            let node = &nodes[current];
            let action = &self.actions[node.action];
            steps.push(PlanStep {
                name: action.name.clone(),
                spec: action.spec.clone(),
                cost: node.step_cost,
            });
            current = parent;
        }
        steps.reverse();

        Plan {
            goal: goal.name.clone(),
            steps,
            origin: start.clone(),
            expected: nodes[last].state.clone(),
            total_cost: nodes[last].g,
            partial,
            stats,
        }
    }
}

fn is_closer(candidate: &SearchNode, best: &SearchNode) -> bool {
    candidate
        .unmet
        .cmp(&best.unmet)
        .then_with(|| candidate.g.total_cmp(&best.g))
        == Ordering::Less
}
