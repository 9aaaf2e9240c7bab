use std::borrow::Cow;

use swarm_core::WorldState;

#[derive(Debug, Clone, PartialEq)]
pub struct PlanStep<S> {
    pub name: Cow<'static, str>,
    pub spec: S,
    /// Cost charged for this step during search (after clamping).
    pub cost: f64,
}

impl<S> PlanStep<S> {
    pub fn new(name: impl Into<Cow<'static, str>>, spec: S) -> Self {
        Self {
            name: name.into(),
            spec,
            cost: 1.0,
        }
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }
}

/// Counters from the search that produced a plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub expansions: usize,
    pub generated: usize,
    /// Nodes not expanded because they sat at `max_depth`.
    pub depth_pruned: usize,
}

/// Ordered action sequence plus the state it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan<S> {
    pub goal: Cow<'static, str>,
    pub steps: Vec<PlanStep<S>>,
    /// Snapshot the search started from.
    pub origin: WorldState,
    /// Simulated state after the last step, assuming every effect happened.
    pub expected: WorldState,
    pub total_cost: f64,
    /// True when the search ran out of budget and this is the closest it got.
    pub partial: bool,
    pub stats: SearchStats,
}

impl<S> Plan<S> {
    /// A hand-built plan; `expected` is left equal to `origin`.
    pub fn from_steps(origin: WorldState, steps: Vec<PlanStep<S>>) -> Self {
        let total_cost = steps.iter().map(|s| s.cost).sum();
        Self {
            goal: Cow::Borrowed(""),
            steps,
            expected: origin.clone(),
            origin,
            total_cost,
            partial: false,
            stats: SearchStats::default(),
        }
    }

    pub fn empty(origin: WorldState) -> Self {
        Self::from_steps(origin, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| &*s.name).collect()
    }

    pub fn specs(&self) -> impl Iterator<Item = &S> {
        self.steps.iter().map(|s| &s.spec)
    }
}
