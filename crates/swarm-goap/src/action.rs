use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use swarm_core::{Capability, WorldState};

use crate::effect::apply_all;
use crate::{Condition, Effect, Precondition};

/// How much an action costs in a given state.
#[derive(Clone)]
pub enum Cost {
    Fixed(f64),
    /// Context-sensitive cost, e.g. cheaper when materials are already held.
    Dynamic(Arc<dyn Fn(&WorldState) -> f64 + Send + Sync>),
}

impl Cost {
    pub fn dynamic(f: impl Fn(&WorldState) -> f64 + Send + Sync + 'static) -> Self {
        Cost::Dynamic(Arc::new(f))
    }

    pub fn eval(&self, state: &WorldState) -> f64 {
        match self {
            Cost::Fixed(cost) => *cost,
            Cost::Dynamic(f) => f(state),
        }
    }
}

impl fmt::Debug for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cost::Fixed(cost) => f.debug_tuple("Fixed").field(cost).finish(),
            Cost::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Stateless description of something an agent can do.
///
/// The planner only reads the precondition, effects and cost. `spec` is opaque to it and is what
/// a [`swarm_core::TaskFactory`] turns into a runnable task when the step comes up.
#[derive(Debug, Clone)]
pub struct GoapAction<S> {
    pub name: Cow<'static, str>,
    pub precondition: Precondition,
    pub effects: Vec<Effect>,
    pub cost: Cost,
    pub requires: Vec<Capability>,
    pub spec: S,
}

impl<S> GoapAction<S> {
    pub fn new(name: impl Into<Cow<'static, str>>, spec: S) -> Self {
        Self {
            name: name.into(),
            precondition: Precondition::always(),
            effects: Vec::new(),
            cost: Cost::Fixed(1.0),
            requires: Vec::new(),
            spec,
        }
    }

    /// Adds a declarative condition. Ignored for enforcement if the precondition is custom.
    pub fn when(mut self, condition: Condition) -> Self {
        match &mut self.precondition {
            Precondition::Declarative(conditions) => conditions.push(condition),
            Precondition::Custom { documented, .. } => documented.push(condition),
        }
        self
    }

    pub fn with_precondition(mut self, precondition: Precondition) -> Self {
        self.precondition = precondition;
        self
    }

    pub fn effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Cost::Fixed(cost);
        self
    }

    pub fn with_dynamic_cost(
        mut self,
        f: impl Fn(&WorldState) -> f64 + Send + Sync + 'static,
    ) -> Self {
        self.cost = Cost::dynamic(f);
        self
    }

    pub fn requiring(mut self, capability: Capability) -> Self {
        if !self.requires.contains(&capability) {
            self.requires.push(capability);
        }
        self
    }

    pub fn is_eligible(&self, state: &WorldState) -> bool {
        self.precondition.is_satisfied(state)
    }

    pub fn cost_in(&self, state: &WorldState) -> f64 {
        self.cost.eval(state)
    }

    /// Simulated successor state; `state` itself is left untouched.
    pub fn simulate(&self, state: &WorldState) -> WorldState {
        let mut next = state.clone();
        apply_all(&self.effects, &mut next);
        next
    }
}
