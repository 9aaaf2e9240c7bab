use std::borrow::Cow;

use swarm_core::WorldState;

use crate::{Compare, Condition};

/// Partial target state the planner must reach.
///
/// Goals are chosen outside the planner (utility scoring, role scripts) and handed in fresh on
/// every plan request.
#[derive(Debug, Clone, PartialEq)]
pub struct Goal {
    pub name: Cow<'static, str>,
    pub conditions: Vec<Condition>,
}

impl Goal {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            conditions: Vec::new(),
        }
    }

    pub fn with(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// One equality condition per fact of `target`.
    pub fn from_state(name: impl Into<Cow<'static, str>>, target: &WorldState) -> Self {
        let conditions = target
            .iter()
            .map(|(key, value)| Condition::new(key.to_string(), Compare::Eq(value.clone())))
            .collect();
        Self {
            name: name.into(),
            conditions,
        }
    }

    pub fn is_satisfied(&self, state: &WorldState) -> bool {
        self.conditions.iter().all(|c| c.holds(state))
    }

    /// Number of goal conditions that do not hold in `state`.
    pub fn unmet(&self, state: &WorldState) -> usize {
        self.conditions.iter().filter(|c| !c.holds(state)).count()
    }
}
