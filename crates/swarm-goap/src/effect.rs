use std::borrow::Cow;
use std::fmt;

use swarm_core::{FactValue, WorldState};

/// Planning-time estimate of what an action does to the facts.
///
/// Effects are only ever applied to a simulated copy of the state. They are optimistic: the real
/// outcome of executing the action is never checked against them.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Set {
        key: Cow<'static, str>,
        value: FactValue,
    },
    Add {
        key: Cow<'static, str>,
        delta: f64,
    },
}

impl Effect {
    pub fn set(key: impl Into<Cow<'static, str>>, value: impl Into<FactValue>) -> Self {
        Effect::Set {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn add(key: impl Into<Cow<'static, str>>, delta: f64) -> Self {
        Effect::Add {
            key: key.into(),
            delta,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Effect::Set { key, .. } | Effect::Add { key, .. } => key,
        }
    }

    /// `Add` on a missing key starts from zero; on a non-numeric key it does nothing.
    pub fn apply(&self, state: &mut WorldState) {
        match self {
            Effect::Set { key, value } => {
                state.set(key.clone(), value.clone());
            }
            Effect::Add { key, delta } => match state.get(key) {
                None => {
                    state.set(key.clone(), *delta);
                }
                Some(FactValue::Number(current)) => {
                    let next = current + delta;
                    state.set(key.clone(), next);
                }
                Some(other) => {
                    tracing::debug!(
                        key = %key,
                        kind = %other.kind(),
                        "ignoring increment of non-numeric fact"
                    );
                }
            },
        }
    }
}

pub fn apply_all(effects: &[Effect], state: &mut WorldState) {
    for effect in effects {
        effect.apply(state);
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Set { key, value } => write!(f, "{key} = {value}"),
            Effect::Add { key, delta } if *delta >= 0.0 => write!(f, "{key} += {delta}"),
            Effect::Add { key, delta } => write!(f, "{key} -= {}", -delta),
        }
    }
}
