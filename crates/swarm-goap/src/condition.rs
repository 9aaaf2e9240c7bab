use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use swarm_core::{FactValue, WorldState};

/// Comparator applied to a single fact.
///
/// Numeric comparators read a missing key as `0`; `IsTrue`/`IsFalse` read a missing key as
/// `false`. `Eq`/`Ne` compare the stored value exactly and treat a missing key as "no value".
#[derive(Debug, Clone, PartialEq)]
pub enum Compare {
    Eq(FactValue),
    Ne(FactValue),
    Gt(f64),
    Ge(f64),
    Lt(f64),
    Le(f64),
    IsTrue,
    IsFalse,
    Exists,
    Missing,
}

impl Compare {
    pub fn holds(&self, value: Option<&FactValue>) -> bool {
        let number = || value.and_then(FactValue::as_number).unwrap_or(0.0);
        let flag = || value.and_then(FactValue::as_bool).unwrap_or(false);
        match self {
            Compare::Eq(expected) => value == Some(expected),
            Compare::Ne(expected) => value != Some(expected),
            Compare::Gt(bound) => number() > *bound,
            Compare::Ge(bound) => number() >= *bound,
            Compare::Lt(bound) => number() < *bound,
            Compare::Le(bound) => number() <= *bound,
            Compare::IsTrue => flag(),
            Compare::IsFalse => !flag(),
            Compare::Exists => value.is_some(),
            Compare::Missing => value.is_none(),
        }
    }
}

impl fmt::Display for Compare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compare::Eq(v) => write!(f, "== {v}"),
            Compare::Ne(v) => write!(f, "!= {v}"),
            Compare::Gt(v) => write!(f, "> {v}"),
            Compare::Ge(v) => write!(f, ">= {v}"),
            Compare::Lt(v) => write!(f, "< {v}"),
            Compare::Le(v) => write!(f, "<= {v}"),
            Compare::IsTrue => f.write_str("is true"),
            Compare::IsFalse => f.write_str("is false"),
            Compare::Exists => f.write_str("exists"),
            Compare::Missing => f.write_str("is missing"),
        }
    }
}

/// Declarative predicate over one fact key.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub key: Cow<'static, str>,
    pub compare: Compare,
    pub description: Cow<'static, str>,
}

impl Condition {
    pub fn new(key: impl Into<Cow<'static, str>>, compare: Compare) -> Self {
        Self {
            key: key.into(),
            compare,
            description: Cow::Borrowed(""),
        }
    }

    pub fn describe(mut self, description: impl Into<Cow<'static, str>>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_true(key: impl Into<Cow<'static, str>>) -> Self {
        Self::new(key, Compare::IsTrue)
    }

    pub fn is_false(key: impl Into<Cow<'static, str>>) -> Self {
        Self::new(key, Compare::IsFalse)
    }

    pub fn equals(key: impl Into<Cow<'static, str>>, value: impl Into<FactValue>) -> Self {
        Self::new(key, Compare::Eq(value.into()))
    }

    pub fn at_least(key: impl Into<Cow<'static, str>>, amount: f64) -> Self {
        Self::new(key, Compare::Ge(amount))
    }

    pub fn more_than(key: impl Into<Cow<'static, str>>, amount: f64) -> Self {
        Self::new(key, Compare::Gt(amount))
    }

    pub fn at_most(key: impl Into<Cow<'static, str>>, amount: f64) -> Self {
        Self::new(key, Compare::Le(amount))
    }

    pub fn less_than(key: impl Into<Cow<'static, str>>, amount: f64) -> Self {
        Self::new(key, Compare::Lt(amount))
    }

    pub fn exists(key: impl Into<Cow<'static, str>>) -> Self {
        Self::new(key, Compare::Exists)
    }

    pub fn holds(&self, state: &WorldState) -> bool {
        self.compare.holds(state.get(&self.key))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.description.is_empty() {
            write!(f, "{} {}", self.key, self.compare)
        } else {
            write!(f, "{} {} ({})", self.key, self.compare, self.description)
        }
    }
}

pub type Evaluator = Arc<dyn Fn(&WorldState) -> bool + Send + Sync>;

/// Eligibility rule of an action.
///
/// `Custom` replaces the declarative list entirely (it is how disjunctions such as "has shovel
/// or has pickaxe" are expressed); its `documented` conditions are never evaluated.
#[derive(Clone)]
pub enum Precondition {
    Declarative(Vec<Condition>),
    Custom {
        evaluator: Evaluator,
        documented: Vec<Condition>,
    },
}

impl Precondition {
    pub fn always() -> Self {
        Precondition::Declarative(Vec::new())
    }

    pub fn all(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Precondition::Declarative(conditions.into_iter().collect())
    }

    pub fn custom(evaluator: impl Fn(&WorldState) -> bool + Send + Sync + 'static) -> Self {
        Precondition::Custom {
            evaluator: Arc::new(evaluator),
            documented: Vec::new(),
        }
    }

    /// Eligible when at least one of the listed conditions holds.
    pub fn any(conditions: impl IntoIterator<Item = Condition>) -> Self {
        let documented: Vec<Condition> = conditions.into_iter().collect();
        let options = documented.clone();
        Precondition::Custom {
            evaluator: Arc::new(move |state| options.iter().any(|c| c.holds(state))),
            documented,
        }
    }

    /// Attach documentation entries to a custom evaluator. No effect on declarative lists.
    pub fn documented(mut self, conditions: impl IntoIterator<Item = Condition>) -> Self {
        if let Precondition::Custom { documented, .. } = &mut self {
            documented.extend(conditions);
        }
        self
    }

    pub fn is_satisfied(&self, state: &WorldState) -> bool {
        match self {
            Precondition::Declarative(conditions) => conditions.iter().all(|c| c.holds(state)),
            Precondition::Custom { evaluator, .. } => evaluator(state),
        }
    }

    /// The declarative entries, whether enforced or documentation only.
    pub fn conditions(&self) -> &[Condition] {
        match self {
            Precondition::Declarative(conditions) => conditions,
            Precondition::Custom { documented, .. } => documented,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Precondition::Custom { .. })
    }
}

impl Default for Precondition {
    fn default() -> Self {
        Self::always()
    }
}

impl fmt::Debug for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precondition::Declarative(conditions) => {
                f.debug_tuple("Declarative").field(conditions).finish()
            }
            Precondition::Custom { documented, .. } => f
                .debug_struct("Custom")
                .field("documented", documented)
                .finish_non_exhaustive(),
        }
    }
}
