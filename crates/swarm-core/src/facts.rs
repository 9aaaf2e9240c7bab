use core::cmp::Ordering;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use thiserror::Error;

/// The primitive kinds a fact value can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FactKind {
    Bool,
    Number,
    Text,
}

impl fmt::Display for FactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FactKind::Bool => "bool",
            FactKind::Number => "number",
            FactKind::Text => "text",
        })
    }
}

/// Value of a single fact.
///
/// Numbers compare with `f64::total_cmp`, which gives `FactValue` (and therefore
/// `WorldState`) a total order. The planner relies on that to key its closed set.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum FactValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FactValue {
    pub fn kind(&self) -> FactKind {
        match self {
            FactValue::Bool(_) => FactKind::Bool,
            FactValue::Number(_) => FactKind::Number,
            FactValue::Text(_) => FactKind::Text,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FactValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FactValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FactValue::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }
}

impl PartialEq for FactValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FactValue {}

impl PartialOrd for FactValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FactValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (FactValue::Bool(a), FactValue::Bool(b)) => a.cmp(b),
            (FactValue::Number(a), FactValue::Number(b)) => a.total_cmp(b),
            (FactValue::Text(a), FactValue::Text(b)) => a.cmp(b),
            _ => self.kind().cmp(&other.kind()),
        }
    }
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactValue::Bool(v) => write!(f, "{v}"),
            FactValue::Number(v) => write!(f, "{v}"),
            FactValue::Text(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<bool> for FactValue {
    fn from(value: bool) -> Self {
        FactValue::Bool(value)
    }
}

impl From<f64> for FactValue {
    fn from(value: f64) -> Self {
        FactValue::Number(value)
    }
}

impl From<i32> for FactValue {
    fn from(value: i32) -> Self {
        FactValue::Number(value as f64)
    }
}

impl From<u32> for FactValue {
    fn from(value: u32) -> Self {
        FactValue::Number(value as f64)
    }
}

impl From<&str> for FactValue {
    fn from(value: &str) -> Self {
        FactValue::Text(value.to_string())
    }
}

impl From<String> for FactValue {
    fn from(value: String) -> Self {
        FactValue::Text(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactError {
    #[error("fact `{key}` holds a {expected} value, refusing to overwrite it with a {found}")]
    KindMismatch {
        key: String,
        expected: FactKind,
        found: FactKind,
    },
}

/// Flat `key -> primitive` fact store describing one agent's beliefs.
///
/// Keys use a dotted namespace (`inv.seeds`, `nearby.water`, `has.hoe`). Iteration order is
/// the key order, so anything derived from a state (plans, diffs, traces) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct WorldState {
    facts: BTreeMap<Cow<'static, str>, FactValue>,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style `set`, handy for fixtures and perception snapshots.
    pub fn with(mut self, key: impl Into<Cow<'static, str>>, value: impl Into<FactValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.facts.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&FactValue> {
        self.facts.get(key)
    }

    /// Reads a boolean fact. Missing keys and non-boolean values yield `default`.
    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(FactValue::as_bool).unwrap_or(default)
    }

    /// Reads a numeric fact. Missing keys and non-numeric values yield `default`.
    pub fn number_or(&self, key: &str, default: f64) -> f64 {
        self.get(key).and_then(FactValue::as_number).unwrap_or(default)
    }

    pub fn text_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).and_then(FactValue::as_text).unwrap_or(default)
    }

    /// Overwrites a fact and returns the previous value.
    pub fn set(
        &mut self,
        key: impl Into<Cow<'static, str>>,
        value: impl Into<FactValue>,
    ) -> Option<FactValue> {
        self.facts.insert(key.into(), value.into())
    }

    /// Like [`WorldState::set`], but keeps a key's kind stable: writing a number over a boolean
    /// (or any other kind change) is rejected and the state is left untouched.
    pub fn try_set(
        &mut self,
        key: impl Into<Cow<'static, str>>,
        value: impl Into<FactValue>,
    ) -> Result<Option<FactValue>, FactError> {
        let key = key.into();
        let value = value.into();
        if let Some(existing) = self.facts.get(&key) {
            if existing.kind() != value.kind() {
                return Err(FactError::KindMismatch {
                    key: key.into_owned(),
                    expected: existing.kind(),
                    found: value.kind(),
                });
            }
        }
        Ok(self.facts.insert(key, value))
    }

    pub fn remove(&mut self, key: &str) -> Option<FactValue> {
        self.facts.remove(key)
    }

    pub fn clear(&mut self) {
        self.facts.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FactValue)> {
        self.facts.iter().map(|(k, v)| (&**k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.facts.keys().map(|k| &**k)
    }

    /// Overlays every fact of `other` onto `self`. Keys absent from `other` are kept.
    pub fn merge(&mut self, other: &WorldState) {
        for (key, value) in &other.facts {
            self.facts.insert(key.clone(), value.clone());
        }
    }

    /// Number of keys whose value differs between the two states.
    ///
    /// A key present on only one side counts as one difference. This is a drift metric, not a
    /// patch: it says how much changed, not what.
    pub fn diff(&self, other: &WorldState) -> usize {
        let changed_or_removed = self
            .facts
            .iter()
            .filter(|(key, value)| other.facts.get(*key) != Some(*value))
            .count();
        let added = other
            .facts
            .keys()
            .filter(|key| !self.facts.contains_key(*key))
            .count();
        changed_or_removed + added
    }
}

impl<K, V> FromIterator<(K, V)> for WorldState
where
    K: Into<Cow<'static, str>>,
    V: Into<FactValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut state = WorldState::new();
        for (key, value) in iter {
            state.set(key, value);
        }
        state
    }
}

impl fmt::Display for WorldState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        f.write_str("}")
    }
}
