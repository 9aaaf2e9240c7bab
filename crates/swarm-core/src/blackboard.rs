use std::any::Any;
use std::collections::BTreeMap;
use std::marker::PhantomData;

use thiserror::Error;

/// Typed handle into a [`Blackboard`].
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BbKey<T: 'static> {
    id: u64,
    name: &'static str,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: 'static> Copy for BbKey<T> {}

impl<T: 'static> Clone for BbKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> BbKey<T> {
    pub const fn new(id: u64) -> Self {
        Self::named(id, "")
    }

    pub const fn named(id: u64, name: &'static str) -> Self {
        Self {
            id,
            name,
            _phantom: PhantomData,
        }
    }

    pub fn id(self) -> u64 {
        self.id
    }

    pub fn name(self) -> &'static str {
        self.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "blackboard type mismatch for key id={id} name={name:?} (stored type differs from requested)"
)]
pub struct BlackboardTypeMismatch {
    pub id: u64,
    pub name: &'static str,
}

/// Per-agent, type-erased store for collaborators injected by the host: trace sinks, the
/// negotiation channel, game API handles. Tasks read what they need from here.
#[derive(Default)]
pub struct Blackboard {
    values: BTreeMap<u64, Box<dyn Any>>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains<T: 'static>(&self, key: BbKey<T>) -> bool {
        self.values.contains_key(&key.id)
    }

    pub fn set<T: 'static>(&mut self, key: BbKey<T>, value: T) {
        self.values.insert(key.id, Box::new(value));
    }

    pub fn try_get<T: 'static>(&self, key: BbKey<T>) -> Result<Option<&T>, BlackboardTypeMismatch> {
        match self.values.get(&key.id) {
            None => Ok(None),
            Some(value) => value
                .downcast_ref::<T>()
                .map(Some)
                .ok_or(BlackboardTypeMismatch {
                    id: key.id,
                    name: key.name,
                }),
        }
    }

    pub fn try_get_mut<T: 'static>(
        &mut self,
        key: BbKey<T>,
    ) -> Result<Option<&mut T>, BlackboardTypeMismatch> {
        match self.values.get_mut(&key.id) {
            None => Ok(None),
            Some(value) => value
                .downcast_mut::<T>()
                .map(Some)
                .ok_or(BlackboardTypeMismatch {
                    id: key.id,
                    name: key.name,
                }),
        }
    }

    /// # Panics
    ///
    /// Panics when the stored value has a different type than `T`; two keys sharing an id is a
    /// wiring bug, not a runtime condition.
    pub fn get<T: 'static>(&self, key: BbKey<T>) -> Option<&T> {
        self.try_get(key).unwrap_or_else(|err| panic!("{err}"))
    }

    /// # Panics
    ///
    /// Same contract as [`Blackboard::get`].
    pub fn get_mut<T: 'static>(&mut self, key: BbKey<T>) -> Option<&mut T> {
        self.try_get_mut(key).unwrap_or_else(|err| panic!("{err}"))
    }

    pub fn remove<T: 'static>(&mut self, key: BbKey<T>) -> Option<T> {
        let value = self.values.remove(&key.id)?;
        match value.downcast::<T>() {
            Ok(value) => Some(*value),
            Err(_) => panic!(
                "{}",
                BlackboardTypeMismatch {
                    id: key.id,
                    name: key.name,
                }
            ),
        }
    }
}
