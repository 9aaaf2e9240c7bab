use swarm_core::{AgentId, GameWorld, TaskFactory, TickContext};

use crate::{RoleLoop, RoleStatus};

/// A set of independent agents sharing one world.
///
/// Agents never share memory; they coordinate only through what their tasks do to the world
/// and through negotiation channels on their blackboards. Roles are kept sorted by
/// `stable_id` and ticked one after another in that order.
pub struct Swarm<W, F>
where
    W: GameWorld,
    F: TaskFactory<W>,
{
    roles: Vec<RoleLoop<W, F>>,
}

impl<W, F> Default for Swarm<W, F>
where
    W: GameWorld,
    F: TaskFactory<W>,
{
    fn default() -> Self {
        Self { roles: Vec::new() }
    }
}

impl<W, F> Swarm<W, F>
where
    W: GameWorld,
    F: TaskFactory<W>,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, role: RoleLoop<W, F>) -> Self {
        self.add(role);
        self
    }

    /// Adds an agent. An existing role for the same agent is replaced and returned.
    pub fn add(&mut self, role: RoleLoop<W, F>) -> Option<RoleLoop<W, F>> {
        let id = role.agent().stable_id();
        match self
            .roles
            .binary_search_by_key(&id, |r| r.agent().stable_id())
        {
            Ok(index) => Some(std::mem::replace(&mut self.roles[index], role)),
            Err(index) => {
                self.roles.insert(index, role);
                None
            }
        }
    }

    pub fn remove(&mut self, agent: W::Agent) -> Option<RoleLoop<W, F>> {
        let index = self.index_of(agent)?;
        Some(self.roles.remove(index))
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn role(&self, agent: W::Agent) -> Option<&RoleLoop<W, F>> {
        self.index_of(agent).map(|i| &self.roles[i])
    }

    pub fn role_mut(&mut self, agent: W::Agent) -> Option<&mut RoleLoop<W, F>> {
        let index = self.index_of(agent)?;
        Some(&mut self.roles[index])
    }

    pub fn roles(&self) -> impl Iterator<Item = &RoleLoop<W, F>> {
        self.roles.iter()
    }

    /// Status each agent reported on the most recent tick, in tick order.
    pub fn statuses(&self) -> impl Iterator<Item = (W::Agent, RoleStatus)> + '_ {
        self.roles.iter().map(|r| (r.agent(), r.status()))
    }

    pub fn tick(&mut self, ctx: &TickContext, world: &mut W) {
        for role in self.roles.iter_mut() {
            role.tick(ctx, world);
        }
    }

    fn index_of(&self, agent: W::Agent) -> Option<usize> {
        self.roles
            .binary_search_by_key(&agent.stable_id(), |r| r.agent().stable_id())
            .ok()
    }
}
