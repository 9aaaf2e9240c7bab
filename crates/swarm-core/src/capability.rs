use std::collections::BTreeSet;
use std::fmt;

use crate::{BbKey, Blackboard, TaskError};

/// Optional collaborators an agent may or may not have wired in.
///
/// Actions list the capabilities they need; the planner only considers an action when every
/// capability it requires is present. Nothing in planning looks at the concrete implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    /// Chat-based need broadcasting and trade with other agents.
    Negotiation,
}

impl Capability {
    pub fn name(self) -> &'static str {
        match self {
            Capability::Negotiation => "negotiation",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    present: BTreeSet<Capability>,
}

impl Capabilities {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self::none().with(Capability::Negotiation)
    }

    /// Reports what the host injected into `blackboard`.
    pub fn detect(blackboard: &Blackboard) -> Self {
        let mut caps = Self::none();
        if blackboard.contains(NEGOTIATION) {
            caps.insert(Capability::Negotiation);
        }
        caps
    }

    pub fn with(mut self, capability: Capability) -> Self {
        self.insert(capability);
        self
    }

    pub fn insert(&mut self, capability: Capability) {
        self.present.insert(capability);
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.present.contains(&capability)
    }

    pub fn satisfies(&self, required: &[Capability]) -> bool {
        required.iter().all(|c| self.has(*c))
    }
}

/// Where a broadcast need currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// No agent has answered yet.
    Pending,
    /// Another agent agreed and is on its way (or dropped the items in the shared container).
    Promised,
    /// `count` items arrived.
    Delivered(u32),
    Declined,
}

/// Inter-agent negotiation channel. The wire protocol lives outside the kernel.
pub trait Negotiation {
    fn broadcast_need(&mut self, item: &str, count: u32) -> Result<(), TaskError>;

    fn poll_delivery(&mut self, item: &str) -> DeliveryStatus;

    /// Retract a broadcast need, e.g. when the requesting task is cancelled.
    fn withdraw_need(&mut self, item: &str);
}

pub const NEGOTIATION: BbKey<Box<dyn Negotiation>> =
    BbKey::named(0x5A4D_C0DE_0000_0001, "negotiation");

/// Fetch the negotiation channel for a task that declared [`Capability::Negotiation`].
pub fn negotiation(
    blackboard: &mut Blackboard,
) -> Result<&mut (dyn Negotiation + 'static), TaskError> {
    match blackboard.get_mut(NEGOTIATION) {
        Some(channel) => Ok(&mut **channel),
        None => Err(TaskError::MissingCapability(Capability::Negotiation.name())),
    }
}
