use core::fmt::Debug;

/// Per-tick timing handed to every poll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    pub tick: u64,
    pub dt_seconds: f32,
}

impl TickContext {
    pub fn new(tick: u64, dt_seconds: f32) -> Self {
        Self { tick, dt_seconds }
    }

    pub fn next(&self) -> Self {
        Self {
            tick: self.tick + 1,
            dt_seconds: self.dt_seconds,
        }
    }
}

/// Stable identifier for an agent.
///
/// Swarms tick agents in `stable_id` order so that a run is reproducible.
pub trait AgentId: Copy + Ord + Eq + Debug + 'static {
    fn stable_id(self) -> u64;
}

impl AgentId for u64 {
    fn stable_id(self) -> u64 {
        self
    }
}

impl AgentId for u32 {
    fn stable_id(self) -> u64 {
        self as u64
    }
}

/// Game-side handle that tasks act through (movement, digging, containers...).
///
/// The kernel never queries it; individual tasks define what they need via extension traits.
pub trait GameWorld: 'static {
    type Agent: AgentId;
}
