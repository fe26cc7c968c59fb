//! World-side ports: the traits the simulation engine implements so the
//! orchestration core can observe agents without owning them.
//!
//! The scheduler never holds a strong reference to an agent. It keys its
//! state by [`AgentId`] and asks the [`AgentDirectory`] for liveness on
//! every access; a directory miss is how the core learns an agent is gone.

use std::sync::Arc;

use hamlet_types::agent::{AgentId, AgentMemory, Position};
use hamlet_types::conversation::{EnvironmentSnapshot, SpeechEvent};
use hamlet_types::error::MessengerError;

/// A live simulated agent as seen by the orchestration core.
pub trait Villager: Send + Sync {
    fn id(&self) -> AgentId;

    /// Display name, if the agent has been given one.
    fn name(&self) -> Option<String>;

    /// Profession label ("farmer", "blacksmith"), if any.
    fn profession(&self) -> Option<String>;

    fn position(&self) -> Position;

    /// The per-agent persistent data attachment. Agents without one are
    /// skipped by the scheduler (warning, not an error).
    fn memory(&self) -> Option<Arc<AgentMemory>>;

    /// Notification that a speech event happened in earshot. Delivered to
    /// every candidate in range, not just the selected reply target.
    fn overhear(&self, event: &SpeechEvent) {
        let _ = event;
    }
}

/// Authoritative registry of live agents, owned by the simulation engine.
pub trait AgentDirectory: Send + Sync {
    /// Resolve an agent by id. `None` means the agent no longer exists,
    /// which makes its tracker eligible for eviction.
    fn resolve(&self, id: AgentId) -> Option<Arc<dyn Villager>>;

    /// Agents within `radius` of `position`. Order is unspecified.
    fn find_nearby(&self, position: Position, radius: f64) -> Vec<Arc<dyn Villager>>;
}

/// Environment state around a position, queried once per conversation event.
pub trait EnvironmentProbe: Send + Sync {
    fn snapshot(&self, position: Position, world_tag: &str) -> EnvironmentSnapshot;
}

/// Per-actor messaging surface for delivering replies.
///
/// Fire-and-forget: delivery logs and swallows failures.
pub trait Messenger: Send + Sync {
    fn send(&self, text: &str) -> Result<(), MessengerError>;
}
