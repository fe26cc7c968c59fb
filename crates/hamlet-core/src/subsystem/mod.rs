//! Behavior subsystem contract.
//!
//! Every pluggable behavior module (personality, emotion, gossip,
//! learning, ...) implements [`BehaviorSubsystem`]. The scheduler only
//! consumes this contract: it never looks inside a subsystem, it just
//! decides when to call the hooks and isolates their failures.

mod registry;

pub use registry::SubsystemRegistry;

use std::time::Duration;

use serde_json::Value;

use hamlet_types::agent::AgentId;
use hamlet_types::error::SubsystemError;

use crate::world::Villager;

/// Uniform capability interface for behavior modules.
///
/// Identity (`name`), ordering (`priority`), and cadence
/// (`update_interval`) are fixed at registration. The enabled flag is
/// mutable and checked on every cycle; implementors typically back it
/// with an `AtomicBool`.
///
/// Hooks are synchronous: the scheduler invokes them from bounded worker
/// tasks, so a hook may block briefly without stalling the driving loop.
pub trait BehaviorSubsystem: Send + Sync {
    /// Unique subsystem name. Duplicate registrations are rejected.
    fn name(&self) -> &str;

    /// Ascending order of initialization and update dispatch. Shutdown
    /// runs in the reverse of this order.
    fn priority(&self) -> i32;

    /// Minimum spacing between two updates for one agent.
    fn update_interval(&self) -> Duration;

    /// Checked each cycle; a disabled subsystem is skipped everywhere
    /// except shutdown.
    fn is_enabled(&self) -> bool;

    fn set_enabled(&self, enabled: bool);

    /// Called once when an agent comes under management.
    fn attach_agent(&self, villager: &dyn Villager) -> Result<(), SubsystemError>;

    /// Cheap per-cycle test, evaluated before the interval gate.
    fn needs_update(&self, villager: &dyn Villager) -> bool {
        let _ = villager;
        true
    }

    /// The per-agent update, invoked from a worker task.
    fn update_agent(&self, villager: &dyn Villager) -> Result<(), SubsystemError>;

    /// Called when an agent is cleaned up or evicted.
    fn detach_agent(&self, id: AgentId) -> Result<(), SubsystemError> {
        let _ = id;
        Ok(())
    }

    /// Periodic housekeeping, driven by the manager's maintenance loop.
    fn perform_maintenance(&self) -> Result<(), SubsystemError> {
        Ok(())
    }

    /// Final hook before the manager stops. Reverse-priority order.
    fn shutdown(&self) -> Result<(), SubsystemError> {
        Ok(())
    }

    /// Subsystem-specific analytics payload.
    fn analytics(&self) -> Result<Value, SubsystemError> {
        Ok(Value::Null)
    }
}
