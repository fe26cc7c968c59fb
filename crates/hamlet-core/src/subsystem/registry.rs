//! Priority-ordered subsystem registry.
//!
//! Subsystems are registered once at startup and never unregistered.
//! The registry keeps them sorted ascending by priority, with ties broken
//! by registration order, and hands out snapshots for iteration so the
//! lock is never held across a hook call.

use std::sync::{Arc, RwLock};

use tracing::warn;

use super::BehaviorSubsystem;

struct RegistryEntry {
    subsystem: Arc<dyn BehaviorSubsystem>,
    /// Registration sequence number, the tie-break for equal priorities.
    order: usize,
}

/// Holds every registered behavior subsystem in dispatch order.
#[derive(Default)]
pub struct SubsystemRegistry {
    entries: RwLock<Vec<RegistryEntry>>,
}

impl SubsystemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subsystem. A duplicate name is a no-op with a warning.
    /// Returns `true` when the subsystem was added.
    pub fn register(&self, subsystem: Arc<dyn BehaviorSubsystem>) -> bool {
        let mut entries = self.write();
        if entries
            .iter()
            .any(|e| e.subsystem.name() == subsystem.name())
        {
            warn!(name = subsystem.name(), "subsystem already registered, ignoring");
            return false;
        }
        let order = entries.len();
        entries.push(RegistryEntry { subsystem, order });
        // Stable ordering: priority ascending, then registration order.
        entries.sort_by_key(|e| (e.subsystem.priority(), e.order));
        true
    }

    /// Snapshot in dispatch order (priority ascending).
    pub fn snapshot(&self) -> Vec<Arc<dyn BehaviorSubsystem>> {
        self.read().iter().map(|e| Arc::clone(&e.subsystem)).collect()
    }

    /// Snapshot in shutdown order -- the mirror image of dispatch order.
    pub fn reverse_snapshot(&self) -> Vec<Arc<dyn BehaviorSubsystem>> {
        let mut subsystems = self.snapshot();
        subsystems.reverse();
        subsystems
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn BehaviorSubsystem>> {
        self.read()
            .iter()
            .find(|e| e.subsystem.name() == name)
            .map(|e| Arc::clone(&e.subsystem))
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<RegistryEntry>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<RegistryEntry>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for SubsystemRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self
            .read()
            .iter()
            .map(|e| format!("{} (p{})", e.subsystem.name(), e.subsystem.priority()))
            .collect();
        f.debug_struct("SubsystemRegistry")
            .field("subsystems", &names)
            .finish()
    }
}
