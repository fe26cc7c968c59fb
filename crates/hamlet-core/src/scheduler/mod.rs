//! Subsystem scheduling: per-agent trackers and the manager that decides,
//! per agent and per subsystem, whether an update runs this cycle.

mod manager;
mod tracker;

pub use manager::SubsystemManager;
pub use tracker::EntityTracker;
