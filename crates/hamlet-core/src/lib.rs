//! Orchestration core for the hamlet simulated-agent platform.
//!
//! Two coupled responsibilities live here: the subsystem scheduler that
//! decides per agent and per behavior subsystem whether an update runs
//! this cycle, and the conversation pipeline that turns inbound speech
//! events into generated replies under cooldown, cache, and concurrency
//! gates. This crate defines the "ports" (world, generation, repository
//! traits) that `hamlet-infra` and the simulation engine implement --
//! it never touches IO directly.

pub mod dialogue;
pub mod generation;
pub mod repository;
pub mod scheduler;
pub mod subsystem;
pub mod world;

#[cfg(test)]
pub(crate) mod test_support;
