//! Infrastructure implementations for the hamlet orchestration core:
//! the HTTP text-generation client, the configuration loader, and the
//! interaction-history repositories.

pub mod config;
pub mod generation;
pub mod repository;
