//! Interaction-history repository implementations.

mod jsonl;
mod memory;

pub use jsonl::JsonlInteractionRepository;
pub use memory::InMemoryInteractionRepository;
