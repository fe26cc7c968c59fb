//! Concrete [`TextGenerator`](hamlet_core::generation::TextGenerator)
//! implementations.

mod ollama;

pub use ollama::OllamaTextGenerator;
