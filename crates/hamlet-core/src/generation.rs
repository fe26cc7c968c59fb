//! TextGenerator trait definition.
//!
//! The abstraction over the external text-generation service. Uses native
//! async fn in traits (RPITIT, Rust 2024 edition); the router is generic
//! over the implementation, so no boxing is needed.
//!
//! Implementations live in hamlet-infra (e.g., `OllamaTextGenerator`).

use hamlet_types::generation::{GenerationError, GenerationRequest, GenerationResponse};

/// Trait for text-generation backends.
///
/// Callers always apply their own timeout on top of the backend's; a slow
/// `generate` future is simply abandoned at the deadline.
pub trait TextGenerator: Send + Sync {
    /// Human-readable backend name (e.g., "ollama").
    fn name(&self) -> &str;

    /// Produce a reply for the given prompt.
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl std::future::Future<Output = Result<GenerationResponse, GenerationError>> + Send;
}
