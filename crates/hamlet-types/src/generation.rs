//! Text-generation request/response types and errors.
//!
//! The orchestration core treats the generation service as a black box:
//! a prompt goes in, text or a [`GenerationError`] comes out. The core
//! always applies its own timeout on top of whatever the backend does.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Request to the text-generation collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Full prompt text: persona/context block followed by the utterance.
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Successful generation result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub text: String,
}

/// Errors from the text-generation collaborator.
///
/// The router treats every variant identically (no reply this round), so
/// the taxonomy exists for logging, not for control flow.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("http error: {0}")]
    Http(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("empty response")]
    Empty,
}
