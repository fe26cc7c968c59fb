//! OllamaTextGenerator -- concrete [`TextGenerator`] for an Ollama-compatible
//! `/api/generate` endpoint.
//!
//! Local model servers are the usual backend for a simulation that fires
//! many small completions; the generator speaks the plain non-streaming
//! generate API. An optional bearer token supports proxied deployments;
//! it is wrapped in [`secrecy::SecretString`] and never logged.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use hamlet_core::generation::TextGenerator;
use hamlet_types::generation::{GenerationError, GenerationRequest, GenerationResponse};

/// Client-side HTTP timeout. The orchestration core applies its own,
/// much shorter, per-call timeout on top.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Text generator backed by an Ollama-compatible HTTP endpoint.
pub struct OllamaTextGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
    bearer_token: Option<SecretString>,
}

impl OllamaTextGenerator {
    /// Create a generator against `base_url` (e.g. `http://localhost:11434`)
    /// using the given model.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .expect("failed to create reqwest client");
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            bearer_token: None,
        }
    }

    /// Attach a bearer token for proxied deployments.
    pub fn with_bearer_token(mut self, token: SecretString) -> Self {
        self.bearer_token = Some(token);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn to_wire_request(&self, request: &GenerationRequest) -> WireRequest {
        WireRequest {
            model: self.model.clone(),
            prompt: request.prompt.clone(),
            stream: false,
            options: WireOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        }
    }
}

// OllamaTextGenerator intentionally does not derive Debug; the bearer
// token must never reach Debug output or logs.

impl TextGenerator for OllamaTextGenerator {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        let body = self.to_wire_request(request);
        let url = format!("{}/api/generate", self.base_url);

        let mut http_request = self.client.post(&url).json(&body);
        if let Some(token) = &self.bearer_token {
            http_request = http_request.bearer_auth(token.expose_secret());
        }

        let response = http_request
            .send()
            .await
            .map_err(|e| GenerationError::Http(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GenerationError::Http(format!("failed to read response body: {e}")))?;

        parse_generate_response(status.as_u16(), &text)
    }
}

/// Interpret the endpoint's status and body as a generation result.
fn parse_generate_response(status: u16, body: &str) -> Result<GenerationResponse, GenerationError> {
    if !(200..300).contains(&status) {
        return Err(GenerationError::Provider {
            message: format!("HTTP {status}: {body}"),
        });
    }

    let wire: WireResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::InvalidResponse(format!("bad response shape: {e}")))?;

    Ok(GenerationResponse {
        text: wire.response,
    })
}

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: WireOptions,
}

#[derive(Debug, Serialize)]
struct WireOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    response: String,
}
