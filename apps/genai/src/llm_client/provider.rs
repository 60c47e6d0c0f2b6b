//! Provider seam: the only surface the client needs from a model backend.
//!
//! `GeminiProvider` is the production implementation; tests drive the client
//! through a scripted in-memory provider.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Generation method a model must advertise to be usable for free-form text.
pub const GENERATE_CONTENT: &str = "generateContent";

const QUALIFIED_PREFIX: &str = "models/";

/// A model the provider reports as available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCandidate {
    /// Short identifier, e.g. `gemini-2.0-flash`.
    pub id: String,
    /// Fully-qualified identifier, e.g. `models/gemini-2.0-flash`.
    pub qualified_id: String,
    pub supports_generation: bool,
}

impl ModelCandidate {
    pub fn new(name: &str, supports_generation: bool) -> Self {
        Self {
            id: short_id(name).to_string(),
            qualified_id: qualified_id(name),
            supports_generation,
        }
    }
}

/// A resolved, callable model. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelHandle {
    pub id: String,
}

impl ModelHandle {
    pub fn new(name: &str) -> Self {
        Self {
            id: short_id(name).to_string(),
        }
    }

    pub fn qualified_id(&self) -> String {
        qualified_id(&self.id)
    }
}

impl fmt::Display for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Sampling parameters sent with every generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// A failed provider call. `Display` carries the provider's own wording,
/// which is what error classification works from.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub status: Option<u16>,
    pub message: String,
    /// Retry delay advertised out-of-band (structured error details or a
    /// `Retry-After` header) when the message itself carries none.
    pub retry_after: Option<Duration>,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn with_retry_after(mut self, delay: Duration) -> Self {
        self.retry_after = Some(delay);
        self
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        Self {
            status: err.status().map(|s| s.as_u16()),
            message: format!("HTTP error: {err}"),
            retry_after: None,
        }
    }
}

/// A generative model backend.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Lists every model the credential can see.
    async fn list_models(&self) -> Result<Vec<ModelCandidate>, ProviderError>;

    /// Builds a handle for `model` without making a generation call.
    /// Accepts both short and fully-qualified identifiers.
    fn resolve_model(&self, model: &str) -> Result<ModelHandle, ProviderError>;

    /// Runs one generation and returns the reply text.
    async fn generate(
        &self,
        model: &ModelHandle,
        prompt: &str,
        params: SamplingParams,
    ) -> Result<String, ProviderError>;
}

pub fn short_id(name: &str) -> &str {
    name.trim().trim_start_matches(QUALIFIED_PREFIX)
}

pub fn qualified_id(name: &str) -> String {
    format!("{QUALIFIED_PREFIX}{}", short_id(name))
}
