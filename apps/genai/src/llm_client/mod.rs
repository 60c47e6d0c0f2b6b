//! Generative client: the single point of entry for all model calls.
//!
//! ARCHITECTURAL RULE: No other module may call a model provider directly.
//! Services go through `GenerativeClient::generate_text` /
//! `GenerativeClient::generate_structured` and never see model names,
//! retry counts or health state.
//!
//! Lifecycle:
//!   Unconfigured  no credential; every call returns placeholder content
//!   Ready(model)  lazily initialized on first use; one active model
//!   Degrading     inside one call: switching models / backing off, bounded
//!                 by the request's attempt budget

use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde_json::Value;
use tokio::sync::{OnceCell, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::errors::{GenerationError, GenerationResult};

pub mod backoff;
pub mod classify;
pub mod gemini;
pub mod health;
pub mod prompts;
pub mod provider;
pub mod selection;
pub mod structured;

#[cfg(test)]
pub(crate) mod testing;

use backoff::BackoffPolicy;
use classify::{classify, ErrorKind};
use gemini::GeminiProvider;
use health::HealthTracker;
use provider::{short_id, ModelCandidate, ModelHandle, ModelProvider, SamplingParams};

/// Preference order used when the configuration does not override it.
/// Generous free-tier quota first.
pub const DEFAULT_PREFERRED_MODELS: &[&str] = &[
    "gemini-2.0-flash",
    "gemini-2.0-flash-lite",
    "gemini-1.5-flash",
    "gemini-1.5-pro",
];

/// Tried at startup when discovery fails or nothing discovered resolves.
pub const WELL_KNOWN_MODELS: &[&str] = &[
    "gemini-2.0-flash",
    "gemini-1.5-flash",
    "gemini-1.5-pro",
    "gemini-pro",
];

/// A model that hit a quota error is skipped as a fallback for this long.
pub const QUOTA_COOLDOWN: Duration = Duration::from_secs(300);
/// Candidate resolutions tried per failure before giving up on fallback.
pub const MAX_FALLBACK_CANDIDATES: usize = 3;
/// Structured requests always run cool to favour well-formed output.
pub const STRUCTURED_TEMPERATURE: f32 = 0.3;
/// Longest slice of a provider message carried in `QuotaExceeded`.
const ERROR_DETAIL_CHARS: usize = 200;

// ────────────────────────────────────────────────────────────────────────────
// Request / response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputShape {
    #[default]
    Text,
    Structured,
}

/// One generation request. Built once, never mutated by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub shape: OutputShape,
    pub max_output_tokens: u32,
    /// Ignored for structured requests (see `STRUCTURED_TEMPERATURE`).
    pub temperature: f32,
    /// Provider invocations are capped at `max_retries + 1`, fallback switches included.
    pub max_retries: u32,
    /// Specific model to try instead of the active one.
    pub model: Option<String>,
}

impl GenerationRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            shape: OutputShape::Text,
            max_output_tokens: 500,
            temperature: 0.7,
            max_retries: 2,
            model: None,
        }
    }

    pub fn structured(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            shape: OutputShape::Structured,
            max_output_tokens: 1000,
            temperature: STRUCTURED_TEMPERATURE,
            max_retries: 2,
            model: None,
        }
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    fn sampling(&self, shape: OutputShape) -> SamplingParams {
        SamplingParams {
            temperature: match shape {
                OutputShape::Text => self.temperature,
                OutputShape::Structured => STRUCTURED_TEMPERATURE,
            },
            max_output_tokens: self.max_output_tokens,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Generated {
    Text(String),
    Structured(Value),
}

/// Tunables for model selection and backoff.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub preferred_models: Vec<String>,
    pub well_known_models: Vec<String>,
    pub quota_cooldown: Duration,
    pub max_fallback_candidates: usize,
    pub backoff: BackoffPolicy,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            preferred_models: DEFAULT_PREFERRED_MODELS.iter().map(|m| m.to_string()).collect(),
            well_known_models: WELL_KNOWN_MODELS.iter().map(|m| m.to_string()).collect(),
            quota_cooldown: QUOTA_COOLDOWN,
            max_fallback_candidates: MAX_FALLBACK_CANDIDATES,
            backoff: BackoffPolicy::default(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

enum ModelState {
    /// Credential present but nothing could be resolved.
    NoUsableModel,
    Ready {
        active: RwLock<ModelHandle>,
        /// Generation-capable models reported at startup; empty if discovery failed.
        discovered: Vec<ModelCandidate>,
    },
}

struct ClientInner {
    /// `None` means unconfigured (placeholder mode).
    provider: Option<Arc<dyn ModelProvider>>,
    settings: ClientSettings,
    health: HealthTracker,
    state: OnceCell<ModelState>,
}

/// Shared generative client. Cloning is cheap and every clone shares model
/// selection and health state; build one per process and hand clones out.
#[derive(Clone)]
pub struct GenerativeClient {
    inner: Arc<ClientInner>,
}

impl GenerativeClient {
    pub fn new(provider: Arc<dyn ModelProvider>, settings: ClientSettings) -> Self {
        Self::build(Some(provider), settings)
    }

    /// A client with no credential: every call yields placeholder content.
    pub fn unconfigured() -> Self {
        Self::build(None, ClientSettings::default())
    }

    /// Builds the Gemini-backed client, or an unconfigured one when
    /// `GEMINI_API_KEY` is absent.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let Some(api_key) = config.gemini_api_key.clone() else {
            warn!("GEMINI_API_KEY not set; AI features will return placeholder content");
            return Ok(Self::unconfigured());
        };

        let provider = GeminiProvider::new(
            api_key,
            config.gemini_base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
        .context("Failed to build Gemini HTTP client")?;

        let mut settings = ClientSettings::default();
        if let Some(preferred) = &config.preferred_models {
            settings.preferred_models = preferred.clone();
        }

        Ok(Self::new(Arc::new(provider), settings))
    }

    fn build(provider: Option<Arc<dyn ModelProvider>>, settings: ClientSettings) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                provider,
                health: HealthTracker::new(settings.quota_cooldown),
                settings,
                state: OnceCell::new(),
            }),
        }
    }

    /// True when a credential is set and a model was resolved.
    /// Triggers lazy initialization on first call.
    pub async fn is_configured(&self) -> bool {
        match self.inner.provider.as_deref() {
            Some(provider) => matches!(self.model_state(provider).await, ModelState::Ready { .. }),
            None => false,
        }
    }

    /// Identifier of the model new requests start on, if any.
    pub async fn active_model(&self) -> Option<String> {
        let provider = self.inner.provider.as_deref()?;
        match self.model_state(provider).await {
            ModelState::Ready { active, .. } => Some(active.read().await.id.clone()),
            ModelState::NoUsableModel => None,
        }
    }

    pub async fn generate_text(&self, request: &GenerationRequest) -> GenerationResult<String> {
        match self.execute(request, OutputShape::Text).await? {
            Generated::Text(text) => Ok(text),
            Generated::Structured(value) => Ok(value.to_string()),
        }
    }

    pub async fn generate_structured(&self, request: &GenerationRequest) -> GenerationResult<Value> {
        match self.execute(request, OutputShape::Structured).await? {
            Generated::Structured(value) => Ok(value),
            Generated::Text(text) => Ok(Value::String(text)),
        }
    }

    /// Dispatches on `request.shape`.
    pub async fn generate(&self, request: &GenerationRequest) -> GenerationResult<Generated> {
        self.execute(request, request.shape).await
    }

    // ────────────────────────────────────────────────────────────────────────
    // Initialization
    // ────────────────────────────────────────────────────────────────────────

    async fn model_state(&self, provider: &dyn ModelProvider) -> &ModelState {
        self.inner
            .state
            .get_or_init(|| self.initialize(provider))
            .await
    }

    async fn initialize(&self, provider: &dyn ModelProvider) -> ModelState {
        let settings = &self.inner.settings;

        let discovered: Vec<ModelCandidate> = match provider.list_models().await {
            Ok(models) => models.into_iter().filter(|m| m.supports_generation).collect(),
            Err(e) => {
                warn!("Failed to list models, falling back to well-known identifiers: {e}");
                Vec::new()
            }
        };

        let candidates = selection::initial_candidates(
            &discovered,
            &settings.preferred_models,
            &settings.well_known_models,
        );

        for candidate in candidates {
            match provider.resolve_model(&candidate) {
                Ok(handle) => {
                    info!(
                        "Generative client initialized (model: {handle}, {} models discovered)",
                        discovered.len()
                    );
                    return ModelState::Ready {
                        active: RwLock::new(handle),
                        discovered,
                    };
                }
                Err(e) => {
                    warn!("Could not initialize model {candidate}: {e}");
                    self.inner
                        .health
                        .record_failure(short_id(&candidate), false, Instant::now());
                }
            }
        }

        warn!("Could not initialize any generative model");
        ModelState::NoUsableModel
    }

    // ────────────────────────────────────────────────────────────────────────
    // Execution
    // ────────────────────────────────────────────────────────────────────────

    async fn execute(
        &self,
        request: &GenerationRequest,
        shape: OutputShape,
    ) -> GenerationResult<Generated> {
        let Some(provider) = self.inner.provider.as_deref() else {
            return Ok(match shape {
                OutputShape::Text => Generated::Text(prompts::placeholder_text(&request.prompt)),
                OutputShape::Structured => {
                    Generated::Structured(prompts::placeholder_value(&request.prompt))
                }
            });
        };

        let ModelState::Ready { active, discovered } = self.model_state(provider).await else {
            return Err(GenerationError::NoUsableModel);
        };

        let default_model = active.read().await.clone();
        let mut model = self.starting_model(provider, request, &default_model);
        let started_on_default = model == default_model;

        let prompt: Cow<'_, str> = match shape {
            OutputShape::Text => Cow::Borrowed(&request.prompt),
            OutputShape::Structured => Cow::Owned(prompts::structured_prompt(&request.prompt)),
        };
        let params = request.sampling(shape);
        let health = &self.inner.health;
        let backoff = &self.inner.settings.backoff;

        let max_attempts = request.max_retries.saturating_add(1);
        let mut tried: HashSet<String> = HashSet::new();
        let mut switched = false;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            tried.insert(model.id.clone());
            health.record_use(&model.id, Instant::now());

            let error = match provider.generate(&model, &prompt, params).await {
                Ok(text) => {
                    health.reset_after_success(Instant::now());
                    if switched && started_on_default {
                        *active.write().await = model.clone();
                        info!("Active model is now {model}");
                    }
                    debug!("Generation succeeded on {model} (attempt {attempt}/{max_attempts})");
                    return decode(shape, text);
                }
                Err(e) => e,
            };

            let mut classification = classify(&error.message);
            if classification.kind.is_quota() && classification.suggested_delay.is_none() {
                classification.suggested_delay = error.retry_after;
            }
            let budget_left = attempt < max_attempts;

            match classification.kind {
                ErrorKind::NotFound => {
                    health.record_failure(&model.id, false, Instant::now());
                    warn!("Model {model} unavailable: {error}");
                    if !budget_left {
                        return Err(GenerationError::ModelUnavailable { model: model.id });
                    }
                    match self.next_fallback(provider, discovered, &mut tried) {
                        Some(next) => {
                            model = next;
                            switched = true;
                        }
                        None => return Err(GenerationError::ModelUnavailable { model: model.id }),
                    }
                }
                ErrorKind::RateLimited | ErrorKind::QuotaExhausted => {
                    health.record_failure(&model.id, true, Instant::now());
                    if !budget_left {
                        return Err(GenerationError::QuotaExceeded {
                            attempts: attempt,
                            details: prompts::excerpt(&error.message, ERROR_DETAIL_CHARS),
                        });
                    }
                    match self.next_fallback(provider, discovered, &mut tried) {
                        Some(next) => {
                            if let Some(wait) = backoff.hinted_delay(&classification) {
                                warn!(
                                    "Quota exceeded on {model}; switching to {next} after the provider's {:.1}s hint",
                                    wait.as_secs_f64()
                                );
                                tokio::time::sleep(wait).await;
                            } else {
                                warn!("Quota exceeded on {model}; switching to {next}");
                            }
                            model = next;
                            switched = true;
                        }
                        None => {
                            let wait = backoff.delay_for(&classification);
                            warn!(
                                "Quota exceeded on {model}, no fallback available; retrying in {:.1}s (attempt {attempt}/{max_attempts})",
                                wait.as_secs_f64()
                            );
                            tokio::time::sleep(wait).await;
                        }
                    }
                }
                ErrorKind::Other => {
                    health.record_failure(&model.id, false, Instant::now());
                    return Err(GenerationError::Provider(error.message));
                }
            }
        }
    }

    /// The active model, unless the request names a different one that resolves.
    fn starting_model(
        &self,
        provider: &dyn ModelProvider,
        request: &GenerationRequest,
        default_model: &ModelHandle,
    ) -> ModelHandle {
        let Some(requested) = request
            .model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty() && short_id(m) != default_model.id)
        else {
            return default_model.clone();
        };

        match provider.resolve_model(requested) {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Requested model {requested} unavailable ({e}); using {default_model}");
                default_model.clone()
            }
        }
    }

    /// Resolves the best-ranked fallback, trying at most
    /// `max_fallback_candidates` identifiers.
    fn next_fallback(
        &self,
        provider: &dyn ModelProvider,
        discovered: &[ModelCandidate],
        tried: &mut HashSet<String>,
    ) -> Option<ModelHandle> {
        let settings = &self.inner.settings;
        let health = &self.inner.health;
        let now = Instant::now();

        let ranked = selection::rank_fallbacks(
            &settings.preferred_models,
            discovered,
            tried,
            health,
            now,
        );

        for candidate in ranked.into_iter().take(settings.max_fallback_candidates) {
            match provider.resolve_model(&candidate) {
                Ok(handle) => return Some(handle),
                Err(e) => {
                    warn!("Fallback model {candidate} could not be instantiated: {e}");
                    health.record_failure(&candidate, false, now);
                    tried.insert(candidate);
                }
            }
        }
        None
    }
}

fn decode(shape: OutputShape, text: String) -> GenerationResult<Generated> {
    match shape {
        OutputShape::Text => Ok(Generated::Text(text)),
        OutputShape::Structured => structured::parse_structured(&text).map(Generated::Structured),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
