use anyhow::{Context, Result};
use secrecy::SecretString;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Application configuration loaded from environment variables.
/// A missing `GEMINI_API_KEY` is not an error: the client runs in placeholder mode.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<SecretString>,
    pub gemini_base_url: String,
    pub request_timeout_secs: u64,
    /// Overrides the built-in model preference order when set.
    pub preferred_models: Option<Vec<String>>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: optional_env("GEMINI_API_KEY").map(SecretString::from),
            gemini_base_url: optional_env("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            request_timeout_secs: std::env::var("GEMINI_TIMEOUT_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse::<u64>()
                .context("GEMINI_TIMEOUT_SECS must be a whole number of seconds")?,
            preferred_models: optional_env("GEMINI_PREFERRED_MODELS")
                .map(|raw| parse_model_list(&raw))
                .filter(|models| !models.is_empty()),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.gemini_api_key.is_some()
    }
}

/// Reads a variable, treating blank values the same as unset ones.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|m| m.trim().trim_start_matches("models/").to_string())
        .filter(|m| !m.is_empty())
        .collect()
}
