//! Free-form text improvement (grammar, tone, SEO).

use tracing::warn;

use crate::llm_client::{GenerationRequest, GenerativeClient};
use crate::services::prompts::IMPROVE_TEXT_PROMPT_TEMPLATE;

/// Prefix on text returned unchanged because no model is available.
pub const UNIMPROVED_MARKER: &str = "[AI Improved - Placeholder]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImproveOptions {
    /// professional, casual, creative, ...
    pub tone: String,
    /// portfolio, blog, resume, ...
    pub purpose: String,
    pub improve_grammar: bool,
    pub improve_seo: bool,
}

impl Default for ImproveOptions {
    fn default() -> Self {
        Self {
            tone: "professional".to_string(),
            purpose: "portfolio".to_string(),
            improve_grammar: true,
            improve_seo: false,
        }
    }
}

impl ImproveOptions {
    fn instructions(&self) -> String {
        let mut improvements = Vec::new();
        if self.improve_grammar {
            improvements.push("fix any grammar and spelling errors");
        }
        if self.improve_seo {
            improvements.push("optimize for SEO with relevant keywords");
        }
        if improvements.is_empty() {
            "enhance the writing".to_string()
        } else {
            improvements.join(", ")
        }
    }
}

/// Rewrites `text` per `options`. Returns the input behind
/// `UNIMPROVED_MARKER` when no model is available or generation fails.
pub async fn improve_text(client: &GenerativeClient, text: &str, options: &ImproveOptions) -> String {
    if !client.is_configured().await {
        return unimproved(text);
    }

    let prompt = IMPROVE_TEXT_PROMPT_TEMPLATE
        .replace("{purpose}", &options.purpose)
        .replace("{tone}", &options.tone)
        .replace("{improvements}", &options.instructions())
        .replace("{text}", text);

    let request = GenerationRequest::text(prompt)
        .with_max_output_tokens(1000)
        .with_temperature(0.7);
    match client.generate_text(&request).await {
        Ok(improved) => improved,
        Err(e) => {
            warn!("Text improvement failed, returning original text: {e}");
            unimproved(text)
        }
    }
}

fn unimproved(text: &str) -> String {
    format!("{UNIMPROVED_MARKER}\n{text}")
}
