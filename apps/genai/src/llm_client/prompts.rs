// Prompt fragments owned by the client itself, plus placeholder content.
// Feature-specific prompts live with the services that use them.

use serde_json::{json, Value};

/// Leading marker on every placeholder reply.
pub const PLACEHOLDER_MARKER: &str = "[AI Generated - Placeholder]";

/// How much of the caller's prompt a placeholder echoes back.
const PLACEHOLDER_EXCERPT_CHARS: usize = 100;

/// Wraps structured requests so the model answers with bare JSON.
const STRUCTURED_ONLY_PREFIX: &str = "You are a helpful assistant that returns JSON responses only. \
    Return valid JSON only: no markdown, no code fences, no explanations before or after the data.";

const STRUCTURED_ONLY_SUFFIX: &str = "Return your response as raw JSON.";

pub fn structured_prompt(prompt: &str) -> String {
    format!("{STRUCTURED_ONLY_PREFIX}\n\n{}\n\n{STRUCTURED_ONLY_SUFFIX}", prompt.trim())
}

pub fn placeholder_text(prompt: &str) -> String {
    format!(
        "{PLACEHOLDER_MARKER}\nThis is a placeholder response. To enable AI features, \
        set GEMINI_API_KEY in the environment.\n\nBased on your prompt about: {}...",
        excerpt(prompt, PLACEHOLDER_EXCERPT_CHARS)
    )
}

pub fn placeholder_value(prompt: &str) -> Value {
    json!({
        "status": "placeholder",
        "marker": PLACEHOLDER_MARKER,
        "data": {},
        "message": "Gemini API key not configured",
        "prompt_excerpt": excerpt(prompt, PLACEHOLDER_EXCERPT_CHARS),
    })
}

/// True for values produced by `placeholder_value`.
pub fn is_placeholder_value(value: &Value) -> bool {
    value.get("status").and_then(Value::as_str) == Some("placeholder")
}

/// First `max_chars` characters of `text`, trimmed. Never splits a character.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    text.trim().chars().take(max_chars).collect()
}
