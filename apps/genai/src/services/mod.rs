//! Caller features built on the generative client.
//!
//! Every service degrades the same way: template content when the client is
//! in placeholder mode or has no usable model, and the same template (with a
//! `warn!`) when generation fails. Callers never see a `GenerationError`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub mod components;
pub mod content;
pub mod portfolio;
pub mod prompts;
pub mod resume;
pub mod seo;
pub mod skills;
pub mod text;

/// First `max_chars` characters of `text`. Never splits a character.
pub(crate) fn clip(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Like `clip`, appending `...` when anything was cut.
pub(crate) fn clip_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", clip(text, max_chars))
    } else {
        text.to_string()
    }
}

/// Joins at most `limit` items with `", "`, or returns `fallback` when empty.
pub(crate) fn join_or(items: &[String], limit: usize, fallback: &str) -> String {
    if items.is_empty() {
        return fallback.to_string();
    }
    items
        .iter()
        .take(limit)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Null, whitespace-only strings, and empty arrays or objects.
pub(crate) fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Models emit `null` for fields they could not fill; treat it as the default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
