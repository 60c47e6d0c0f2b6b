//! Decoding of structured (JSON) replies.
//!
//! Models wrap JSON in code fences or chat around it despite being told not
//! to. Decoding tries, in order: the fence-stripped reply, the widest
//! `{...}` span, the widest `[...]` span.

use serde_json::Value;

use crate::errors::{GenerationError, GenerationResult};

pub fn parse_structured(raw: &str) -> GenerationResult<Value> {
    let text = strip_json_fences(raw);

    let first_error = match serde_json::from_str::<Value>(text) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    for (open, close) in [('{', '}'), ('[', ']')] {
        if let Some(span) = embedded_span(text, open, close) {
            if let Ok(value) = serde_json::from_str::<Value>(span) {
                return Ok(value);
            }
        }
    }

    Err(GenerationError::Parse {
        reason: first_error.to_string(),
        raw: raw.to_string(),
    })
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop an info string such as `json` or `JSON`.
    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("JSON"))
        .unwrap_or(rest)
        .trim_start();
    rest.strip_suffix("```").map(str::trim).unwrap_or(rest)
}

/// Widest substring running from the first `open` to the last `close`.
fn embedded_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_strip_uppercase_info_string() {
        let input = "  ```JSON\n{\"skills\": [\"Rust\"]}\n```  ";
        assert_eq!(strip_json_fences(input), "{\"skills\": [\"Rust\"]}");
    }

    #[test]
    fn test_strip_inline_fence_without_tag() {
        assert_eq!(strip_json_fences("```[\"a\", \"b\"]```"), "[\"a\", \"b\"]");
    }

    #[test]
    fn test_unfenced_reply_is_only_trimmed() {
        assert_eq!(strip_json_fences("\n  {\"score\": 80}\n"), "{\"score\": 80}");
    }

    #[test]
    fn test_strip_json_fences_unterminated() {
        assert_eq!(strip_json_fences("```json\n[1, 2]"), "[1, 2]");
    }

    #[test]
    fn test_parse_fenced_single_line() {
        let value = parse_structured("```json {\"a\":1} ```").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_parse_object_inside_prose() {
        let value = parse_structured("Sure! {\"a\":1} Thanks").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_parse_array_inside_prose() {
        let value = parse_structured("Here you go: [\"rust\", \"sql\"] hope that helps").unwrap();
        assert_eq!(value, json!(["rust", "sql"]));
    }

    #[test]
    fn test_parse_nested_object_uses_widest_span() {
        let value = parse_structured("Result: {\"a\": {\"b\": [1, 2]}} done").unwrap();
        assert_eq!(value, json!({"a": {"b": [1, 2]}}));
    }

    #[test]
    fn test_unparseable_reply_keeps_raw_text() {
        let raw = "I'm sorry, I can't help with that.";
        match parse_structured(raw) {
            Err(GenerationError::Parse { raw: kept, .. }) => assert_eq!(kept, raw),
            other => panic!("expected parse failure, got {other:?}"),
        }
    }

    #[test]
    fn test_broken_braces_are_parse_failure() {
        let raw = "{\"a\": 1, oops }";
        assert!(matches!(
            parse_structured(raw),
            Err(GenerationError::Parse { .. })
        ));
    }
}
