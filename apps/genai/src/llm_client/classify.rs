//! Provider error classification.
//!
//! Providers report quota, rate-limit and model-retirement failures as free
//! text, so classification is a pure function over that text driven by the
//! pattern tables below.

use std::sync::LazyLock;
use std::time::Duration;

use regex::{Regex, RegexSet};

/// Longest delay ever extracted from a provider message, before any capping.
const MAX_EXTRACTED_DELAY_SECS: f64 = 86_400.0;

/// Daily / project quota used up. Checked first: these messages usually
/// carry a 429 as well and deserve the longer default delay.
const QUOTA_EXHAUSTED_PATTERNS: &[&str] = &[
    r"(?i)resource[_ ]exhausted",
    r"(?i)quota",
];

const RATE_LIMIT_PATTERNS: &[&str] = &[
    r"\b429\b",
    r"(?i)rate[ _-]?limit",
    r"(?i)too many requests",
    r"(?i)per minute",
];

const NOT_FOUND_PATTERNS: &[&str] = &[
    r"\b404\b",
    r"(?i)not[ _]found",
    r"(?i)is not supported",
    r"(?i)unsupported model",
    r"(?i)does not exist",
    r"(?i)unknown model",
    r"(?i)has been (?:deprecated|retired|discontinued)",
];

/// Tried in order; the first capture group is the delay in seconds.
const DELAY_PATTERNS: &[&str] = &[
    r"(?i)retry\D*?(\d+(?:\.\d+)?)\s*(?:seconds?|secs?|s)\b",
    r"(?i)retry[_ ]?delay\D*?(\d+(?:\.\d+)?)",
    r"(?i)retry-after:?\s*(\d+(?:\.\d+)?)",
];

static QUOTA_EXHAUSTED: LazyLock<RegexSet> = LazyLock::new(|| compile_set(QUOTA_EXHAUSTED_PATTERNS));
static RATE_LIMIT: LazyLock<RegexSet> = LazyLock::new(|| compile_set(RATE_LIMIT_PATTERNS));
static NOT_FOUND: LazyLock<RegexSet> = LazyLock::new(|| compile_set(NOT_FOUND_PATTERNS));
static DELAYS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    DELAY_PATTERNS
        .iter()
        .map(|p| Regex::new(p).expect("delay pattern table is valid"))
        .collect()
});

fn compile_set(patterns: &[&str]) -> RegexSet {
    RegexSet::new(patterns).expect("classification pattern table is valid")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Model retired, misspelled, or not enabled for generation.
    NotFound,
    /// Short-window throttling.
    RateLimited,
    /// Longer-lived quota exhaustion.
    QuotaExhausted,
    Other,
}

impl ErrorKind {
    pub fn is_quota(self) -> bool {
        matches!(self, ErrorKind::RateLimited | ErrorKind::QuotaExhausted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub kind: ErrorKind,
    /// Only extracted for quota-flavoured errors.
    pub suggested_delay: Option<Duration>,
}

pub fn classify(error_text: &str) -> Classification {
    let kind = if QUOTA_EXHAUSTED.is_match(error_text) {
        ErrorKind::QuotaExhausted
    } else if RATE_LIMIT.is_match(error_text) {
        ErrorKind::RateLimited
    } else if NOT_FOUND.is_match(error_text) {
        ErrorKind::NotFound
    } else {
        ErrorKind::Other
    };

    let suggested_delay = if kind.is_quota() {
        extract_retry_delay(error_text)
    } else {
        None
    };

    Classification {
        kind,
        suggested_delay,
    }
}

/// Finds a "retry in N seconds" style hint in a provider message.
pub fn extract_retry_delay(error_text: &str) -> Option<Duration> {
    DELAYS.iter().find_map(|re| {
        let secs: f64 = re.captures(error_text)?.get(1)?.as_str().parse().ok()?;
        if !secs.is_finite() || secs < 0.0 {
            return None;
        }
        Some(Duration::from_secs_f64(secs.min(MAX_EXTRACTED_DELAY_SECS)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_quota_message_is_quota_exhausted() {
        let text = "429 RESOURCE_EXHAUSTED: You exceeded your current quota, \
            please check your plan and billing details. Please retry in 37.5s.";
        let c = classify(text);
        assert_eq!(c.kind, ErrorKind::QuotaExhausted);
        assert_eq!(c.suggested_delay, Some(Duration::from_secs_f64(37.5)));
    }

    #[test]
    fn test_plain_429_is_rate_limited() {
        let c = classify("429 Too Many Requests");
        assert_eq!(c.kind, ErrorKind::RateLimited);
        assert_eq!(c.suggested_delay, None);
    }

    #[test]
    fn test_status_code_needs_word_boundary() {
        let c = classify("request used 14290 tokens and failed validation");
        assert_eq!(c.kind, ErrorKind::Other);
    }

    #[test]
    fn test_model_not_found() {
        let text = "404 NOT_FOUND: models/gemini-pro is not found for API version v1beta, \
            or is not supported for generateContent.";
        let c = classify(text);
        assert_eq!(c.kind, ErrorKind::NotFound);
        assert!(c.suggested_delay.is_none());
    }

    #[test]
    fn test_retired_model_is_not_found() {
        assert_eq!(
            classify("gemini-1.0-pro has been deprecated").kind,
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_other_errors() {
        assert_eq!(classify("HTTP error: connection reset").kind, ErrorKind::Other);
        assert_eq!(
            classify("400 INVALID_ARGUMENT: bad temperature").kind,
            ErrorKind::Other
        );
    }

    #[test]
    fn test_timeouts_and_permission_errors_are_other() {
        for text in [
            "504 DEADLINE_EXCEEDED: Deadline exceeded",
            "403 PERMISSION_DENIED: Billing account for project is disabled",
            "Request payload size exceeded the limit",
        ] {
            let c = classify(text);
            assert_eq!(c.kind, ErrorKind::Other, "{text}");
            assert!(c.suggested_delay.is_none());
        }
    }

    #[test]
    fn test_exceeded_quota_wording_is_quota() {
        assert_eq!(
            classify("You have exceeded your current quota").kind,
            ErrorKind::QuotaExhausted
        );
    }

    #[test]
    fn test_delay_from_retry_in_seconds() {
        assert_eq!(
            extract_retry_delay("rate limit hit, retry in 2 seconds"),
            Some(Duration::from_secs(2))
        );
    }

    #[test]
    fn test_delay_from_retry_delay_field() {
        assert_eq!(
            extract_retry_delay("quota exceeded\nretry_delay {\n  seconds: 14\n}"),
            Some(Duration::from_secs(14))
        );
    }

    #[test]
    fn test_delay_from_retry_after_header_text() {
        assert_eq!(
            extract_retry_delay("rate limited (Retry-After: 30)"),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn test_no_delay_hint() {
        assert_eq!(extract_retry_delay("quota exceeded"), None);
    }

    #[test]
    fn test_absurd_delay_is_bounded() {
        let delay = extract_retry_delay("retry in 99999999999 seconds").unwrap();
        assert_eq!(delay, Duration::from_secs(86_400));
    }
}
