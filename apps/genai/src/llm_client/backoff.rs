//! Delay policy for retrying the same model after a quota error.

use std::time::Duration;

use rand::Rng;

use crate::llm_client::classify::{Classification, ErrorKind};

#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Default wait after a rate-limit error that carried no hint.
    pub rate_limit_delay: Duration,
    /// Default wait after a quota-exhaustion error that carried no hint.
    pub quota_delay: Duration,
    /// Absolute cap, jitter included.
    pub max_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            rate_limit_delay: Duration::from_secs(10),
            quota_delay: Duration::from_secs(60),
            max_delay: Duration::from_secs(120),
            max_jitter: Duration::from_millis(1000),
        }
    }
}

impl BackoffPolicy {
    /// Delay before retrying after `classification`: the provider's hint when
    /// present, otherwise the default for its kind, plus jitter, capped.
    pub fn delay_for(&self, classification: &Classification) -> Duration {
        let base = classification
            .suggested_delay
            .unwrap_or(match classification.kind {
                ErrorKind::RateLimited => self.rate_limit_delay,
                _ => self.quota_delay,
            });
        self.cap(base + self.jitter())
    }

    /// Wait honoured before switching to a fallback model. Only an explicit
    /// provider hint causes a wait here.
    pub fn hinted_delay(&self, classification: &Classification) -> Option<Duration> {
        classification.suggested_delay.map(|d| self.cap(d))
    }

    fn cap(&self, delay: Duration) -> Duration {
        delay.min(self.max_delay)
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }
}
