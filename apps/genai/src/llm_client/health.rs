//! Per-model health tracking used to steer fallback selection.
//!
//! Shared by every caller of one client. Entries are updated independently
//! (last write wins); a lost update only makes fallback slightly less
//! efficient, never incorrect.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelHealthState {
    pub failure_count: u32,
    pub last_quota_error: Option<Instant>,
    pub last_used: Option<Instant>,
}

#[derive(Debug)]
pub struct HealthTracker {
    models: DashMap<String, ModelHealthState>,
    cooldown: Duration,
}

impl HealthTracker {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            models: DashMap::new(),
            cooldown,
        }
    }

    pub fn record_use(&self, model: &str, now: Instant) {
        let mut state = self.models.entry(model.to_string()).or_default();
        state.last_used = Some(now);
    }

    pub fn record_failure(&self, model: &str, quota: bool, now: Instant) {
        let mut state = self.models.entry(model.to_string()).or_default();
        state.failure_count = state.failure_count.saturating_add(1);
        if quota {
            state.last_quota_error = Some(now);
        }
    }

    /// True while the model's last quota error is younger than the cooldown window.
    pub fn is_cooling_down(&self, model: &str, now: Instant) -> bool {
        self.models
            .get(model)
            .and_then(|s| s.last_quota_error)
            .is_some_and(|t| now.saturating_duration_since(t) < self.cooldown)
    }

    pub fn last_used(&self, model: &str) -> Option<Instant> {
        self.models.get(model).and_then(|s| s.last_used)
    }

    pub fn failure_count(&self, model: &str) -> u32 {
        self.models.get(model).map(|s| s.failure_count).unwrap_or(0)
    }

    /// Called after any successful generation: failure counts go back to zero
    /// and quota timestamps older than the cooldown are dropped. Recent quota
    /// timestamps survive so the cooldown still holds across requests.
    pub fn reset_after_success(&self, now: Instant) {
        let cooldown = self.cooldown;
        for mut entry in self.models.iter_mut() {
            entry.failure_count = 0;
            if entry
                .last_quota_error
                .is_some_and(|t| now.saturating_duration_since(t) >= cooldown)
            {
                entry.last_quota_error = None;
            }
        }
        self.models
            .retain(|_, s| s.last_quota_error.is_some() || s.last_used.is_some());
    }

    #[cfg(test)]
    pub fn state(&self, model: &str) -> Option<ModelHealthState> {
        self.models.get(model).map(|s| s.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIVE_MINUTES: Duration = Duration::from_secs(300);

    #[test]
    fn test_quota_failure_starts_cooldown() {
        let tracker = HealthTracker::new(FIVE_MINUTES);
        let t0 = Instant::now();
        tracker.record_failure("gemini-1.5-flash", true, t0);

        assert!(tracker.is_cooling_down("gemini-1.5-flash", t0 + Duration::from_secs(299)));
        assert!(!tracker.is_cooling_down("gemini-1.5-flash", t0 + FIVE_MINUTES));
        assert_eq!(tracker.failure_count("gemini-1.5-flash"), 1);
    }

    #[test]
    fn test_non_quota_failure_does_not_cool_down() {
        let tracker = HealthTracker::new(FIVE_MINUTES);
        let t0 = Instant::now();
        tracker.record_failure("gemini-pro", false, t0);

        assert!(!tracker.is_cooling_down("gemini-pro", t0));
        assert_eq!(tracker.failure_count("gemini-pro"), 1);
    }

    #[test]
    fn test_reset_keeps_recent_quota_and_drops_stale() {
        let tracker = HealthTracker::new(FIVE_MINUTES);
        let t0 = Instant::now();
        tracker.record_failure("stale", true, t0);
        tracker.record_failure("recent", true, t0 + Duration::from_secs(200));
        tracker.record_failure("plain", false, t0);

        let now = t0 + Duration::from_secs(301);
        tracker.reset_after_success(now);

        assert!(tracker.state("stale").is_none());
        assert!(tracker.state("plain").is_none());
        let recent = tracker.state("recent").unwrap();
        assert_eq!(recent.failure_count, 0);
        assert!(tracker.is_cooling_down("recent", now));
    }

    #[test]
    fn test_reset_keeps_last_used() {
        let tracker = HealthTracker::new(FIVE_MINUTES);
        let t0 = Instant::now();
        tracker.record_use("gemini-2.0-flash", t0);
        tracker.record_failure("gemini-2.0-flash", false, t0);

        tracker.reset_after_success(t0);

        assert_eq!(tracker.last_used("gemini-2.0-flash"), Some(t0));
        assert_eq!(tracker.failure_count("gemini-2.0-flash"), 0);
    }

    #[test]
    fn test_unknown_model_is_healthy() {
        let tracker = HealthTracker::new(FIVE_MINUTES);
        assert!(!tracker.is_cooling_down("never-seen", Instant::now()));
        assert_eq!(tracker.failure_count("never-seen"), 0);
        assert!(tracker.last_used("never-seen").is_none());
    }
}
