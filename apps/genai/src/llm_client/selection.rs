//! Model ranking: which model to start with, and which to fall back to.
//!
//! Pure functions over the discovered model list, the static preference
//! order and the health tracker, so the ordering rules are testable without
//! a provider.

use std::collections::HashSet;

use tokio::time::Instant;

use crate::llm_client::health::HealthTracker;
use crate::llm_client::provider::{qualified_id, short_id, ModelCandidate};

/// Identifier fragments marking a release as experimental.
const EXPERIMENTAL_MARKERS: &[&str] = &["exp", "experimental", "preview", "beta"];

pub fn is_experimental(model: &str) -> bool {
    let model = model.to_lowercase();
    EXPERIMENTAL_MARKERS.iter().any(|m| model.contains(m))
}

/// Picks the model to start with from what the provider reports:
/// 1. the first entry of the preference order that is available
/// 2. else the first available model that is not experimental
/// 3. else the first available model
pub fn pick_initial<'a>(
    available: &'a [ModelCandidate],
    preferred: &[String],
) -> Option<&'a ModelCandidate> {
    preferred
        .iter()
        .find_map(|p| available.iter().find(|m| m.id == short_id(p)))
        .or_else(|| available.iter().find(|m| !is_experimental(&m.id)))
        .or_else(|| available.first())
}

/// Full initialization order: every available model in `pick_initial`
/// order, then the well-known identifiers in qualified and short form.
pub fn initial_candidates(
    available: &[ModelCandidate],
    preferred: &[String],
    well_known: &[String],
) -> Vec<String> {
    let mut remaining: Vec<ModelCandidate> = available.to_vec();
    let mut order = Vec::with_capacity(available.len() + well_known.len() * 2);

    while let Some(next) = pick_initial(&remaining, preferred).cloned() {
        remaining.retain(|m| m.id != next.id);
        order.push(next.id);
    }

    for model in well_known {
        order.push(qualified_id(model));
        order.push(short_id(model).to_string());
    }

    let mut seen = HashSet::new();
    order.retain(|m| seen.insert(m.clone()));
    order
}

/// Ranks fallback candidates after a failure.
///
/// Preferred models come first, in preference order. Other discovered models
/// follow, least recently used first. Models already tried in this request
/// and models cooling down from a quota error are excluded. When discovery
/// returned nothing the preference list is used as-is.
pub fn rank_fallbacks(
    preferred: &[String],
    discovered: &[ModelCandidate],
    tried: &HashSet<String>,
    health: &HealthTracker,
    now: Instant,
) -> Vec<String> {
    let eligible = |id: &str| !tried.contains(id) && !health.is_cooling_down(id, now);

    let preferred_tier = preferred
        .iter()
        .map(|p| short_id(p).to_string())
        .filter(|id| discovered.is_empty() || discovered.iter().any(|m| &m.id == id));

    let mut ranked: Vec<String> = Vec::new();
    for id in preferred_tier {
        if eligible(id.as_str()) && !ranked.contains(&id) {
            ranked.push(id);
        }
    }

    let mut rest: Vec<&ModelCandidate> = discovered
        .iter()
        .filter(|m| !ranked.contains(&m.id) && eligible(m.id.as_str()))
        .filter(|m| !preferred.iter().any(|p| short_id(p) == m.id))
        .collect();
    // None (never used) sorts first.
    rest.sort_by_key(|m| health.last_used(&m.id));

    ranked.extend(rest.into_iter().map(|m| m.id.clone()));
    ranked
}
