//! SEO review of portfolio content.
//!
//! Rule-based checks always run. When a model is available its review is
//! merged in: recommendations appended, density and scores taken from the
//! model where it supplies them.

use std::collections::{BTreeMap, HashMap};
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::llm_client::{GenerationRequest, GenerativeClient};
use crate::services::null_as_default;
use crate::services::prompts::SEO_REVIEW_PROMPT_TEMPLATE;

const TITLE_CHARS: RangeInclusive<usize> = 30..=60;
const DESCRIPTION_CHARS: RangeInclusive<usize> = 120..=160;
const MIN_CONTENT_CHARS: usize = 300;
/// Used until a model supplies a real readability score.
const DEFAULT_READABILITY: u8 = 70;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkCounts {
    pub internal: u32,
    pub external: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeoInput {
    pub title: String,
    pub description: String,
    /// Comma separated.
    pub keywords: String,
    pub content_text: String,
    /// Image source to alt text, passed through to the report.
    pub image_alt_text: HashMap<String, String>,
    pub links: LinkCounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    #[serde(other)]
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeoRecommendation {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    pub message: String,
    #[serde(default = "default_priority")]
    pub priority: Priority,
}

fn default_priority() -> Priority {
    Priority::Medium
}

impl SeoRecommendation {
    fn new(kind: &str, message: &str, priority: Priority) -> Self {
        Self {
            kind: kind.to_string(),
            message: message.to_string(),
            priority,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetaTags {
    pub title: bool,
    pub description: bool,
    pub keywords: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeoReport {
    /// 0..=100
    pub score: u8,
    pub recommendations: Vec<SeoRecommendation>,
    /// Keyword to occurrences per 100 words.
    pub keyword_density: BTreeMap<String, f64>,
    pub meta_tags: MetaTags,
    pub content_length: usize,
    pub readability_score: u8,
    pub image_alt_text: HashMap<String, String>,
    pub links: LinkCounts,
}

/// Shape of the model's review. Everything is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ModelReview {
    score: Option<f64>,
    recommendations: Vec<Value>,
    keyword_density: BTreeMap<String, Value>,
    readability_score: Option<f64>,
}

pub async fn analyze_seo(client: &GenerativeClient, input: &SeoInput) -> SeoReport {
    let mut report = rule_based_report(input);

    if !client.is_configured().await {
        return report;
    }

    let prompt = SEO_REVIEW_PROMPT_TEMPLATE
        .replace("{title}", &input.title)
        .replace("{description}", &input.description)
        .replace("{keywords}", &input.keywords)
        .replace("{content_length}", &report.content_length.to_string());
    let request = GenerationRequest::structured(prompt);

    match client.generate_structured(&request).await {
        Ok(value) => match serde_json::from_value::<ModelReview>(value) {
            Ok(review) => merge_review(&mut report, review),
            Err(e) => warn!("SEO review did not match the expected shape: {e}"),
        },
        Err(e) => warn!("SEO review generation failed, keeping rule-based report: {e}"),
    }
    report
}

fn rule_based_report(input: &SeoInput) -> SeoReport {
    let mut recommendations = Vec::new();
    let mut score: i32 = 100;

    let title_len = input.title.trim().chars().count();
    if title_len == 0 {
        recommendations.push(SeoRecommendation::new("meta_title", "Missing SEO title", Priority::High));
        score -= 20;
    } else if !TITLE_CHARS.contains(&title_len) {
        let message = if title_len < *TITLE_CHARS.start() {
            "SEO title is too short (recommended: 30-60 characters)"
        } else {
            "SEO title is too long (recommended: 30-60 characters)"
        };
        recommendations.push(SeoRecommendation::new("meta_title", message, Priority::Medium));
        score -= 5;
    }

    let description_len = input.description.trim().chars().count();
    if description_len == 0 {
        recommendations.push(SeoRecommendation::new(
            "meta_description",
            "Missing meta description",
            Priority::High,
        ));
        score -= 15;
    } else if !DESCRIPTION_CHARS.contains(&description_len) {
        let message = if description_len < *DESCRIPTION_CHARS.start() {
            "Meta description is too short (recommended: 120-160 characters)"
        } else {
            "Meta description is too long (recommended: 120-160 characters)"
        };
        recommendations.push(SeoRecommendation::new("meta_description", message, Priority::Medium));
        score -= 5;
    }

    let has_keywords = !input.keywords.trim().is_empty();
    if !has_keywords {
        recommendations.push(SeoRecommendation::new("meta_keywords", "Missing meta keywords", Priority::Low));
        score -= 5;
    }

    let content_length = input.content_text.chars().count();
    if content_length < MIN_CONTENT_CHARS {
        recommendations.push(SeoRecommendation::new(
            "content_length",
            "Content is too short (recommended: at least 300 characters)",
            Priority::Medium,
        ));
        score -= 10;
    }

    SeoReport {
        score: score.clamp(0, 100) as u8,
        recommendations,
        keyword_density: keyword_density(&input.keywords, &input.content_text),
        meta_tags: MetaTags {
            title: title_len > 0,
            description: description_len > 0,
            keywords: has_keywords,
        },
        content_length,
        readability_score: DEFAULT_READABILITY,
        image_alt_text: input.image_alt_text.clone(),
        links: input.links.clone(),
    }
}

/// Occurrences of each keyword per 100 words of content, rounded to 2 places.
fn keyword_density(keywords: &str, content: &str) -> BTreeMap<String, f64> {
    let word_count = content.split_whitespace().count();
    if word_count == 0 {
        return BTreeMap::new();
    }
    let content = content.to_lowercase();

    keywords
        .split(',')
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .map(|keyword| {
            let count = content.matches(keyword.as_str()).count();
            let density = count as f64 / word_count as f64 * 100.0;
            (keyword, round2(density))
        })
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn merge_review(report: &mut SeoReport, review: ModelReview) {
    report.recommendations.extend(
        review
            .recommendations
            .into_iter()
            .filter_map(|r| serde_json::from_value::<SeoRecommendation>(r).ok()),
    );
    report.keyword_density.extend(
        review
            .keyword_density
            .into_iter()
            .filter_map(|(k, v)| v.as_f64().map(|d| (k.to_lowercase(), round2(d)))),
    );
    if let Some(readability) = review.readability_score {
        report.readability_score = clamp_score(readability);
    }
    if let Some(score) = review.score {
        report.score = clamp_score(score);
    }
}

fn clamp_score(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::{client_on, ScriptedProvider};

    fn good_input() -> SeoInput {
        SeoInput {
            title: "Jane Doe | Backend Engineer Portfolio".to_string(),
            description: "d".repeat(140),
            keywords: "rust, backend".to_string(),
            content_text: "I build backend systems in Rust. ".repeat(20),
            ..SeoInput::default()
        }
    }

    #[test]
    fn test_empty_input_scores_penalties() {
        let report = rule_based_report(&SeoInput::default());
        // 100 - 20 (title) - 15 (description) - 5 (keywords) - 10 (content)
        assert_eq!(report.score, 50);
        assert_eq!(report.recommendations.len(), 4);
        assert_eq!(report.recommendations[0].priority, Priority::High);
        assert_eq!(
            report.meta_tags,
            MetaTags {
                title: false,
                description: false,
                keywords: false
            }
        );
        assert!(report.keyword_density.is_empty());
    }

    #[test]
    fn test_good_input_has_no_recommendations() {
        let report = rule_based_report(&good_input());
        assert_eq!(report.score, 100);
        assert!(report.recommendations.is_empty());
        assert_eq!(report.readability_score, DEFAULT_READABILITY);
    }

    #[test]
    fn test_length_bounds() {
        let mut input = good_input();
        input.title = "Short".to_string();
        input.description = "d".repeat(200);
        let report = rule_based_report(&input);

        assert_eq!(report.score, 90);
        assert!(report.recommendations[0].message.contains("too short"));
        assert!(report.recommendations[1].message.contains("too long"));
    }

    #[test]
    fn test_keyword_density() {
        let density = keyword_density("Rust, , go", "rust is fast and Rust is safe");
        assert_eq!(density.get("rust"), Some(&28.57));
        assert_eq!(density.get("go"), Some(&0.0));
        assert_eq!(density.len(), 2);
        assert!(keyword_density("rust", "   ").is_empty());
    }

    #[tokio::test]
    async fn test_model_review_is_merged() {
        let reply = r#"{
            "score": 82.4,
            "recommendations": [
                {"type": "content", "message": "Add project case studies", "priority": "high"},
                {"message": "no priority given"},
                "not an object"
            ],
            "keyword_density": {"Backend": 1.234, "bad": "n/a"},
            "readability_score": 140
        }"#;
        let client = client_on(ScriptedProvider::with_models(&["m"]).then_ok("m", reply));

        let report = analyze_seo(&client, &good_input()).await;

        assert_eq!(report.score, 82);
        assert_eq!(report.readability_score, 100);
        assert_eq!(report.recommendations.len(), 2);
        assert_eq!(report.recommendations[1].priority, Priority::Medium);
        assert_eq!(report.keyword_density.get("backend"), Some(&1.23));
        assert!(!report.keyword_density.contains_key("bad"));
    }

    #[tokio::test]
    async fn test_failed_review_keeps_rule_based_report() {
        let client = client_on(
            ScriptedProvider::with_models(&["m"]).then_err("m", "500 INTERNAL: backend error"),
        );
        let report = analyze_seo(&client, &SeoInput::default()).await;
        assert_eq!(report.score, 50);
    }

    #[tokio::test]
    async fn test_unconfigured_is_rule_based() {
        let report = analyze_seo(&GenerativeClient::unconfigured(), &good_input()).await;
        assert_eq!(report.score, 100);
    }
}
