//! Skill extraction from resume text.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::llm_client::{GenerationRequest, GenerativeClient};
use crate::services::clip;
use crate::services::prompts::SKILL_EXTRACTION_PROMPT_TEMPLATE;

/// Resume text beyond this is not sent to the model.
const MAX_PROMPT_RESUME_CHARS: usize = 3000;
/// Cap on skills found by keyword matching.
const MAX_KEYWORD_SKILLS: usize = 20;
/// Confidence assigned to keyword matches.
const KEYWORD_CONFIDENCE: f32 = 0.6;

/// Technologies recognized without a model, with their display names.
const TECHNICAL_KEYWORDS: &[(&str, &str)] = &[
    ("python", "Python"),
    ("javascript", "JavaScript"),
    ("typescript", "TypeScript"),
    ("react", "React"),
    ("django", "Django"),
    ("node", "Node"),
    ("rust", "Rust"),
    ("sql", "SQL"),
    ("html", "HTML"),
    ("css", "CSS"),
    ("java", "Java"),
    ("c++", "C++"),
    ("git", "Git"),
    ("docker", "Docker"),
    ("kubernetes", "Kubernetes"),
    ("aws", "AWS"),
    ("linux", "Linux"),
    ("api", "API"),
    ("rest", "REST"),
    ("graphql", "GraphQL"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillCategory {
    Technical,
    Soft,
    Language,
    Framework,
    Tool,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSkill {
    pub name: String,
    #[serde(default = "default_category")]
    pub category: SkillCategory,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

fn default_category() -> SkillCategory {
    SkillCategory::Other
}

fn default_confidence() -> f32 {
    0.5
}

/// Classified skills found in `resume_text`. Falls back to keyword matching
/// when no model is available or the model's answer is unusable.
pub async fn extract_skills(client: &GenerativeClient, resume_text: &str) -> Vec<ExtractedSkill> {
    if !client.is_configured().await {
        return keyword_skills(resume_text);
    }

    let prompt = SKILL_EXTRACTION_PROMPT_TEMPLATE
        .replace("{resume_text}", &clip(resume_text, MAX_PROMPT_RESUME_CHARS));
    let request = GenerationRequest::structured(prompt);

    match client.generate_structured(&request).await {
        Ok(value) => match skills_from_value(value) {
            Some(skills) => skills,
            None => {
                warn!("Skill extraction returned an unexpected shape, using keyword matching");
                keyword_skills(resume_text)
            }
        },
        Err(e) => {
            warn!("Skill extraction failed, using keyword matching: {e}");
            keyword_skills(resume_text)
        }
    }
}

/// Accepts a bare array or `{"skills": [...]}`. Malformed entries are dropped.
fn skills_from_value(value: Value) -> Option<Vec<ExtractedSkill>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("skills") {
            Some(Value::Array(items)) => items,
            _ => return None,
        },
        _ => return None,
    };

    let total = items.len();
    let skills: Vec<ExtractedSkill> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<ExtractedSkill>(item).ok())
        .filter(|s| !s.name.trim().is_empty())
        .map(|mut s| {
            s.confidence = s.confidence.clamp(0.0, 1.0);
            s
        })
        .collect();

    if skills.len() < total {
        debug!("Dropped {} malformed skill entries", total - skills.len());
    }
    Some(skills)
}

fn keyword_skills(resume_text: &str) -> Vec<ExtractedSkill> {
    let lower = resume_text.to_lowercase();
    TECHNICAL_KEYWORDS
        .iter()
        .filter(|(keyword, _)| contains_word(&lower, keyword))
        .take(MAX_KEYWORD_SKILLS)
        .map(|(_, name)| ExtractedSkill {
            name: name.to_string(),
            category: SkillCategory::Technical,
            confidence: KEYWORD_CONFIDENCE,
        })
        .collect()
}

/// `needle` occurs in `haystack` not flanked by alphanumerics
/// (so "java" does not match inside "javascript").
fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
