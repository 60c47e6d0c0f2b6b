//! Resume structuring: raw resume text in, typed resume out.
//!
//! Text extraction from PDF/DOCX happens upstream; this module only sees text.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::llm_client::{GenerationRequest, GenerativeClient};
use crate::services::prompts::RESUME_STRUCTURE_PROMPT_TEMPLATE;
use crate::services::{clip, null_as_default};

/// Resume text beyond this is not sent to the model.
const MAX_PROMPT_RESUME_CHARS: usize = 4000;
/// Summary length used when structuring falls back to raw text.
const FALLBACK_SUMMARY_CHARS: usize = 500;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceEntry {
    #[serde(deserialize_with = "null_as_default", alias = "position")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub company: String,
    #[serde(deserialize_with = "null_as_default")]
    pub start_date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub end_date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationEntry {
    #[serde(deserialize_with = "null_as_default")]
    pub degree: String,
    #[serde(deserialize_with = "null_as_default")]
    pub institution: String,
    #[serde(deserialize_with = "null_as_default")]
    pub year: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Certification {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub issuer: String,
    #[serde(deserialize_with = "null_as_default")]
    pub date: String,
    pub expiry: Option<String>,
}

/// Structured resume as produced by the model (or the raw-text fallback).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedResume {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(deserialize_with = "null_as_default")]
    pub experience: Vec<ExperienceEntry>,
    #[serde(deserialize_with = "null_as_default")]
    pub education: Vec<EducationEntry>,
    #[serde(deserialize_with = "null_as_default")]
    pub skills: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub certifications: Vec<Certification>,
}

impl ParsedResume {
    /// Skeleton resume whose summary is the start of the raw text.
    pub fn from_raw_text(raw_text: &str) -> Self {
        Self {
            summary: clip(raw_text.trim(), FALLBACK_SUMMARY_CHARS),
            ..Self::default()
        }
    }

    /// Title of the most recent role, if any.
    pub fn latest_title(&self) -> Option<&str> {
        self.experience
            .first()
            .map(|e| e.title.trim())
            .filter(|t| !t.is_empty())
    }
}

pub async fn structure_resume(client: &GenerativeClient, raw_text: &str) -> ParsedResume {
    if !client.is_configured().await {
        return ParsedResume::from_raw_text(raw_text);
    }

    let prompt = RESUME_STRUCTURE_PROMPT_TEMPLATE
        .replace("{resume_text}", &clip(raw_text, MAX_PROMPT_RESUME_CHARS));
    let request = GenerationRequest::structured(prompt).with_max_output_tokens(2000);

    let value = match client.generate_structured(&request).await {
        Ok(value) => value,
        Err(e) => {
            warn!("Resume structuring failed, using raw text: {e}");
            return ParsedResume::from_raw_text(raw_text);
        }
    };

    match serde_json::from_value::<ParsedResume>(value) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Structured resume did not match the expected shape: {e}");
            ParsedResume::from_raw_text(raw_text)
        }
    }
}
