//! Portfolio-level content: SEO keywords, header, meta description, SEO
//! optimization and improvement suggestions.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::llm_client::{GenerationRequest, GenerativeClient};
use crate::services::components::ComponentType;
use crate::services::prompts::{
    HEADER_PROMPT_TEMPLATE, META_DESCRIPTION_PROMPT_TEMPLATE, PORTFOLIO_KEYWORDS_PROMPT_TEMPLATE,
};
use crate::services::resume::ParsedResume;
use crate::services::seo::{analyze_seo, Priority, SeoInput, SeoReport};
use crate::services::{clip, is_blank, join_or};

pub const MAX_MODEL_KEYWORDS: usize = 15;
pub const MAX_TEMPLATE_KEYWORDS: usize = 10;
pub const META_DESCRIPTION_MAX_CHARS: usize = 160;
pub const SUBTITLE_MAX_CHARS: usize = 100;
/// Below this SEO score, meta description and keywords are regenerated.
pub const SEO_REGENERATE_BELOW: u8 = 70;

const ABOUT_COMPONENTS: &[ComponentType] = &[ComponentType::About, ComponentType::AboutMeCard];
const SKILLS_COMPONENTS: &[ComponentType] = &[ComponentType::Skills, ComponentType::SkillsCloud];

/// One block of a portfolio page; `content` is component-specific JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioComponent {
    pub component_type: String,
    #[serde(default)]
    pub content: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioOverview {
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_template")]
    pub template_type: String,
    #[serde(default)]
    pub components: Vec<PortfolioComponent>,
    #[serde(default)]
    pub seo_title: String,
    #[serde(default, alias = "meta_description")]
    pub seo_description: String,
    /// Comma separated.
    #[serde(default, alias = "meta_keywords")]
    pub seo_keywords: String,
    #[serde(default)]
    pub profile_photo: String,
}

fn default_template() -> String {
    "modern".to_string()
}

impl PortfolioOverview {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            template_type: default_template(),
            components: Vec::new(),
            seo_title: String::new(),
            seo_description: String::new(),
            seo_keywords: String::new(),
            profile_photo: String::new(),
        }
    }

    fn has_component(&self, kinds: &[ComponentType]) -> bool {
        self.components
            .iter()
            .filter_map(|c| c.kind())
            .any(|kind| kinds.contains(&kind))
    }

    /// SEO fields with the title standing in for a missing SEO title.
    fn seo_input(&self) -> SeoInput {
        let content_text = format!("{} {} {}", self.title, self.bio(), self.skills().join(" "));
        SeoInput {
            title: match self.seo_title.trim() {
                "" => self.title.clone(),
                title => title.to_string(),
            },
            description: self.seo_description.clone(),
            keywords: self.seo_keywords.clone(),
            content_text: content_text.trim().to_string(),
            ..SeoInput::default()
        }
    }

    /// Bio text of the last about-style component.
    pub fn bio(&self) -> String {
        self.components
            .iter()
            .filter(|c| c.kind().is_some_and(|k| ABOUT_COMPONENTS.contains(&k)))
            .filter_map(|c| c.content.get("bio").and_then(Value::as_str))
            .last()
            .unwrap_or_default()
            .to_string()
    }

    /// Skills of the last skills-style component.
    pub fn skills(&self) -> Vec<String> {
        self.components
            .iter()
            .filter(|c| c.kind().is_some_and(|k| SKILLS_COMPONENTS.contains(&k)))
            .filter_map(|c| c.content.get("skills").and_then(Value::as_array))
            .last()
            .map(|skills| {
                skills
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl PortfolioComponent {
    /// `None` for component types this crate does not know.
    pub fn kind(&self) -> Option<ComponentType> {
        self.component_type.parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderContent {
    pub title: String,
    pub subtitle: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Keywords
// ────────────────────────────────────────────────────────────────────────────

pub async fn generate_portfolio_keywords(
    client: &GenerativeClient,
    portfolio: &PortfolioOverview,
) -> Vec<String> {
    let skills = portfolio.skills();

    if !client.is_configured().await {
        return template_keywords(portfolio, &skills);
    }

    let content_summary = format!("{} {} {}", portfolio.title, portfolio.bio(), skills.join(" "));
    let prompt = PORTFOLIO_KEYWORDS_PROMPT_TEMPLATE
        .replace("{title}", &portfolio.title)
        .replace("{template_type}", &portfolio.template_type)
        .replace("{skills}", &join_or(&skills, 10, "Not specified"))
        .replace("{content_summary}", &clip(content_summary.trim(), 500));

    let value = match client
        .generate_structured(&GenerationRequest::structured(prompt))
        .await
    {
        Ok(value) => value,
        Err(e) => {
            warn!("Keyword generation failed, using template keywords: {e}");
            return template_keywords(portfolio, &skills);
        }
    };

    let keywords = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("keywords") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    let keywords = dedup_keywords(
        keywords.iter().filter_map(Value::as_str).map(str::to_string),
        MAX_MODEL_KEYWORDS,
    );

    if keywords.is_empty() {
        warn!("Keyword generation returned nothing usable, using template keywords");
        return template_keywords(portfolio, &skills);
    }
    keywords
}

fn template_keywords(portfolio: &PortfolioOverview, skills: &[String]) -> Vec<String> {
    let from_title = portfolio
        .title
        .split_whitespace()
        .take(5)
        .map(str::to_string);
    let from_skills = skills.iter().take(5).cloned();
    let fixed = [portfolio.template_type.as_str(), "portfolio", "professional"]
        .into_iter()
        .map(str::to_string);

    dedup_keywords(from_title.chain(from_skills).chain(fixed), MAX_TEMPLATE_KEYWORDS)
}

/// Lowercased, trimmed, first occurrence kept, at most `limit`.
fn dedup_keywords(keywords: impl Iterator<Item = String>, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    keywords
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty() && seen.insert(k.clone()))
        .take(limit)
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Header
// ────────────────────────────────────────────────────────────────────────────

pub async fn generate_header_content(
    client: &GenerativeClient,
    resume: &ParsedResume,
    template_type: &str,
) -> HeaderContent {
    let name = match resume.name.trim() {
        "" => "Professional".to_string(),
        name => name.to_string(),
    };
    let title = professional_title(resume);

    if !client.is_configured().await {
        let subtitle = if resume.experience.is_empty() {
            clip(&title, SUBTITLE_MAX_CHARS)
        } else {
            format!("{} | Portfolio", clip(&title, SUBTITLE_MAX_CHARS))
        };
        return HeaderContent { title: name, subtitle };
    }

    let experience = resume
        .experience
        .iter()
        .take(3)
        .map(|e| e.title.clone())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>();
    let prompt = HEADER_PROMPT_TEMPLATE
        .replace("{template_type}", template_type)
        .replace("{name}", &name)
        .replace("{title}", &title)
        .replace("{experience}", &join_or(&experience, 3, "Not specified"));

    let fallback = HeaderContent {
        title: name.clone(),
        subtitle: clip(&title, SUBTITLE_MAX_CHARS),
    };

    match client
        .generate_structured(&GenerationRequest::structured(prompt))
        .await
    {
        Ok(value) => match value.get("subtitle").and_then(Value::as_str) {
            Some(subtitle) if !subtitle.trim().is_empty() => HeaderContent {
                title: value
                    .get("title")
                    .and_then(Value::as_str)
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or(name.as_str())
                    .to_string(),
                subtitle: clip(subtitle.trim(), SUBTITLE_MAX_CHARS),
            },
            _ => fallback,
        },
        Err(e) => {
            warn!("Header generation failed, using resume title: {e}");
            fallback
        }
    }
}

/// Latest job title, else the first sentence of the summary, else "Professional".
fn professional_title(resume: &ParsedResume) -> String {
    if let Some(title) = resume.latest_title() {
        return title.to_string();
    }
    match resume.summary.split('.').next().map(str::trim) {
        Some(sentence) if !sentence.is_empty() => clip(sentence, SUBTITLE_MAX_CHARS),
        _ => "Professional".to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Meta description
// ────────────────────────────────────────────────────────────────────────────

/// SEO meta description, at most `META_DESCRIPTION_MAX_CHARS`.
pub async fn generate_meta_description(client: &GenerativeClient, portfolio: &PortfolioOverview) -> String {
    let bio = portfolio.bio();

    if !client.is_configured().await {
        let mut description = format!("{} - Professional portfolio", portfolio.title);
        if !bio.trim().is_empty() {
            description.push_str(&format!(". {}", clip(bio.trim(), 100)));
        }
        return clip(&description, META_DESCRIPTION_MAX_CHARS);
    }

    let bio_summary = match bio.trim() {
        "" => "Professional portfolio".to_string(),
        bio => clip(bio, 200),
    };
    let prompt = META_DESCRIPTION_PROMPT_TEMPLATE
        .replace("{title}", &portfolio.title)
        .replace("{template_type}", &portfolio.template_type)
        .replace("{bio}", &bio_summary)
        .replace("{skills}", &join_or(&portfolio.skills(), 5, "Various skills"));

    let request = GenerationRequest::text(prompt).with_max_output_tokens(200);
    match client.generate_text(&request).await {
        Ok(description) if !description.trim().is_empty() => {
            clip(description.trim().trim_matches('"'), META_DESCRIPTION_MAX_CHARS)
        }
        Ok(_) => template_meta_description(portfolio),
        Err(e) => {
            warn!("Meta description generation failed: {e}");
            template_meta_description(portfolio)
        }
    }
}

fn template_meta_description(portfolio: &PortfolioOverview) -> String {
    clip(
        &format!(
            "{} - Professional portfolio showcasing skills and experience",
            portfolio.title
        ),
        META_DESCRIPTION_MAX_CHARS,
    )
}

// ────────────────────────────────────────────────────────────────────────────
// SEO optimization
// ────────────────────────────────────────────────────────────────────────────

/// Replacement SEO fields; `None` where the current value is kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OptimizedSeo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    /// Comma separated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_keywords: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeoOptimization {
    pub analysis: SeoReport,
    pub optimized: OptimizedSeo,
}

/// Analyzes the portfolio's SEO and, when a model is available, regenerates
/// the meta description and keywords that are missing or score poorly.
pub async fn optimize_seo_content(
    client: &GenerativeClient,
    portfolio: &PortfolioOverview,
) -> SeoOptimization {
    let input = portfolio.seo_input();
    let analysis = analyze_seo(client, &input).await;
    let mut optimized = OptimizedSeo::default();

    if client.is_configured().await {
        let weak = analysis.score < SEO_REGENERATE_BELOW;
        if weak || input.description.trim().is_empty() {
            optimized.meta_description = Some(generate_meta_description(client, portfolio).await);
        }
        if weak || input.keywords.trim().is_empty() {
            let keywords = generate_portfolio_keywords(client, portfolio).await;
            optimized.meta_keywords = Some(keywords.join(", "));
        }
    }

    SeoOptimization {
        analysis,
        optimized,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Improvement suggestions
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    MissingComponent,
    EmptyContent,
    Seo,
    Profile,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    pub priority: Priority,
    pub message: String,
    /// Machine-readable action id, e.g. `add_header`.
    pub action: String,
}

impl Suggestion {
    fn new(
        kind: SuggestionKind,
        component: Option<&str>,
        priority: Priority,
        message: &str,
        action: &str,
    ) -> Self {
        Self {
            kind,
            component: component.map(str::to_string),
            priority,
            message: message.to_string(),
            action: action.to_string(),
        }
    }
}

/// Sections that should exist, with the component types that satisfy each.
const REQUIRED_SECTIONS: &[(&str, &[ComponentType], &str, &str)] = &[
    (
        "header",
        &[ComponentType::Header, ComponentType::HeroBanner],
        "Consider adding a header or hero banner component to your portfolio",
        "add_header",
    ),
    (
        "about",
        ABOUT_COMPONENTS,
        "Consider adding an about section to your portfolio",
        "add_about",
    ),
    (
        "contact",
        &[ComponentType::Contact, ComponentType::ContactForm],
        "Consider adding a contact section to your portfolio",
        "add_contact",
    ),
];

/// Rule-based checks for missing sections, empty components, SEO fields and
/// a profile photo. Needs no model.
pub fn suggest_improvements(portfolio: &PortfolioOverview) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();

    for &(section, kinds, message, action) in REQUIRED_SECTIONS {
        if !portfolio.has_component(kinds) {
            suggestions.push(Suggestion::new(
                SuggestionKind::MissingComponent,
                Some(section),
                Priority::High,
                message,
                action,
            ));
        }
    }

    for component in &portfolio.components {
        let Some(kind) = component.kind() else {
            continue;
        };
        let (field, priority, message, action) = match kind {
            ComponentType::About | ComponentType::AboutMeCard => (
                "bio",
                Priority::High,
                "About section is empty. Add a bio to introduce yourself.",
                "fill_about",
            ),
            ComponentType::Skills | ComponentType::SkillsCloud => (
                "skills",
                Priority::Medium,
                "Skills section is empty. Add your key skills.",
                "fill_skills",
            ),
            ComponentType::Projects | ComponentType::ProjectGrid => (
                "projects",
                Priority::Medium,
                "Projects section is empty. Showcase your work.",
                "fill_projects",
            ),
            _ => continue,
        };
        if component.content.get(field).map_or(true, is_blank) {
            suggestions.push(Suggestion::new(
                SuggestionKind::EmptyContent,
                Some(kind.as_str()),
                priority,
                message,
                action,
            ));
        }
    }

    if portfolio.seo_description.trim().is_empty() {
        suggestions.push(Suggestion::new(
            SuggestionKind::Seo,
            None,
            Priority::Medium,
            "Add a meta description for better SEO",
            "add_meta_description",
        ));
    }
    if portfolio.seo_keywords.trim().is_empty() {
        suggestions.push(Suggestion::new(
            SuggestionKind::Seo,
            None,
            Priority::Low,
            "Add keywords for better SEO",
            "add_keywords",
        ));
    }
    if portfolio.profile_photo.trim().is_empty() {
        suggestions.push(Suggestion::new(
            SuggestionKind::Profile,
            None,
            Priority::Low,
            "Add a profile photo to personalize your portfolio",
            "add_profile_photo",
        ));
    }

    suggestions
}
