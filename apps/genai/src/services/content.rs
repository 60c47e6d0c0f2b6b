//! Bio, project and blog content.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::llm_client::{GenerationRequest, GenerativeClient};
use crate::services::prompts::{
    BIO_PROMPT_TEMPLATE, BLOG_EXCERPT_PROMPT_TEMPLATE, BLOG_FROM_OUTLINE_PROMPT_TEMPLATE,
    BLOG_FROM_TOPIC_PROMPT_TEMPLATE, BLOG_OUTLINE_PROMPT_TEMPLATE,
    PROJECT_DESCRIPTION_PROMPT_TEMPLATE, PROJECT_SUMMARY_FROM_DESCRIPTION_TEMPLATE,
    PROJECT_SUMMARY_FROM_TECHNOLOGIES_TEMPLATE,
};
use crate::services::resume::ParsedResume;
use crate::services::text::{improve_text, ImproveOptions};
use crate::services::{clip, clip_with_ellipsis, join_or, null_as_default};

/// Hard limit on project short descriptions.
pub const SHORT_DESCRIPTION_MAX_CHARS: usize = 300;
/// Default excerpt length for blog posts.
pub const DEFAULT_EXCERPT_CHARS: usize = 300;
/// Blog content beyond this is not sent when asking for an excerpt.
const EXCERPT_CONTEXT_CHARS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineSection {
    #[serde(default, deserialize_with = "null_as_default")]
    pub heading: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogOutline {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    pub sections: Vec<OutlineSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectContent {
    pub description: String,
    pub short_description: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Bio
// ────────────────────────────────────────────────────────────────────────────

/// "About me" text for a portfolio.
pub async fn generate_bio(client: &GenerativeClient, resume: &ParsedResume) -> String {
    if !client.is_configured().await {
        return template_bio(resume);
    }

    let experience = resume
        .experience
        .iter()
        .map(|e| format!("{} at {}", e.title, e.company))
        .collect::<Vec<_>>();
    let prompt = BIO_PROMPT_TEMPLATE
        .replace("{name}", display_name(resume))
        .replace("{summary}", &resume.summary)
        .replace("{experience}", &join_or(&experience, usize::MAX, "Not specified"))
        .replace("{skills}", &join_or(&resume.skills, usize::MAX, "Not specified"));

    let request = GenerationRequest::text(prompt).with_max_output_tokens(500);
    match client.generate_text(&request).await {
        Ok(bio) => bio,
        Err(e) => {
            warn!("Bio generation failed, using template: {e}");
            template_bio(resume)
        }
    }
}

fn display_name(resume: &ParsedResume) -> &str {
    match resume.name.trim() {
        "" => "Professional",
        name => name,
    }
}

fn template_bio(resume: &ParsedResume) -> String {
    let summary = match resume.summary.trim() {
        "" => "With a strong foundation in technology and a commitment to continuous learning, \
               I strive to deliver impactful solutions.",
        summary => summary,
    };
    format!(
        "I am {}, a dedicated professional with a passion for excellence.\n\n{summary}\n\n\
         My expertise spans {}, and I am always eager to take on new challenges \
         and contribute to innovative projects.",
        display_name(resume),
        join_or(&resume.skills, 5, "various technologies"),
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Projects
// ────────────────────────────────────────────────────────────────────────────

pub async fn generate_project_description(
    client: &GenerativeClient,
    title: &str,
    technologies: &[String],
    skills: &[String],
) -> String {
    if !client.is_configured().await {
        return template_project_description(title, technologies, skills);
    }

    let prompt = PROJECT_DESCRIPTION_PROMPT_TEMPLATE
        .replace("{title}", title)
        .replace("{technologies}", &join_or(technologies, usize::MAX, "Modern web technologies"))
        .replace("{skills}", &join_or(skills, usize::MAX, "Software development"));

    let request = GenerationRequest::text(prompt).with_max_output_tokens(400);
    match client.generate_text(&request).await {
        Ok(description) => description.trim().to_string(),
        Err(e) => {
            warn!("Project description generation failed for {title:?}: {e}");
            template_project_description(title, technologies, skills)
        }
    }
}

fn template_project_description(title: &str, technologies: &[String], skills: &[String]) -> String {
    format!(
        "{title} is an innovative project that leverages modern technologies to deliver \
         exceptional user experiences. Built with {}, this project showcases expertise in {}.",
        join_or(technologies, 3, "cutting-edge tools"),
        join_or(skills, 3, "various domains"),
    )
}

/// Preview text for a project, never longer than `SHORT_DESCRIPTION_MAX_CHARS`.
/// Summarizes `full_description` when one is given.
pub async fn generate_project_short_description(
    client: &GenerativeClient,
    title: &str,
    technologies: &[String],
    full_description: Option<&str>,
) -> String {
    if !client.is_configured().await {
        return template_short_description(title, technologies);
    }

    let prompt = match full_description.map(str::trim).filter(|d| !d.is_empty()) {
        Some(description) => PROJECT_SUMMARY_FROM_DESCRIPTION_TEMPLATE
            .replace("{title}", title)
            .replace("{description}", description),
        None => PROJECT_SUMMARY_FROM_TECHNOLOGIES_TEMPLATE
            .replace("{title}", title)
            .replace("{technologies}", &join_or(technologies, usize::MAX, "Modern technologies")),
    };

    let request = GenerationRequest::text(prompt).with_max_output_tokens(100);
    match client.generate_text(&request).await {
        Ok(summary) if !summary.trim().is_empty() => clip(summary.trim(), SHORT_DESCRIPTION_MAX_CHARS),
        Ok(_) => template_short_description(title, technologies),
        Err(e) => {
            warn!("Project summary generation failed for {title:?}: {e}");
            template_short_description(title, technologies)
        }
    }
}

fn template_short_description(title: &str, technologies: &[String]) -> String {
    let text = format!(
        "{title} - A project built with {} that delivers exceptional user experiences.",
        join_or(technologies, 3, "modern technologies"),
    );
    clip(&text, SHORT_DESCRIPTION_MAX_CHARS)
}

/// Full description, then a short description summarizing it.
pub async fn generate_project_content(
    client: &GenerativeClient,
    title: &str,
    technologies: &[String],
    skills: &[String],
) -> ProjectContent {
    let description = generate_project_description(client, title, technologies, skills).await;
    let short_description =
        generate_project_short_description(client, title, technologies, Some(description.as_str())).await;
    ProjectContent {
        description,
        short_description,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Blog
// ────────────────────────────────────────────────────────────────────────────

pub async fn generate_blog_outline(client: &GenerativeClient, topic: &str) -> BlogOutline {
    if !client.is_configured().await {
        return template_outline(topic);
    }

    let request = GenerationRequest::structured(BLOG_OUTLINE_PROMPT_TEMPLATE.replace("{topic}", topic));
    let value = match client.generate_structured(&request).await {
        Ok(value) => value,
        Err(e) => {
            warn!("Blog outline generation failed for {topic:?}: {e}");
            return template_outline(topic);
        }
    };

    match serde_json::from_value::<BlogOutline>(value) {
        Ok(mut outline) if !outline.sections.is_empty() => {
            if outline.title.trim().is_empty() {
                outline.title = format!("Exploring {topic}");
            }
            outline
        }
        Ok(_) => template_outline(topic),
        Err(e) => {
            warn!("Blog outline did not match the expected shape: {e}");
            template_outline(topic)
        }
    }
}

fn template_outline(topic: &str) -> BlogOutline {
    let section = |heading: &str, content: String| OutlineSection {
        heading: heading.to_string(),
        content,
    };
    BlogOutline {
        title: format!("Exploring {topic}"),
        sections: vec![
            section("Introduction", format!("An introduction to {topic} and its importance.")),
            section("Key Concepts", "Understanding the fundamental concepts.".to_string()),
            section("Best Practices", "Practical tips and best practices.".to_string()),
            section("Conclusion", "Summary and key takeaways.".to_string()),
        ],
    }
}

/// Markdown blog post from an outline, or from a title/topic alone.
pub async fn generate_blog_content(
    client: &GenerativeClient,
    topic: &str,
    title: &str,
    outline: Option<&BlogOutline>,
) -> String {
    let heading = if title.trim().is_empty() { topic } else { title };

    if !client.is_configured().await {
        return template_blog(topic, heading, outline);
    }

    let prompt = match outline {
        Some(outline) => {
            let sections = outline
                .sections
                .iter()
                .map(|s| format!("### {}\n{}", s.heading, s.content))
                .collect::<Vec<_>>()
                .join("\n");
            let outline_title = if outline.title.trim().is_empty() {
                heading
            } else {
                outline.title.as_str()
            };
            BLOG_FROM_OUTLINE_PROMPT_TEMPLATE
                .replace("{title}", outline_title)
                .replace("{sections}", &sections)
        }
        None => BLOG_FROM_TOPIC_PROMPT_TEMPLATE.replace("{title}", heading),
    };

    let request = GenerationRequest::text(prompt).with_max_output_tokens(2000);
    match client.generate_text(&request).await {
        Ok(post) => post,
        Err(e) => {
            warn!("Blog content generation failed for {heading:?}: {e}");
            template_blog(topic, heading, outline)
        }
    }
}

fn template_blog(topic: &str, heading: &str, outline: Option<&BlogOutline>) -> String {
    let Some(outline) = outline else {
        let subject = if topic.trim().is_empty() { heading } else { topic };
        return format!("# {heading}\n\nThis is a blog post about {subject}.");
    };

    let title = if outline.title.trim().is_empty() {
        heading
    } else {
        outline.title.as_str()
    };
    let mut post = format!("# {title}\n\n");
    for section in &outline.sections {
        post.push_str(&format!("## {}\n\n{}\n\n", section.heading, section.content));
    }
    post
}

/// Plain-text excerpt of at most `max_length` characters (plus `...` when cut).
pub async fn generate_blog_excerpt(client: &GenerativeClient, content: &str, max_length: usize) -> String {
    if !client.is_configured().await {
        return first_paragraph_excerpt(content, max_length);
    }

    let prompt = BLOG_EXCERPT_PROMPT_TEMPLATE
        .replace("{max_length}", &max_length.to_string())
        .replace("{content}", &clip(content, EXCERPT_CONTEXT_CHARS));

    let request = GenerationRequest::text(prompt).with_max_output_tokens(150);
    match client.generate_text(&request).await {
        Ok(excerpt) if !excerpt.trim().is_empty() => {
            clip_with_ellipsis(strip_inline_markdown(&excerpt).trim(), max_length)
        }
        Ok(_) => first_paragraph_excerpt(content, max_length),
        Err(e) => {
            warn!("Blog excerpt generation failed, using first paragraph: {e}");
            first_paragraph_excerpt(content, max_length)
        }
    }
}

/// First non-empty paragraph with headings and inline markup removed.
fn first_paragraph_excerpt(content: &str, max_length: usize) -> String {
    let without_headings = content.replace('#', "");
    match without_headings
        .split("\n\n")
        .map(str::trim)
        .find(|p| !p.is_empty())
    {
        Some(paragraph) => clip_with_ellipsis(&strip_inline_markdown(paragraph), max_length),
        None => clip_with_ellipsis(content, max_length),
    }
}

fn strip_inline_markdown(text: &str) -> String {
    text.replace("**", "").replace(['*', '`'], "")
}

pub async fn improve_blog_content(
    client: &GenerativeClient,
    content: &str,
    improve_grammar: bool,
    improve_seo: bool,
    tone: &str,
) -> String {
    let options = ImproveOptions {
        tone: tone.to_string(),
        purpose: "blog".to_string(),
        improve_grammar,
        improve_seo,
    };
    improve_text(client, content, &options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::{client_on, ScriptedProvider};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_template_bio_uses_resume() {
        let resume = ParsedResume {
            name: "Ada".to_string(),
            skills: strings(&["Rust", "SQL"]),
            ..ParsedResume::default()
        };
        let bio = generate_bio(&GenerativeClient::unconfigured(), &resume).await;
        assert!(bio.starts_with("I am Ada"));
        assert!(bio.contains("Rust, SQL"));
    }

    #[tokio::test]
    async fn test_bio_from_model() {
        let provider = ScriptedProvider::with_models(&["m"]).then_ok("m", "Ada builds things.");
        let client = client_on(provider);
        let resume = ParsedResume {
            name: "Ada".to_string(),
            summary: "Systems engineer".to_string(),
            ..ParsedResume::default()
        };

        assert_eq!(generate_bio(&client, &resume).await, "Ada builds things.");
    }

    #[tokio::test]
    async fn test_short_description_is_clipped() {
        let long = "word ".repeat(200);
        let client = client_on(ScriptedProvider::with_models(&["m"]).then_ok("m", &long));

        let summary = generate_project_short_description(&client, "Site", &[], None).await;

        assert!(summary.chars().count() <= SHORT_DESCRIPTION_MAX_CHARS);
    }

    #[tokio::test]
    async fn test_project_content_unconfigured() {
        let content = generate_project_content(
            &GenerativeClient::unconfigured(),
            "Tracker",
            &strings(&["Rust", "Postgres"]),
            &strings(&["Backend"]),
        )
        .await;

        assert!(content.description.contains("Rust, Postgres"));
        assert!(content.short_description.starts_with("Tracker - "));
        assert!(content.short_description.chars().count() <= SHORT_DESCRIPTION_MAX_CHARS);
    }

    #[tokio::test]
    async fn test_project_description_failure_uses_template() {
        let client = client_on(
            ScriptedProvider::with_models(&["m"]).then_err("m", "403 PERMISSION_DENIED: key revoked"),
        );
        let description = generate_project_description(&client, "Tracker", &[], &[]).await;
        assert!(description.starts_with("Tracker is an innovative project"));
    }

    #[tokio::test]
    async fn test_blog_outline_from_model() {
        let reply = r#"{"title": "Async Rust", "sections": [{"heading": "Intro", "content": "Why async."}]}"#;
        let client = client_on(ScriptedProvider::with_models(&["m"]).then_ok("m", reply));

        let outline = generate_blog_outline(&client, "async").await;

        assert_eq!(outline.title, "Async Rust");
        assert_eq!(outline.sections.len(), 1);
    }

    #[tokio::test]
    async fn test_blog_outline_without_sections_uses_template() {
        let client = client_on(
            ScriptedProvider::with_models(&["m"]).then_ok("m", r#"{"title": "Only a title"}"#),
        );
        let outline = generate_blog_outline(&client, "async").await;
        assert_eq!(outline.title, "Exploring async");
        assert_eq!(outline.sections.len(), 4);
    }

    #[tokio::test]
    async fn test_template_blog_from_outline() {
        let outline = template_outline("testing");
        let post = generate_blog_content(&GenerativeClient::unconfigured(), "testing", "", Some(&outline)).await;
        assert!(post.starts_with("# Exploring testing\n\n## Introduction"));
        assert!(post.contains("## Conclusion"));
    }

    #[tokio::test]
    async fn test_template_blog_from_title() {
        let post = generate_blog_content(&GenerativeClient::unconfigured(), "", "Hello", None).await;
        assert_eq!(post, "# Hello\n\nThis is a blog post about Hello.");
    }

    #[test]
    fn test_first_paragraph_excerpt_strips_markdown() {
        let content = "# Title\n\nThis is **bold** and `code`.\n\nSecond paragraph.";
        assert_eq!(first_paragraph_excerpt(content, 300), "Title");

        let content = "\n\nThis is **bold** and `code`.\n\nSecond.";
        assert_eq!(first_paragraph_excerpt(content, 300), "This is bold and code.");
        assert_eq!(first_paragraph_excerpt(content, 4), "This...");
    }

    #[tokio::test]
    async fn test_blog_excerpt_from_model_is_cleaned() {
        let client = client_on(
            ScriptedProvider::with_models(&["m"]).then_ok("m", "  A **great** read about `async`.  "),
        );
        let excerpt = generate_blog_excerpt(&client, "body", DEFAULT_EXCERPT_CHARS).await;
        assert_eq!(excerpt, "A great read about async.");
    }
}
