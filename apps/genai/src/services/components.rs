//! Content for individual portfolio components.
//!
//! The header and about blocks are written by the model. Every other block is
//! assembled from the resume and from what the component already holds, with
//! existing content taking precedence over generated defaults.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::llm_client::GenerativeClient;
use crate::services::content::generate_bio;
use crate::services::portfolio::{generate_header_content, SUBTITLE_MAX_CHARS};
use crate::services::resume::{ExperienceEntry, ParsedResume};
use crate::services::{clip, is_blank};

const MAX_SKILLS: usize = 20;
const MAX_CLOUD_SKILLS: usize = 30;
const MAX_TIMELINE_ENTRIES: usize = 10;
const MAX_EXPERIENCE_PROJECTS: usize = 5;
const MAX_SKILL_SERVICES: usize = 6;
const PROJECT_SUMMARY_CHARS: usize = 200;
const POSTS_PER_ROW: u32 = 3;

const DEFAULT_SKILLS: &[&str] = &["Communication", "Problem Solving", "Teamwork"];
const DEFAULT_CLOUD_SKILLS: &[&str] = &[
    "Communication",
    "Problem Solving",
    "Teamwork",
    "Leadership",
    "Project Management",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    Header,
    HeroBanner,
    About,
    AboutMeCard,
    Skills,
    SkillsCloud,
    ExperienceTimeline,
    Projects,
    ProjectGrid,
    ServicesSection,
    AchievementsCounters,
    TestimonialsCarousel,
    BlogPreviewGrid,
    Contact,
    ContactForm,
    Footer,
}

impl ComponentType {
    pub const ALL: [ComponentType; 16] = [
        ComponentType::Header,
        ComponentType::HeroBanner,
        ComponentType::About,
        ComponentType::AboutMeCard,
        ComponentType::Skills,
        ComponentType::SkillsCloud,
        ComponentType::ExperienceTimeline,
        ComponentType::Projects,
        ComponentType::ProjectGrid,
        ComponentType::ServicesSection,
        ComponentType::AchievementsCounters,
        ComponentType::TestimonialsCarousel,
        ComponentType::BlogPreviewGrid,
        ComponentType::Contact,
        ComponentType::ContactForm,
        ComponentType::Footer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ComponentType::Header => "header",
            ComponentType::HeroBanner => "hero_banner",
            ComponentType::About => "about",
            ComponentType::AboutMeCard => "about_me_card",
            ComponentType::Skills => "skills",
            ComponentType::SkillsCloud => "skills_cloud",
            ComponentType::ExperienceTimeline => "experience_timeline",
            ComponentType::Projects => "projects",
            ComponentType::ProjectGrid => "project_grid",
            ComponentType::ServicesSection => "services_section",
            ComponentType::AchievementsCounters => "achievements_counters",
            ComponentType::TestimonialsCarousel => "testimonials_carousel",
            ComponentType::BlogPreviewGrid => "blog_preview_grid",
            ComponentType::Contact => "contact",
            ComponentType::ContactForm => "contact_form",
            ComponentType::Footer => "footer",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown portfolio component type: {0}")]
pub struct UnknownComponent(pub String);

impl FromStr for ComponentType {
    type Err = UnknownComponent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownComponent(name.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileLinks {
    pub linkedin: String,
    pub github: String,
    pub website: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentContext {
    pub resume: ParsedResume,
    pub links: ProfileLinks,
    /// What the component holds today; `Value::Null` for a new one.
    pub existing_content: Value,
    pub template_type: String,
}

impl ComponentContext {
    pub fn new(resume: ParsedResume) -> Self {
        Self {
            resume,
            links: ProfileLinks::default(),
            existing_content: Value::Null,
            template_type: "modern".to_string(),
        }
    }

    fn name(&self) -> &str {
        or_default(&self.resume.name, "Professional")
    }

    fn existing_list(&self, key: &str) -> Vec<Value> {
        match self.existing_content.get(key) {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    fn existing_str(&self, key: &str) -> &str {
        self.existing_content
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

/// Content JSON for `component`. Placeholder content when no model is available.
pub async fn generate_component_content(
    client: &GenerativeClient,
    component: ComponentType,
    context: &ComponentContext,
) -> Value {
    if !client.is_configured().await {
        return placeholder_content(component, context);
    }

    match component {
        ComponentType::Header => {
            let header =
                generate_header_content(client, &context.resume, &context.template_type).await;
            json!({"title": header.title, "subtitle": header.subtitle})
        }
        ComponentType::About => json!({"bio": generate_bio(client, &context.resume).await}),
        ComponentType::HeroBanner => hero_banner(context),
        ComponentType::AboutMeCard => about_me_card(context),
        ComponentType::Skills => json!({"skills": skill_list(context, DEFAULT_SKILLS, MAX_SKILLS)}),
        ComponentType::SkillsCloud => json!({
            "skills": skill_list(context, DEFAULT_CLOUD_SKILLS, MAX_CLOUD_SKILLS),
            "display_mode": "cloud"
        }),
        ComponentType::ExperienceTimeline => experience_timeline(context),
        ComponentType::Projects => json!({"projects": context.existing_list("projects")}),
        ComponentType::ProjectGrid => project_grid(context),
        ComponentType::ServicesSection => services_section(context),
        ComponentType::AchievementsCounters => achievement_counters(context),
        ComponentType::TestimonialsCarousel => testimonials(context),
        ComponentType::BlogPreviewGrid => json!({
            "posts": context.existing_list("posts"),
            "posts_per_row": POSTS_PER_ROW
        }),
        ComponentType::Contact => contact(context),
        ComponentType::ContactForm => contact_form(
            "Feel free to reach out for collaborations, opportunities, or just to say hello!",
        ),
        ComponentType::Footer => footer(context, Utc::now().year()),
    }
}

fn hero_banner(context: &ComponentContext) -> Value {
    let subtitle = context
        .resume
        .latest_title()
        .map(|t| clip(t, SUBTITLE_MAX_CHARS))
        .unwrap_or_else(|| "Professional".to_string());
    json!({
        "title": context.name(),
        "subtitle": subtitle,
        "background_image": "",
        "background_video": "",
        "cta_buttons": [
            {"text": "View My Work", "url": "#projects", "variant": "primary"},
            {"text": "Contact Me", "url": "#contact", "variant": "secondary"}
        ],
        "overlay_opacity": 0.5
    })
}

fn about_me_card(context: &ComponentContext) -> Value {
    let name = context.name();
    let bio = match context.resume.summary.trim() {
        "" => default_bio(name),
        summary => summary.to_string(),
    };
    json!({
        "name": name,
        "title": context.resume.latest_title().unwrap_or("Professional"),
        "bio": bio,
        "image": "",
        "social_links": {
            "linkedin": context.links.linkedin,
            "github": context.links.github,
            "twitter": "",
            "email": context.resume.email
        }
    })
}

fn default_bio(name: &str) -> String {
    format!("I am {name}, a dedicated professional passionate about delivering excellence.")
}

/// Resume skills, else the component's own, else `defaults`. Deduplicated
/// case-insensitively, keeping the first spelling.
fn skill_list(context: &ComponentContext, defaults: &[&str], limit: usize) -> Vec<String> {
    let mut skills: Vec<String> = context
        .resume
        .skills
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if skills.is_empty() {
        skills = string_list(context.existing_content.get("skills"));
    }
    if skills.is_empty() {
        skills = defaults.iter().map(|s| s.to_string()).collect();
    }

    let mut seen = HashSet::new();
    skills
        .into_iter()
        .filter(|s| seen.insert(s.to_lowercase()))
        .take(limit)
        .collect()
}

/// Strings from a JSON array or a comma separated string.
fn string_list(value: Option<&Value>) -> Vec<String> {
    let items: Vec<String> = match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn experience_timeline(context: &ComponentContext) -> Value {
    let entries: Vec<ExperienceEntry> = if context.resume.experience.is_empty() {
        context
            .existing_list("experiences")
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect()
    } else {
        context.resume.experience.clone()
    };

    let experiences: Vec<Value> = entries
        .iter()
        .take(MAX_TIMELINE_ENTRIES)
        .map(|e| {
            json!({
                "title": or_default(&e.title, "Position"),
                "company": or_default(&e.company, "Company"),
                "start_date": e.start_date,
                "end_date": e.end_date,
                "description": e.description
            })
        })
        .collect();
    json!({"experiences": experiences})
}

/// Existing projects, or one card per recent role.
fn project_grid(context: &ComponentContext) -> Value {
    let mut projects = context.existing_list("projects");
    if projects.is_empty() {
        projects = context
            .resume
            .experience
            .iter()
            .take(MAX_EXPERIENCE_PROJECTS)
            .map(|e| {
                json!({
                    "title": format!("{} at {}", e.title.trim(), e.company.trim()),
                    "description": e.description,
                    "short_description": clip(&e.description, PROJECT_SUMMARY_CHARS),
                    "image": "",
                    "github_url": "",
                    "live_url": "",
                    "technologies": []
                })
            })
            .collect();
    }
    json!({"projects": projects, "filter_categories": [], "show_filters": true})
}

fn services_section(context: &ComponentContext) -> Value {
    let existing = context.existing_list("services");
    if !existing.is_empty() {
        return json!({"services": existing});
    }

    let skills: Vec<&str> = context
        .resume
        .skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .take(MAX_SKILL_SERVICES)
        .collect();
    let services: Vec<Value> = if skills.is_empty() {
        vec![
            json!({"title": "Web Development", "description": "Custom web solutions tailored to your needs", "icon": "Code"}),
            json!({"title": "Consulting", "description": "Expert advice and strategic guidance", "icon": "Briefcase"}),
            json!({"title": "Design", "description": "Creative and user-centered design solutions", "icon": "Palette"}),
        ]
    } else {
        skills
            .iter()
            .map(|skill| {
                json!({
                    "title": skill,
                    "description": format!("Professional {skill} services"),
                    "icon": "Code"
                })
            })
            .collect()
    };
    json!({"services": services})
}

fn achievement_counters(context: &ComponentContext) -> Value {
    let existing = context.existing_list("counters");
    if !existing.is_empty() {
        return json!({"counters": existing});
    }

    let roles = context.resume.experience.len();
    let projects = match context.existing_list("projects").len() {
        0 => roles,
        n => n,
    };
    let skills = match context.resume.skills.len() {
        0 => 10,
        n => n,
    };
    json!({"counters": [
        {"label": "Projects Completed", "value": projects.max(5), "icon": "Briefcase"},
        {"label": "Years Experience", "value": roles.max(2), "icon": "Calendar"},
        {"label": "Happy Clients", "value": (projects * 2).max(10), "icon": "Users"},
        {"label": "Skills Mastered", "value": skills, "icon": "Award"}
    ]})
}

fn testimonials(context: &ComponentContext) -> Value {
    let mut testimonials = context.existing_list("testimonials");
    if testimonials.is_empty() {
        testimonials.push(json!({
            "name": "Client Name",
            "role": "CEO, Company",
            "content": "Outstanding work and professionalism. Highly recommended!",
            "avatar": "",
            "rating": 5
        }));
    }
    json!({"testimonials": testimonials})
}

/// Resume details first, the component's own values where the resume is blank.
/// Non-blank entries already in the component's `social` map win.
fn contact(context: &ComponentContext) -> Value {
    let resume = &context.resume;
    let links = &context.links;

    let mut social = Map::new();
    for (key, own) in [
        ("linkedin", &links.linkedin),
        ("github", &links.github),
        ("website", &links.website),
    ] {
        social.insert(key.to_string(), Value::String(own.trim().to_string()));
    }
    if let Some(existing) = context.existing_content.get("social").and_then(Value::as_object) {
        for (key, value) in existing.iter().filter(|(_, v)| !is_blank(v)) {
            social.insert(key.clone(), value.clone());
        }
    }

    json!({
        "email": or_default(&resume.email, context.existing_str("email")),
        "phone": or_default(&resume.phone, context.existing_str("phone")),
        "location": or_default(&resume.location, context.existing_str("location")),
        "social": social
    })
}

fn contact_form(description: &str) -> Value {
    json!({
        "title": "Contact Info",
        "description": description,
        "fields": ["name", "email", "message"],
        "submit_button_text": "Send Message"
    })
}

fn footer(context: &ComponentContext, year: i32) -> Value {
    json!({
        "copyright_text": format!("© {year} {}. All rights reserved.", context.name()),
        "links": [
            {"text": "About", "url": "#about"},
            {"text": "Projects", "url": "#projects"},
            {"text": "Contact", "url": "#contact"}
        ],
        "social_links": {
            "linkedin": context.links.linkedin,
            "github": context.links.github,
            "twitter": "",
            "facebook": "",
            "instagram": ""
        },
        "columns": []
    })
}

fn placeholder_content(component: ComponentType, context: &ComponentContext) -> Value {
    let name = context.name();
    match component {
        ComponentType::Header => json!({"title": name, "subtitle": "Professional Portfolio"}),
        ComponentType::HeroBanner => json!({
            "title": name,
            "subtitle": "Welcome to My Portfolio",
            "background_image": "",
            "background_video": "",
            "cta_buttons": [{"text": "Get Started", "url": "#", "variant": "primary"}],
            "overlay_opacity": 0.5
        }),
        ComponentType::About => json!({"bio": default_bio(name)}),
        ComponentType::AboutMeCard => json!({
            "name": name,
            "title": "Professional",
            "bio": default_bio(name),
            "image": "",
            "social_links": {"linkedin": "", "github": "", "twitter": "", "email": ""}
        }),
        ComponentType::Skills => json!({"skills": DEFAULT_SKILLS}),
        ComponentType::SkillsCloud => json!({
            "skills": &DEFAULT_CLOUD_SKILLS[..4],
            "display_mode": "cloud"
        }),
        ComponentType::ExperienceTimeline => json!({"experiences": []}),
        ComponentType::Projects => json!({"projects": []}),
        ComponentType::ProjectGrid => {
            json!({"projects": [], "filter_categories": [], "show_filters": true})
        }
        ComponentType::ServicesSection => json!({"services": []}),
        ComponentType::AchievementsCounters => json!({"counters": []}),
        ComponentType::TestimonialsCarousel => json!({"testimonials": []}),
        ComponentType::BlogPreviewGrid => json!({"posts": [], "posts_per_row": POSTS_PER_ROW}),
        ComponentType::Contact => json!({"email": "", "phone": "", "linkedin": "", "github": ""}),
        ComponentType::ContactForm => contact_form(""),
        ComponentType::Footer => json!({
            "copyright_text": format!("© {} {name}. All rights reserved.", Utc::now().year()),
            "links": [],
            "social_links": {},
            "columns": []
        }),
    }
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    match value.trim() {
        "" => fallback,
        value => value,
    }
}
