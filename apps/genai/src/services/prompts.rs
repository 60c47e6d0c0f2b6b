// Prompt templates for the caller services.
// Placeholders in braces are substituted with `str::replace` before sending.
// The structured-output wrapper is added by the client, not here.

/// Replace `{name}`, `{summary}`, `{experience}`, `{skills}`.
pub const BIO_PROMPT_TEMPLATE: &str = r#"Create a professional "About Me" section for a portfolio based on the following resume information:

Name: {name}
Summary: {summary}
Experience: {experience}
Skills: {skills}

Write a compelling, professional biography (2-3 paragraphs) that:
- Highlights key achievements and experiences
- Shows personality and passion
- Is engaging and professional
- Suits a portfolio website"#;

/// Replace `{title}`, `{technologies}`, `{skills}`.
pub const PROJECT_DESCRIPTION_PROMPT_TEMPLATE: &str = r#"Write a compelling project description for: {title}

Technologies used: {technologies}
Skills demonstrated: {skills}

Create a professional description (3-5 sentences) that:
- Explains what the project does and its purpose
- Highlights key features and technologies used
- Shows the value and impact
- Mentions technical achievements or challenges overcome

Return only the description text without markdown formatting."#;

/// Replace `{title}`, `{description}`.
pub const PROJECT_SUMMARY_FROM_DESCRIPTION_TEMPLATE: &str = r#"Create a concise project summary (max 300 characters) for: {title}

Full description: {description}

Extract the most important points and create a brief, engaging summary."#;

/// Replace `{title}`, `{technologies}`.
pub const PROJECT_SUMMARY_FROM_TECHNOLOGIES_TEMPLATE: &str = r#"Create a concise project summary (max 300 characters) for: {title}

Technologies: {technologies}

Write a brief, engaging summary that captures the essence of the project."#;

/// Replace `{topic}`.
pub const BLOG_OUTLINE_PROMPT_TEMPLATE: &str = r#"Create a comprehensive blog post outline for the topic: {topic}

Return a JSON object with:
{
  "title": "Compelling blog post title",
  "sections": [
    {"heading": "Section heading", "content": "Brief description of section content (2-3 sentences)"}
  ]
}

Requirements:
- Create 4-6 sections including Introduction and Conclusion
- Make the title engaging and SEO-friendly
- Each section should have clear, descriptive content
- Structure should flow logically"#;

/// Replace `{title}`, `{sections}`.
pub const BLOG_FROM_OUTLINE_PROMPT_TEMPLATE: &str = r#"Write a comprehensive blog post based on this outline:

Title: {title}

Outline:
{sections}

Requirements:
- Write in Markdown format
- Expand each section with 2-3 paragraphs of detailed content
- Use proper headings (## for sections, ### for subsections)
- Include examples and practical insights
- Write in a professional yet engaging tone

Return the complete blog post in Markdown format."#;

/// Replace `{title}`.
pub const BLOG_FROM_TOPIC_PROMPT_TEMPLATE: &str = r#"Write a comprehensive blog post about: {title}

Requirements:
- Write in Markdown format
- Include an introduction, main content (3-4 sections), and conclusion
- Use proper headings (## for sections, ### for subsections)
- Include examples and practical insights
- Write in a professional yet engaging tone
- Aim for 800-1200 words

Return the complete blog post in Markdown format."#;

/// Replace `{max_length}`, `{content}`.
pub const BLOG_EXCERPT_PROMPT_TEMPLATE: &str = r#"Create a compelling excerpt (max {max_length} characters) for a blog post.

Blog content:
{content}

Requirements:
- Extract the key points and main message
- Keep it under {max_length} characters
- Do not include markdown formatting
- Write in third person

Return only the excerpt text."#;

/// Replace `{purpose}`, `{tone}`, `{improvements}`, `{text}`.
pub const IMPROVE_TEXT_PROMPT_TEMPLATE: &str = r#"Improve the following text for a {purpose}.
Tone: {tone}
Please {improvements} while maintaining the original meaning and message.

Original text:
{text}

Return only the improved text, without explanations or markdown formatting."#;

/// Replace `{resume_text}`.
pub const SKILL_EXTRACTION_PROMPT_TEMPLATE: &str = r#"Extract and classify technical and non-technical skills from the following resume text.

Return a JSON array of skills in this format:
[
  {"name": "Skill Name", "category": "technical|soft|language|framework|tool|other", "confidence": 0.0}
]

Categories:
- technical: programming languages and technologies (Python, JavaScript)
- soft: soft skills (Communication, Leadership)
- language: natural languages (English, Spanish)
- framework: frameworks and libraries (React, Django)
- tool: tools and platforms (Git, Docker, AWS)
- other: anything else

Resume text:
{resume_text}"#;

/// Replace `{title}`, `{description}`, `{keywords}`, `{content_length}`.
pub const SEO_REVIEW_PROMPT_TEMPLATE: &str = r#"Analyze the following portfolio content for SEO and provide detailed recommendations:

Title: {title}
Description: {description}
Keywords: {keywords}
Content Length: {content_length} characters

Return a JSON object with:
{
  "score": 0-100,
  "recommendations": [
    {"type": "category", "message": "recommendation text", "priority": "high|medium|low"}
  ],
  "keyword_density": {"keyword": 0.0},
  "readability_score": 0-100
}"#;

/// Replace `{resume_text}`.
pub const RESUME_STRUCTURE_PROMPT_TEMPLATE: &str = r#"Extract structured information from the following resume text.
Return a JSON object with the following structure:
{
  "name": "Full Name",
  "email": "email@example.com",
  "phone": "Phone number",
  "location": "City, State/Country",
  "summary": "Professional summary",
  "experience": [
    {
      "title": "Job Title",
      "company": "Company Name",
      "start_date": "YYYY-MM if possible",
      "end_date": "YYYY-MM or 'Present'",
      "description": "Job description"
    }
  ],
  "education": [
    {"degree": "Degree", "institution": "Institution Name", "year": "YYYY"}
  ],
  "skills": ["skill1", "skill2"],
  "certifications": [
    {"name": "Certification Name", "issuer": "Issuing Organization", "date": "YYYY-MM", "expiry": null}
  ]
}

Important:
- Parse dates in YYYY-MM format when possible
- Extract all certifications with full details
- Include all skills mentioned

Resume text:
{resume_text}"#;

/// Replace `{title}`, `{template_type}`, `{skills}`, `{content_summary}`.
pub const PORTFOLIO_KEYWORDS_PROMPT_TEMPLATE: &str = r#"Generate 10-15 relevant SEO keywords for a portfolio website with the following information:

Title: {title}
Template Type: {template_type}
Skills: {skills}
Content Summary: {content_summary}

Return a JSON array of keyword strings, focusing on professional skills and technologies, industry terms and relevant job titles.

Format: ["keyword1", "keyword2", "keyword3"]"#;

/// Replace `{template_type}`, `{name}`, `{title}`, `{experience}`.
pub const HEADER_PROMPT_TEMPLATE: &str = r#"Create a professional header for a {template_type} portfolio template with:
Name: {name}
Professional Title: {title}
Experience: {experience}

Generate a compelling professional subtitle that highlights the person's expertise or role, is at most 100 characters and matches the {template_type} template style.

Return JSON:
{"title": "{name}", "subtitle": "Professional tagline or role description"}"#;

/// Replace `{title}`, `{template_type}`, `{bio}`, `{skills}`.
pub const META_DESCRIPTION_PROMPT_TEMPLATE: &str = r#"Create a compelling SEO meta description (120-160 characters) for a portfolio:

Title: {title}
Template: {template_type}
Bio Summary: {bio}
Skills: {skills}

Requirements:
- 120-160 characters
- Include key skills or expertise
- No quotes or special formatting

Return only the description text."#;
