//! Google Gemini REST backend (`v1beta`).
//!
//! Only two endpoints are used: `GET /models` for discovery and
//! `POST /models/{id}:generateContent` for generation. Retrying and model
//! fallback are not handled here; this type reports failures verbatim.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::llm_client::provider::{
    short_id, ModelCandidate, ModelHandle, ModelProvider, ProviderError, SamplingParams,
    GENERATE_CONTENT,
};

const API_KEY_HEADER: &str = "x-goog-api-key";
const MODELS_PAGE_SIZE: u32 = 1000;
/// Upper bound on `list_models` pagination.
const MAX_MODEL_PAGES: usize = 10;
/// Longest slice of a raw error body copied into an error message.
const ERROR_BODY_SAMPLE_CHARS: usize = 500;

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> Option<String> {
        let text: String = self
            .candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }

    fn empty_reason(&self) -> String {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return format!("prompt blocked: {reason}");
        }
        match self.candidates.first().and_then(|c| c.finish_reason.as_deref()) {
            Some(reason) => format!("finish reason: {reason}"),
            None => "no candidates".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<GeminiModel>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiModel {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    code: Option<u16>,
    #[serde(default)]
    message: String,
    status: Option<String>,
    #[serde(default)]
    details: Vec<serde_json::Value>,
}

impl GeminiErrorBody {
    /// `retryDelay` from a `google.rpc.RetryInfo` detail, e.g. `"37s"`.
    fn retry_delay(&self) -> Option<Duration> {
        self.details
            .iter()
            .filter_map(|d| d.get("retryDelay").and_then(|v| v.as_str()))
            .find_map(parse_duration_secs)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Provider
// ────────────────────────────────────────────────────────────────────────────

pub struct GeminiProvider {
    client: Client,
    api_key: SecretString,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(
        api_key: SecretString,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn list_page(&self, page_token: Option<&str>) -> Result<ListModelsResponse, ProviderError> {
        let mut request = self
            .client
            .get(format!("{}/models", self.base_url))
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .query(&[("pageSize", MODELS_PAGE_SIZE.to_string())]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    async fn list_models(&self) -> Result<Vec<ModelCandidate>, ProviderError> {
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_MODEL_PAGES {
            let page = self.list_page(page_token.as_deref()).await?;
            models.extend(page.models.into_iter().map(|m| {
                let generates = m
                    .supported_generation_methods
                    .iter()
                    .any(|method| method == GENERATE_CONTENT);
                ModelCandidate::new(&m.name, generates)
            }));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("Gemini reported {} models", models.len());
        Ok(models)
    }

    fn resolve_model(&self, model: &str) -> Result<ModelHandle, ProviderError> {
        let id = short_id(model);
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_'));
        if !valid {
            return Err(ProviderError::new(format!(
                "Invalid Gemini model identifier '{model}'"
            )));
        }
        Ok(ModelHandle::new(id))
    }

    async fn generate(
        &self,
        model: &ModelHandle,
        prompt: &str,
        params: SamplingParams,
    ) -> Result<String, ProviderError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_output_tokens,
            },
        };

        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, model.id))
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let reply: GenerateContentResponse = response.json().await?;
        reply.text().ok_or_else(|| {
            ProviderError::new(format!(
                "Gemini returned no text for model {} ({})",
                model,
                reply.empty_reason()
            ))
        })
    }
}

/// Turns a non-2xx response into a `ProviderError` whose message reads like
/// `429 RESOURCE_EXHAUSTED: <provider message>`.
async fn error_from_response(response: reqwest::Response) -> ProviderError {
    let status = response.status();
    let header_delay = retry_after_header(response.headers());
    let body = response.text().await.unwrap_or_default();

    let (message, body_delay) = match serde_json::from_str::<GeminiError>(&body) {
        Ok(parsed) => {
            let code = parsed.error.code.unwrap_or(status.as_u16());
            let label = parsed
                .error
                .status
                .clone()
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("ERROR").to_string());
            (
                format!("{code} {label}: {}", parsed.error.message),
                parsed.error.retry_delay(),
            )
        }
        Err(_) => (
            format!(
                "{} {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("ERROR"),
                body.chars().take(ERROR_BODY_SAMPLE_CHARS).collect::<String>()
            ),
            None,
        ),
    };

    let error = ProviderError::with_status(status.as_u16(), message);
    match body_delay.or(header_delay) {
        Some(delay) => error.with_retry_after(delay),
        None => error,
    }
}

fn retry_after_header(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_duration_secs)
}

/// Parses `"37s"`, `"1.5s"` or a bare `"30"` into a duration.
fn parse_duration_secs(raw: &str) -> Option<Duration> {
    let secs: f64 = raw.trim().trim_end_matches('s').parse().ok()?;
    (secs.is_finite() && secs >= 0.0).then(|| Duration::from_secs_f64(secs.min(86_400.0)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::llm_client::classify::{classify, ErrorKind};

    const TEST_KEY: &str = "test-api-key";

    fn provider(server: &MockServer) -> GeminiProvider {
        GeminiProvider::new(
            SecretString::from(TEST_KEY.to_string()),
            server.uri(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn params() -> SamplingParams {
        SamplingParams {
            temperature: 0.7,
            max_output_tokens: 500,
        }
    }

    #[tokio::test]
    async fn test_generate_sends_prompt_and_reads_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .and(header(API_KEY_HEADER, TEST_KEY))
            .and(body_json(json!({
                "contents": [{"role": "user", "parts": [{"text": "Say hi"}]}],
                "generationConfig": {"temperature": 0.7, "maxOutputTokens": 500}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Hi "}, {"text": "there"}]},
                    "finishReason": "STOP"
                }]
            })))
            .mount(&server)
            .await;

        let gemini = provider(&server);
        let model = gemini.resolve_model("models/gemini-2.0-flash").unwrap();
        let text = gemini.generate(&model, "Say hi", params()).await.unwrap();
        assert_eq!(text, "Hi there");
    }

    #[tokio::test]
    async fn test_quota_error_carries_status_and_retry_delay() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {
                    "code": 429,
                    "message": "You exceeded your current quota, please check your plan and billing details.",
                    "status": "RESOURCE_EXHAUSTED",
                    "details": [
                        {"@type": "type.googleapis.com/google.rpc.QuotaFailure"},
                        {"@type": "type.googleapis.com/google.rpc.RetryInfo", "retryDelay": "7s"}
                    ]
                }
            })))
            .mount(&server)
            .await;

        let gemini = provider(&server);
        let model = gemini.resolve_model("gemini-1.5-flash").unwrap();
        let err = gemini.generate(&model, "hello", params()).await.unwrap_err();

        assert_eq!(err.status, Some(429));
        assert!(err.message.starts_with("429 RESOURCE_EXHAUSTED:"));
        assert_eq!(err.retry_after, Some(Duration::from_secs(7)));
        assert_eq!(classify(&err.message).kind, ErrorKind::QuotaExhausted);
    }

    #[tokio::test]
    async fn test_retired_model_classifies_as_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-pro:generateContent"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {
                    "code": 404,
                    "message": "models/gemini-pro is not found for API version v1beta, or is not supported for generateContent.",
                    "status": "NOT_FOUND"
                }
            })))
            .mount(&server)
            .await;

        let gemini = provider(&server);
        let model = gemini.resolve_model("gemini-pro").unwrap();
        let err = gemini.generate(&model, "hello", params()).await.unwrap_err();
        assert_eq!(classify(&err.message).kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_non_json_error_body_uses_retry_after_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-pro:generateContent"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "12")
                    .set_body_string("slow down"),
            )
            .mount(&server)
            .await;

        let gemini = provider(&server);
        let model = gemini.resolve_model("gemini-1.5-pro").unwrap();
        let err = gemini.generate(&model, "hello", params()).await.unwrap_err();
        assert_eq!(err.message, "429 Too Many Requests: slow down");
        assert_eq!(err.retry_after, Some(Duration::from_secs(12)));
    }

    #[tokio::test]
    async fn test_blocked_prompt_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": {"blockReason": "SAFETY"}
            })))
            .mount(&server)
            .await;

        let gemini = provider(&server);
        let model = gemini.resolve_model("gemini-2.0-flash").unwrap();
        let err = gemini.generate(&model, "hello", params()).await.unwrap_err();
        assert!(err.message.contains("prompt blocked: SAFETY"));
        assert_eq!(classify(&err.message).kind, ErrorKind::Other);
    }

    #[tokio::test]
    async fn test_list_models_follows_pages_and_reads_capabilities() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .and(query_param("pageToken", "page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [
                    {"name": "models/text-embedding-004", "supportedGenerationMethods": ["embedContent"]}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .and(header(API_KEY_HEADER, TEST_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [
                    {"name": "models/gemini-2.0-flash", "supportedGenerationMethods": ["generateContent", "countTokens"]}
                ],
                "nextPageToken": "page-2"
            })))
            .mount(&server)
            .await;

        let models = provider(&server).list_models().await.unwrap();
        assert_eq!(
            models,
            vec![
                ModelCandidate::new("gemini-2.0-flash", true),
                ModelCandidate::new("text-embedding-004", false),
            ]
        );
    }

    #[test]
    fn test_resolve_model_rejects_garbage() {
        let gemini = GeminiProvider::new(
            SecretString::from(TEST_KEY.to_string()),
            "http://localhost",
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(gemini.resolve_model("").is_err());
        assert!(gemini.resolve_model("gemini pro/../x").is_err());
        assert_eq!(
            gemini.resolve_model("models/gemini-1.5-flash-001").unwrap().id,
            "gemini-1.5-flash-001"
        );
    }

    #[test]
    fn test_parse_duration_secs() {
        assert_eq!(parse_duration_secs("37s"), Some(Duration::from_secs(37)));
        assert_eq!(parse_duration_secs("1.5s"), Some(Duration::from_millis(1500)));
        assert_eq!(parse_duration_secs("30"), Some(Duration::from_secs(30)));
        assert_eq!(parse_duration_secs("soon"), None);
    }
}
