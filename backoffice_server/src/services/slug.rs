//! Slug derivation — text-generation service with a deterministic fallback.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;

use crate::config::SiteConfig;

static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static DISALLOWED_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_-]+").unwrap());

/// Local slug: lower-case, whitespace runs become one `-`, anything outside
/// `[A-Za-z0-9_-]` is dropped.
pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    let hyphenated = WHITESPACE_REGEX.replace_all(&lower, "-");
    DISALLOWED_REGEX.replace_all(&hyphenated, "").into_owned()
}

#[derive(Debug, thiserror::Error)]
pub enum SlugError {
    #[error("slug request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("slug service returned {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("malformed slug response: {0}")]
    Malformed(String),
}

/// External text generation that turns a title into a slug.
#[async_trait]
pub trait SlugGenerator: Send + Sync {
    async fn generate(&self, title: &str) -> Result<String, SlugError>;
}

fn slug_prompt(title: &str) -> String {
    format!("Generate a URL-friendly slug from the following title:\n\nTitle: {title}\n\nSlug:")
}

/// Gemini `generateContent` client asking for a `{"slug": ...}` JSON answer.
pub struct GeminiSlugGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SlugAnswer {
    slug: String,
}

impl GeminiSlugGenerator {
    pub fn new(client: reqwest::Client, api_base: &str, model: &str, api_key: String) -> Self {
        Self {
            client,
            endpoint: format!(
                "{}/v1beta/models/{model}:generateContent",
                api_base.trim_end_matches('/')
            ),
            api_key,
        }
    }
}

#[async_trait]
impl SlugGenerator for GeminiSlugGenerator {
    async fn generate(&self, title: &str) -> Result<String, SlugError> {
        let body = serde_json::json!({
            "contents": [{ "role": "user", "parts": [{ "text": slug_prompt(title) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": { "slug": { "type": "STRING" } },
                    "required": ["slug"]
                }
            }
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(SlugError::Rejected { status, body });
        }

        extract_slug(resp.json().await?)
    }
}

fn extract_slug(resp: GenerateResponse) -> Result<String, SlugError> {
    let text = resp
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .find_map(|p| p.text)
        .ok_or_else(|| SlugError::Malformed("no candidate text".to_string()))?;
    let answer: SlugAnswer =
        serde_json::from_str(text.trim()).map_err(|e| SlugError::Malformed(e.to_string()))?;
    Ok(answer.slug)
}

/// Produces slugs for new content. Never fails: any generator problem falls
/// back to [`slugify`].
#[derive(Clone, Default)]
pub struct SlugDeriver {
    generator: Option<Arc<dyn SlugGenerator>>,
}

impl SlugDeriver {
    pub fn new(generator: Option<Arc<dyn SlugGenerator>>) -> Self {
        Self { generator }
    }

    /// Generator-backed when `SLUG_API_KEY` is set, fallback-only otherwise.
    pub fn from_config(config: &SiteConfig, client: reqwest::Client) -> Self {
        let generator = config.slug_api_key.clone().map(|key| {
            Arc::new(GeminiSlugGenerator::new(
                client,
                &config.slug_api_base,
                &config.slug_model,
                key,
            )) as Arc<dyn SlugGenerator>
        });
        Self { generator }
    }

    pub async fn derive(&self, title: &str) -> String {
        if let Some(generator) = &self.generator {
            match generator.generate(title).await {
                Ok(raw) => {
                    let slug = slugify(raw.trim());
                    if !slug.is_empty() {
                        crate::metrics::slug_derived("generator");
                        return slug;
                    }
                    tracing::warn!(title, "Slug generator returned an empty slug, using fallback");
                }
                Err(e) => {
                    tracing::warn!(title, error = %e, "Slug generation failed, using fallback");
                }
            }
        }
        crate::metrics::slug_derived("fallback");
        slugify(title)
    }
}
