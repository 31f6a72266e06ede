//! Back-office configuration — loaded from environment variables.

use std::time::Duration;

const DEFAULT_SLUG_API_BASE: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_SLUG_MODEL: &str = "gemini-2.0-flash";

#[derive(Clone, Debug)]
pub struct SiteConfig {
    /// Base URL of the public site deployment (revalidation target).
    pub client_url: Option<String>,
    /// Shared secret sent in `x-revalidation-secret`.
    pub revalidation_secret: Option<String>,
    /// API key for the slug text-generation service. Unset means fallback only.
    pub slug_api_key: Option<String>,
    /// Base URL of the text-generation API.
    pub slug_api_base: String,
    /// Model used for slug generation.
    pub slug_model: String,
    /// Timeout applied to every outbound HTTP call.
    pub http_timeout: Duration,
    /// Firestore project (firestore backend only).
    pub firestore_project_id: Option<String>,
    /// OAuth bearer token for the Firestore REST API.
    pub firestore_access_token: Option<String>,
    /// Identity Toolkit API key used by the admin login.
    pub auth_api_key: Option<String>,
    /// Marks session cookies `Secure`.
    pub production: bool,
}

impl SiteConfig {
    pub fn from_env() -> Self {
        let client_url = non_empty_var("SITE_CLIENT_URL").map(|u| u.trim_end_matches('/').to_string());
        let revalidation_secret = non_empty_var("REVALIDATION_SECRET_TOKEN");
        let slug_api_key = non_empty_var("SLUG_API_KEY");
        let slug_api_base = non_empty_var("SLUG_API_BASE")
            .unwrap_or_else(|| DEFAULT_SLUG_API_BASE.to_string());
        let slug_model = non_empty_var("SLUG_MODEL").unwrap_or_else(|| DEFAULT_SLUG_MODEL.to_string());
        let http_timeout_secs = std::env::var("HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);
        let firestore_project_id = non_empty_var("FIRESTORE_PROJECT_ID");
        let firestore_access_token = non_empty_var("FIRESTORE_ACCESS_TOKEN");
        let auth_api_key = non_empty_var("AUTH_API_KEY");
        let production = std::env::var("SITE_PRODUCTION")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        if client_url.is_none() || revalidation_secret.is_none() {
            tracing::warn!(
                "SITE_CLIENT_URL or REVALIDATION_SECRET_TOKEN not set -- public site revalidation disabled"
            );
        }
        if slug_api_key.is_none() {
            tracing::warn!("SLUG_API_KEY not set -- slugs derived locally from titles");
        }
        if auth_api_key.is_none() {
            tracing::warn!("AUTH_API_KEY not set -- admin login disabled");
        }

        Self {
            client_url,
            revalidation_secret,
            slug_api_key,
            slug_api_base,
            slug_model,
            http_timeout: Duration::from_secs(http_timeout_secs),
            firestore_project_id,
            firestore_access_token,
            auth_api_key,
            production,
        }
    }

    /// Shared HTTP client for all outbound calls.
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.http_timeout)
            .user_agent(concat!("backoffice/", env!("CARGO_PKG_VERSION")))
            .build()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
