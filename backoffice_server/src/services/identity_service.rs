//! Admin sign-in against the Identity Toolkit REST API and the session
//! cookie that carries the resulting ID token.

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use serde::Deserialize;

use crate::config::SiteConfig;

pub const SESSION_COOKIE: &str = "session";
pub const SESSION_MAX_AGE_SECS: u64 = 60 * 60 * 24;
const IDENTITY_TOOLKIT_BASE: &str = "https://identitytoolkit.googleapis.com";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("login is not configured")]
    Unconfigured,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("identity request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("identity service returned {status}: {body}")]
    Upstream { status: u16, body: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Email/password sign-in. Without an API key every attempt is rejected.
#[derive(Clone)]
pub struct IdentityClient {
    client: reqwest::Client,
    endpoint: Option<String>,
}

impl IdentityClient {
    pub fn new(client: reqwest::Client, api_base: &str, api_key: Option<&str>) -> Self {
        let endpoint = api_key.map(|key| {
            format!(
                "{}/v1/accounts:signInWithPassword?key={key}",
                api_base.trim_end_matches('/')
            )
        });
        Self { client, endpoint }
    }

    pub fn from_config(config: &SiteConfig, client: reqwest::Client) -> Self {
        Self::new(client, IDENTITY_TOOLKIT_BASE, config.auth_api_key.as_deref())
    }

    /// Returns the ID token to store in the session cookie.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let endpoint = self.endpoint.as_ref().ok_or(AuthError::Unconfigured)?;

        let resp = self
            .client
            .post(endpoint)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            let body: SignInResponse = resp.json().await?;
            return Ok(body.id_token);
        }

        let body = resp.text().await.unwrap_or_default();
        if status.as_u16() == 400 && is_credential_error(&body) {
            return Err(AuthError::InvalidCredentials);
        }
        Err(AuthError::Upstream {
            status: status.as_u16(),
            body,
        })
    }
}

fn is_credential_error(body: &str) -> bool {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|e| {
            let code = e.error.message;
            code.starts_with("INVALID_")
                || code.starts_with("EMAIL_NOT_FOUND")
                || code.starts_with("USER_DISABLED")
                || code.starts_with("MISSING_PASSWORD")
        })
        .unwrap_or(false)
}

/// `Set-Cookie` value for a fresh session.
pub fn session_cookie(token: &str, secure: bool) -> String {
    let mut cookie =
        format!("{SESSION_COOKIE}={token}; HttpOnly; Path=/; Max-Age={SESSION_MAX_AGE_SECS}; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that expires the session.
pub fn cleared_session_cookie(secure: bool) -> String {
    let mut cookie = format!("{SESSION_COOKIE}=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// The non-empty session token from the request's `Cookie` headers.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::{json, Value};

    async fn identity_server() -> String {
        let app = Router::new().route(
            "/v1/accounts:signInWithPassword",
            post(|Json(body): Json<Value>| async move {
                if body["email"] == "admin@example.com" && body["password"] == "correct" {
                    (StatusCode::OK, Json(json!({ "idToken": "token-123", "expiresIn": "3600" })))
                } else if body["email"] == "boom@example.com" {
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        Json(json!({ "error": { "message": "UNAVAILABLE" } })),
                    )
                } else {
                    (
                        StatusCode::BAD_REQUEST,
                        Json(json!({ "error": { "message": "INVALID_LOGIN_CREDENTIALS" } })),
                    )
                }
            }),
        );
        crate::test_support::serve(app).await
    }

    #[tokio::test]
    async fn sign_in_returns_id_token() {
        let base = identity_server().await;
        let client = IdentityClient::new(reqwest::Client::new(), &base, Some("key"));
        assert_eq!(client.sign_in("admin@example.com", "correct").await.unwrap(), "token-123");
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let base = identity_server().await;
        let client = IdentityClient::new(reqwest::Client::new(), &base, Some("key"));
        let err = client.sign_in("admin@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn upstream_outage_is_reported() {
        let base = identity_server().await;
        let client = IdentityClient::new(reqwest::Client::new(), &base, Some("key"));
        let err = client.sign_in("boom@example.com", "x").await.unwrap_err();
        assert!(matches!(err, AuthError::Upstream { status: 503, .. }));
    }

    #[tokio::test]
    async fn missing_api_key_disables_login() {
        let client = IdentityClient::new(reqwest::Client::new(), "http://127.0.0.1:1", None);
        let err = client.sign_in("admin@example.com", "correct").await.unwrap_err();
        assert!(matches!(err, AuthError::Unconfigured));
    }

    #[test]
    fn cookie_attributes() {
        assert_eq!(
            session_cookie("abc", false),
            "session=abc; HttpOnly; Path=/; Max-Age=86400; SameSite=Lax"
        );
        assert!(session_cookie("abc", true).ends_with("; Secure"));
        assert!(cleared_session_cookie(false).contains("Max-Age=0"));
    }

    #[rstest]
    #[case("session=abc", Some("abc"))]
    #[case("theme=dark; session=abc", Some("abc"))]
    #[case("session=", None)]
    #[case("sessionid=abc", None)]
    #[case("", None)]
    fn reads_session_cookie(#[case] cookie: &str, #[case] expected: Option<&str>) {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        assert_eq!(session_token(&headers), expected);
    }
}
