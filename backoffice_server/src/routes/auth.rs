//! Admin session: login, logout, and the guard in front of `/admin`.

use axum::body::Body;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Redirect, Response};
use serde::Deserialize;

use super::{Envelope, JsonBody, SiteState};
use crate::services::identity_service::{
    cleared_session_cookie, session_cookie, session_token, AuthError,
};

pub const LOGIN_PATH: &str = "/admin/login";
const ADMIN_HOME: &str = "/admin";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Redirects sessionless `/admin` requests to the login page, and signed-in
/// visitors away from it. The cookie's presence is all that is checked.
pub async fn require_session(req: Request<Body>, next: Next) -> Response {
    let path = req.uri().path();
    if path != ADMIN_HOME && !path.starts_with("/admin/") {
        return next.run(req).await;
    }

    let has_session = session_token(req.headers()).is_some();
    if path == LOGIN_PATH {
        if has_session && req.method() == Method::GET {
            return Redirect::to(ADMIN_HOME).into_response();
        }
        return next.run(req).await;
    }
    if !has_session {
        tracing::debug!(path, "No admin session, redirecting to login");
        return Redirect::to(LOGIN_PATH).into_response();
    }
    next.run(req).await
}

pub async fn login(
    State(state): State<SiteState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Response {
    match state.identity.sign_in(req.email.trim(), &req.password).await {
        Ok(token) => {
            crate::metrics::login_attempted("success");
            tracing::info!(email = %req.email.trim(), "Admin signed in");
            (
                [(SET_COOKIE, session_cookie(&token, state.secure_cookies))],
                Json(Envelope::ok()),
            )
                .into_response()
        }
        Err(e) => {
            let (status, message, outcome) = match &e {
                AuthError::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    "Invalid email or password.",
                    "rejected",
                ),
                AuthError::Unconfigured => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Login is not available.",
                    "unconfigured",
                ),
                AuthError::Http(_) | AuthError::Upstream { .. } => (
                    StatusCode::BAD_GATEWAY,
                    "Login failed, please try again.",
                    "error",
                ),
            };
            crate::metrics::login_attempted(outcome);
            tracing::warn!(email = %req.email.trim(), error = %e, "Admin sign-in failed");
            (status, Json(Envelope::failure(message))).into_response()
        }
    }
}

pub async fn logout(State(state): State<SiteState>) -> Response {
    (
        [(SET_COOKIE, cleared_session_cookie(state.secure_cookies))],
        Redirect::to(LOGIN_PATH),
    )
        .into_response()
}
