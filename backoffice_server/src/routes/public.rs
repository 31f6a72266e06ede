//! Public lead intake used by the registration and contact forms.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use super::{Envelope, JsonBody, SiteState};
use crate::models::LeadKind;
use crate::services::lead_service;

pub async fn create_lead<L: LeadKind>(
    State(state): State<SiteState>,
    JsonBody(form): JsonBody<L::Form>,
) -> Response {
    match lead_service::create::<L>(&state.ctx, &form).await {
        Ok(id) => (
            StatusCode::CREATED,
            Json(Envelope {
                id: Some(id),
                ..Envelope::ok()
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::test_support::{send, test_router, SESSION};

    #[tokio::test]
    async fn contact_form_needs_no_session() {
        let app = test_router();
        let (status, _, envelope) = send(
            &app,
            Method::POST,
            "/api/contact",
            None,
            Some(json!({
                "fullName": "Lerato Mokoena",
                "email": "lerato@example.com",
                "message": "Do you run weekend classes?"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(envelope["success"], true);

        let (_, _, contacts) = send(&app, Method::GET, "/admin/api/contacts", Some(SESSION), None).await;
        assert_eq!(contacts[0]["status"], "New");
        assert_eq!(contacts[0]["full_name"], "Lerato Mokoena");
    }

    #[tokio::test]
    async fn invalid_registration_is_422() {
        let (status, _, envelope) = send(
            &test_router(),
            Method::POST,
            "/api/registrations",
            None,
            Some(json!({ "fullName": "S", "email": "nope", "phone": "1" })),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let fields: Vec<&str> = envelope["errors"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(fields, vec!["email", "full_name", "phone"]);
    }

    #[tokio::test]
    async fn unreadable_body_gets_an_envelope() {
        let app = test_router();
        let request = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/api/contact")
            .header(axum::http::header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from("{\"fullName\": "))
            .unwrap();

        let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = http_body_util::BodyExt::collect(response.into_body())
            .await
            .unwrap()
            .to_bytes();
        let envelope: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(envelope["success"], false);
        assert!(envelope["message"].is_string());
    }
}
