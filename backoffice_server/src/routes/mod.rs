//! Back-office HTTP routes — public lead intake, admin JSON API, session.

pub mod admin;
pub mod auth;
pub mod public;

use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post, put};
use axum::Router;
use serde::Serialize;
use serde_json::Value;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::models::blog_post::BlogPost;
use crate::models::contact::ContactSubmission;
use crate::models::course::Course;
use crate::models::gallery_image::GalleryImage;
use crate::models::registration::CourseRegistration;
use crate::models::testimonial::Testimonial;
use crate::models::validation::FieldErrors;
use crate::services::identity_service::IdentityClient;
use crate::services::{MutationError, SiteContext};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared state for route handlers.
#[derive(Clone)]
pub struct SiteState {
    pub ctx: SiteContext,
    pub identity: IdentityClient,
    /// Adds `Secure` to session cookies.
    pub secure_cookies: bool,
}

/// JSON body returned by every mutation.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_status: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Envelope {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Default::default()
        }
    }
}

impl IntoResponse for MutationError {
    fn into_response(self) -> Response {
        let status = match &self {
            MutationError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            e if e.is_not_found() => StatusCode::NOT_FOUND,
            MutationError::Failed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = match self {
            MutationError::Invalid(errors) => Envelope {
                errors: Some(errors),
                message: Some("Please correct the highlighted fields.".to_string()),
                ..Default::default()
            },
            failed => Envelope::failure(failed.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

/// JSON request body whose rejections still answer with an [`Envelope`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(BodyRejection))]
pub struct JsonBody<T>(pub T);

/// A body that could not be read as the expected JSON.
#[derive(Debug)]
pub struct BodyRejection(JsonRejection);

impl From<JsonRejection> for BodyRejection {
    fn from(rejection: JsonRejection) -> Self {
        Self(rejection)
    }
}

impl IntoResponse for BodyRejection {
    fn into_response(self) -> Response {
        let status = self.0.status();
        let message = self.0.body_text();
        tracing::debug!(%status, error = %message, "Request body rejected");
        (status, Json(Envelope::failure(message))).into_response()
    }
}

/// Build the back-office router.
pub fn site_router(state: SiteState) -> Router {
    let admin_api = Router::new()
        .route("/dashboard", get(admin::dashboard))
        .route(
            "/courses",
            get(admin::list_entities::<Course>).post(admin::save_content::<Course>),
        )
        .route(
            "/courses/{id}",
            get(admin::get_content::<Course>).delete(admin::delete_content::<Course>),
        )
        .route("/courses/{id}/toggle", post(admin::toggle_content::<Course>))
        .route(
            "/blog",
            get(admin::list_entities::<BlogPost>).post(admin::save_content::<BlogPost>),
        )
        .route(
            "/blog/{id}",
            get(admin::get_content::<BlogPost>).delete(admin::delete_content::<BlogPost>),
        )
        .route(
            "/testimonials",
            get(admin::list_entities::<Testimonial>).post(admin::save_content::<Testimonial>),
        )
        .route(
            "/testimonials/{id}",
            axum::routing::delete(admin::delete_content::<Testimonial>),
        )
        .route(
            "/testimonials/{id}/approval",
            post(admin::toggle_content::<Testimonial>),
        )
        .route(
            "/gallery",
            get(admin::list_entities::<GalleryImage>).post(admin::save_content::<GalleryImage>),
        )
        .route(
            "/gallery/{id}",
            get(admin::get_content::<GalleryImage>).delete(admin::delete_content::<GalleryImage>),
        )
        .route("/registrations", get(admin::list_entities::<CourseRegistration>))
        .route("/registrations/export", get(admin::export_registrations))
        .route(
            "/registrations/{id}/status",
            put(admin::update_lead_status::<CourseRegistration>),
        )
        .route("/contacts", get(admin::list_entities::<ContactSubmission>))
        .route(
            "/contacts/{id}/status",
            put(admin::update_lead_status::<ContactSubmission>),
        )
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ));

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/healthz", get(healthz))
        // Public lead intake
        .route(
            "/api/registrations",
            post(public::create_lead::<CourseRegistration>),
        )
        .route("/api/contact", post(public::create_lead::<ContactSubmission>))
        // Session
        .route("/admin/login", post(auth::login))
        .route("/admin/logout", post(auth::logout))
        // Admin API
        .nest("/admin/api", admin_api)
        .layer(from_fn(auth::require_session))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
