//! Admin JSON API handlers. Every route here sits behind the session guard.

use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use super::{Envelope, JsonBody, SiteState};
use crate::models::{ContentKind, Entity, LeadKind};
use crate::services::content_service::{self, SaveRequest};
use crate::services::dashboard_service::{self, DashboardSummary};
use crate::services::{get, lead_service, list};
use crate::store::StoreError;

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    /// The flag value the admin saw when clicking.
    #[serde(alias = "currentStatus")]
    pub current: bool,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest<S> {
    pub status: S,
}

fn load_failed(what: &str, e: StoreError) -> Response {
    tracing::error!(error = %e, "Failed to load {what}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(Envelope::failure(format!("Failed to load {what}."))),
    )
        .into_response()
}

// ── Dashboard ──

pub async fn dashboard(State(state): State<SiteState>) -> Result<Json<DashboardSummary>, Response> {
    dashboard_service::summary(state.ctx.store.as_ref())
        .await
        .map(Json)
        .map_err(|e| load_failed("dashboard", e))
}

// ── Listings ──

pub async fn list_entities<T: Entity>(
    State(state): State<SiteState>,
) -> Result<Json<Vec<T>>, Response> {
    list::<T>(state.ctx.store.as_ref())
        .await
        .map(Json)
        .map_err(|e| load_failed(&T::COLLECTION.as_str().replace('_', " "), e))
}

// ── Content ──

pub async fn get_content<K: ContentKind>(
    State(state): State<SiteState>,
    Path(id): Path<String>,
) -> Result<Json<K>, Response> {
    match get::<K>(state.ctx.store.as_ref(), &id).await {
        Ok(Some(item)) => Ok(Json(item)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(Envelope::failure(format!("{} not found.", capitalize(K::NOUN)))),
        )
            .into_response()),
        Err(e) => Err(load_failed(K::NOUN, e)),
    }
}

pub async fn save_content<K: ContentKind>(
    State(state): State<SiteState>,
    JsonBody(request): JsonBody<SaveRequest<K::Form>>,
) -> Response {
    match content_service::save::<K>(&state.ctx, request).await {
        Ok(saved) => {
            let status = if saved.created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            let body = Envelope {
                id: Some(saved.id),
                slug: saved.slug,
                ..Envelope::ok()
            };
            (status, Json(body)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

pub async fn toggle_content<K: ContentKind>(
    State(state): State<SiteState>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<ToggleRequest>,
) -> Response {
    match content_service::toggle::<K>(&state.ctx, &id, request.current).await {
        Ok(new_status) => Json(Envelope {
            new_status: Some(new_status.into()),
            ..Envelope::ok()
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn delete_content<K: ContentKind>(
    State(state): State<SiteState>,
    Path(id): Path<String>,
) -> Response {
    match content_service::delete::<K>(&state.ctx, &id).await {
        Ok(()) => Json(Envelope::ok()).into_response(),
        Err(e) => e.into_response(),
    }
}

// ── Leads ──

pub async fn update_lead_status<L: LeadKind>(
    State(state): State<SiteState>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<StatusRequest<L::Status>>,
) -> Response {
    match lead_service::update_status::<L>(&state.ctx, &id, &request.status).await {
        Ok(()) => Json(Envelope {
            new_status: serde_json::to_value(&request.status).ok(),
            ..Envelope::ok()
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn export_registrations(State(state): State<SiteState>) -> Response {
    match lead_service::export_registrations_csv(state.ctx.store.as_ref()).await {
        Ok(csv) => {
            let filename = format!("registrations-{}.csv", chrono::Utc::now().format("%Y-%m-%d"));
            (
                [
                    (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
                ],
                csv,
            )
                .into_response()
        }
        Err(e) => load_failed("registrations", e),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
