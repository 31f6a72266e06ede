//! Back-office services — content mutations, leads, slugs, revalidation.

pub mod content_service;
pub mod dashboard_service;
pub mod identity_service;
pub mod lead_service;
pub mod revalidate;
pub mod slug;

use std::sync::Arc;

use serde::Serialize;

use crate::models::validation::FieldErrors;
use crate::models::Entity;
use crate::store::{Collection, Document, DocumentStore, StoreError};
use revalidate::RevalidationNotifier;
use slug::SlugDeriver;

/// Collaborators every mutation needs.
#[derive(Clone)]
pub struct SiteContext {
    pub store: Arc<dyn DocumentStore>,
    pub slugs: SlugDeriver,
    pub notifier: RevalidationNotifier,
}

/// Result of a successful create or update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Saved {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip)]
    pub created: bool,
}

/// Every mutation either fully succeeds or fails with one of these.
#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    /// Rejected before reaching storage.
    #[error("invalid submission")]
    Invalid(FieldErrors),
    /// Storage failed; `message` is safe to show to the user.
    #[error("{message}")]
    Failed {
        message: String,
        #[source]
        source: StoreError,
    },
}

impl MutationError {
    pub fn failed(action: &str, noun: &str, source: StoreError) -> Self {
        MutationError::Failed {
            message: format!("Failed to {action} {noun}."),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, MutationError::Failed { source, .. } if source.is_not_found())
    }
}

/// Decode every document of `T`'s collection, newest first. Documents that
/// no longer match the schema are skipped with a warning.
pub async fn list<T: Entity>(store: &dyn DocumentStore) -> Result<Vec<T>, StoreError> {
    let docs = store.list(T::COLLECTION).await?;
    Ok(docs.iter().filter_map(decode_logged::<T>).collect())
}

/// Decode one document by id.
pub async fn get<T: Entity>(store: &dyn DocumentStore, id: &str) -> Result<Option<T>, StoreError> {
    store
        .get(T::COLLECTION, id)
        .await?
        .map(|doc| doc.decode(T::TIMESTAMP_FIELD))
        .transpose()
}

fn decode_logged<T: Entity>(doc: &Document) -> Option<T> {
    match doc.decode(T::TIMESTAMP_FIELD) {
        Ok(entity) => Some(entity),
        Err(e) => {
            tracing::warn!(collection = %T::COLLECTION, error = %e, "Skipping undecodable document");
            None
        }
    }
}

pub(crate) fn record_outcome<T>(collection: Collection, result: &Result<T, MutationError>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(MutationError::Invalid(_)) => "invalid",
        Err(MutationError::Failed { .. }) => "failed",
    };
    crate::metrics::mutation_recorded(collection.as_str(), outcome);
}
