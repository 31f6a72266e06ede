//! Content mutation handler — validate, derive slug, persist, revalidate.
//!
//! One generic flow serves courses, blog posts, testimonials and gallery
//! images; the per-entity rules live in their [`ContentKind`] impls.

use serde::Deserialize;
use serde_json::Value;

use super::{record_outcome, MutationError, Saved, SiteContext};
use crate::models::validation::WriteMode;
use crate::models::ContentKind;
use crate::store::{Document, Fields, StoreError};

/// A form submission: `id` present means update, absent (or blank) means create.
#[derive(Debug, Deserialize)]
pub struct SaveRequest<F> {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub form: F,
}

/// Create or partially update one item.
pub async fn save<K: ContentKind>(
    ctx: &SiteContext,
    request: SaveRequest<K::Form>,
) -> Result<Saved, MutationError> {
    let id = request.id.filter(|id| !id.trim().is_empty());
    let result = save_item::<K>(ctx, id, &request.form).await;
    record_outcome(K::COLLECTION, &result);
    result
}

async fn save_item<K: ContentKind>(
    ctx: &SiteContext,
    id: Option<String>,
    form: &K::Form,
) -> Result<Saved, MutationError> {
    let mode = if id.is_some() {
        WriteMode::Update
    } else {
        WriteMode::Create
    };
    let mut fields = K::validate(form, mode).map_err(MutationError::Invalid)?;

    if !fields.contains_key("slug") {
        if let Some(title) = fields.get(K::TITLE_FIELD).and_then(Value::as_str) {
            let slug = ctx.slugs.derive(title).await;
            fields.insert("slug".to_string(), Value::String(slug));
        }
    }

    let previous_slug = match (&id, fields.get("slug")) {
        (Some(id), Some(_)) if K::DETAIL_PREFIX.is_some() => stored_slug::<K>(ctx, id).await,
        _ => None,
    };

    let written = match &id {
        Some(id) => ctx.store.update(K::COLLECTION, id, fields).await,
        None => ctx.store.insert(K::COLLECTION, fields).await,
    };
    let doc = written.map_err(|e| {
        tracing::error!(collection = %K::COLLECTION, id = ?id, error = %e, "Save failed");
        MutationError::failed("save", K::NOUN, e)
    })?;

    let created = id.is_none();
    tracing::info!(collection = %K::COLLECTION, id = %doc.id, created, "Content saved");
    let mut paths = public_paths::<K>(&doc);
    if let (Some(prefix), Some(old)) = (K::DETAIL_PREFIX, previous_slug) {
        let old_path = format!("{prefix}/{old}");
        if !paths.contains(&old_path) {
            paths.insert(0, old_path);
        }
    }
    ctx.notifier.spawn(paths);

    Ok(Saved {
        slug: doc.str_field("slug").map(str::to_string),
        id: doc.id,
        created,
    })
}

/// Slug currently stored for `id`. A lookup failure is left for the write
/// that follows to report.
async fn stored_slug<K: ContentKind>(ctx: &SiteContext, id: &str) -> Option<String> {
    let doc = ctx.store.get(K::COLLECTION, id).await.ok().flatten()?;
    doc.str_field("slug")
        .filter(|slug| !slug.is_empty())
        .map(str::to_string)
}

/// Flip the kind's visibility flag; returns the new value.
pub async fn toggle<K: ContentKind>(
    ctx: &SiteContext,
    id: &str,
    current: bool,
) -> Result<bool, MutationError> {
    let new_status = !current;
    let mut patch = Fields::new();
    patch.insert(K::FLAG_FIELD.to_string(), Value::Bool(new_status));

    let result = ctx
        .store
        .update(K::COLLECTION, id, patch)
        .await
        .map_err(|e| {
            tracing::error!(collection = %K::COLLECTION, id, error = %e, "Status update failed");
            MutationError::failed("update", K::FLAG_NOUN, e)
        })
        .map(|doc| {
            tracing::info!(collection = %K::COLLECTION, id, flag = K::FLAG_FIELD, new_status, "Status toggled");
            ctx.notifier.spawn(public_paths::<K>(&doc));
            new_status
        });
    record_outcome(K::COLLECTION, &result);
    result
}

/// Delete one item. Unknown ids fail without touching the public site.
pub async fn delete<K: ContentKind>(ctx: &SiteContext, id: &str) -> Result<(), MutationError> {
    let result = delete_item::<K>(ctx, id).await;
    record_outcome(K::COLLECTION, &result);
    result
}

async fn delete_item<K: ContentKind>(ctx: &SiteContext, id: &str) -> Result<(), MutationError> {
    let fail = |e: StoreError| {
        tracing::warn!(collection = %K::COLLECTION, id, error = %e, "Delete failed");
        MutationError::failed("delete", K::NOUN, e)
    };

    let doc = ctx
        .store
        .get(K::COLLECTION, id)
        .await
        .and_then(|doc| doc.ok_or_else(|| StoreError::not_found(K::COLLECTION, id)))
        .map_err(fail)?;
    ctx.store.delete(K::COLLECTION, id).await.map_err(fail)?;

    tracing::info!(collection = %K::COLLECTION, id, "Content deleted");
    ctx.notifier.spawn(public_paths::<K>(&doc));
    Ok(())
}

/// Public pages that may render `doc`: its detail page, the listing, the root.
pub fn public_paths<K: ContentKind>(doc: &Document) -> Vec<String> {
    let mut paths = Vec::with_capacity(3);
    if let (Some(prefix), Some(slug)) = (K::DETAIL_PREFIX, doc.str_field("slug")) {
        if !slug.is_empty() {
            paths.push(format!("{prefix}/{slug}"));
        }
    }
    paths.push(K::LISTING_PATH.to_string());
    paths.push("/".to_string());
    paths
}
