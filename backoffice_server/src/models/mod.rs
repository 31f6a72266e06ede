//! Back-office data models — one canonical schema per entity.

pub mod blog_post;
pub mod contact;
pub mod course;
pub mod gallery_image;
pub mod registration;
pub mod testimonial;
pub mod validation;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::store::{Collection, Fields};
use validation::{FieldErrors, WriteMode};

/// A typed entity backed by one collection.
pub trait Entity: DeserializeOwned + Serialize + Send + Sync + 'static {
    const COLLECTION: Collection;
    /// Field the store's creation time is exposed under.
    const TIMESTAMP_FIELD: &'static str = "created_at";
}

/// Publishable content edited through the admin forms.
pub trait ContentKind: Entity {
    /// Submitted form fields (everything except the id).
    type Form: DeserializeOwned + Send + Sync;

    /// Used in user-facing failure messages ("Failed to save course.").
    const NOUN: &'static str;
    /// Field the slug is derived from.
    const TITLE_FIELD: &'static str;
    /// Visibility/approval flag toggled from the listing tables.
    const FLAG_FIELD: &'static str;
    /// Names the flag in failure messages ("Failed to update status.").
    const FLAG_NOUN: &'static str = "status";
    /// Public listing page.
    const LISTING_PATH: &'static str;
    /// Public detail page prefix; `None` when items have no page of their own.
    const DETAIL_PREFIX: Option<&'static str> = None;

    /// Check the supplied fields and return the ones to write.
    fn validate(form: &Self::Form, mode: WriteMode) -> Result<Fields, FieldErrors>;
}

/// Contact-style submissions awaiting staff follow-up.
pub trait LeadKind: Entity {
    type Form: DeserializeOwned + Send + Sync;
    type Status: Serialize + DeserializeOwned + Default + Send + Sync;

    const NOUN: &'static str;
    /// Names the status in failure messages.
    const STATUS_NOUN: &'static str;

    fn validate(form: &Self::Form) -> Result<Fields, FieldErrors>;
}
