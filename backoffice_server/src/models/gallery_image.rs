//! gallery_images — Photos shown in the public gallery.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{FieldErrors, Validator, WriteMode};
use super::{ContentKind, Entity};
use crate::store::{Collection, Fields};

pub const GALLERY_CATEGORIES: [&str; 4] = ["training", "graduates", "facilities", "events"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GalleryCategory {
    Training,
    Graduates,
    Facilities,
    Events,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryImage {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub slug: String,
    pub image_url: String,
    pub category: GalleryCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GalleryImageForm {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

impl Entity for GalleryImage {
    const COLLECTION: Collection = Collection::GalleryImages;
}

impl ContentKind for GalleryImage {
    type Form = GalleryImageForm;

    const NOUN: &'static str = "gallery image";
    const TITLE_FIELD: &'static str = "title";
    const FLAG_FIELD: &'static str = "is_active";
    const LISTING_PATH: &'static str = "/gallery";

    fn validate(form: &GalleryImageForm, mode: WriteMode) -> Result<Fields, FieldErrors> {
        let mut v = Validator::new(mode);
        v.text("title", form.title.as_deref(), 3, "Title is too short");
        v.slug(form.slug.as_deref());
        v.optional_text("description", form.description.as_deref());
        v.url("image_url", form.image_url.as_deref(), "Must be a valid URL");
        v.one_of(
            "category",
            form.category.as_deref(),
            &GALLERY_CATEGORIES,
            "Category must be one of: training, graduates, facilities, events",
        );
        v.flag("is_active", form.is_active);
        v.finish()
    }
}
