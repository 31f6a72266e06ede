//! courses — Training courses listed in the public catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{lenient_number, FieldErrors, Validator, WriteMode};
use super::{ContentKind, Entity};
use crate::store::{Collection, Fields};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub slug: String,
    pub short_description: String,
    pub full_description: String,
    pub grade_level: String,
    pub duration: String,
    pub price: f64,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_prospects: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Course form submission.
#[derive(Debug, Default, Deserialize)]
pub struct CourseForm {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub short_description: Option<String>,
    pub full_description: Option<String>,
    pub grade_level: Option<String>,
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub price: Option<f64>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub image_url: Option<String>,
    pub requirements: Option<String>,
    pub certification: Option<String>,
    pub job_prospects: Option<String>,
}

impl Entity for Course {
    const COLLECTION: Collection = Collection::Courses;
}

impl ContentKind for Course {
    type Form = CourseForm;

    const NOUN: &'static str = "course";
    const TITLE_FIELD: &'static str = "title";
    const FLAG_FIELD: &'static str = "is_active";
    const LISTING_PATH: &'static str = "/courses";
    const DETAIL_PREFIX: Option<&'static str> = Some("/courses");

    fn validate(form: &CourseForm, mode: WriteMode) -> Result<Fields, FieldErrors> {
        let mut v = Validator::new(mode);
        v.text(
            "title",
            form.title.as_deref(),
            3,
            "Title must be at least 3 characters long.",
        );
        v.slug(form.slug.as_deref());
        v.text(
            "short_description",
            form.short_description.as_deref(),
            10,
            "Short description is too short.",
        );
        v.text(
            "full_description",
            form.full_description.as_deref(),
            20,
            "Full description is too short.",
        );
        v.text("grade_level", form.grade_level.as_deref(), 1, "Grade level is required.");
        v.text("duration", form.duration.as_deref(), 1, "Duration is required.");
        v.number("price", form.price, 0.0, "Price must be a positive number.");
        v.flag("is_active", form.is_active);
        v.flag("is_featured", form.is_featured);
        v.optional_url("image_url", form.image_url.as_deref(), "Must be a valid URL");
        v.optional_text("requirements", form.requirements.as_deref());
        v.optional_text("certification", form.certification.as_deref());
        v.optional_text("job_prospects", form.job_prospects.as_deref());
        v.finish()
    }
}
