//! testimonials — Graduate feedback shown once approved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{lenient_integer, FieldErrors, Validator, WriteMode};
use super::{ContentKind, Entity};
use crate::store::{Collection, Fields};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Testimonial {
    pub id: String,
    pub student_name: String,
    #[serde(default)]
    pub slug: String,
    pub current_position: String,
    pub testimonial_text: String,
    #[serde(default)]
    pub is_approved: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TestimonialForm {
    pub student_name: Option<String>,
    pub slug: Option<String>,
    pub current_position: Option<String>,
    pub testimonial_text: Option<String>,
    #[serde(default, deserialize_with = "lenient_integer")]
    pub rating: Option<i64>,
    pub is_approved: Option<bool>,
    pub is_featured: Option<bool>,
}

impl Entity for Testimonial {
    const COLLECTION: Collection = Collection::Testimonials;
}

impl ContentKind for Testimonial {
    type Form = TestimonialForm;

    const NOUN: &'static str = "testimonial";
    const TITLE_FIELD: &'static str = "student_name";
    const FLAG_FIELD: &'static str = "is_approved";
    const FLAG_NOUN: &'static str = "testimonial status";
    const LISTING_PATH: &'static str = "/testimonials";

    fn validate(form: &TestimonialForm, mode: WriteMode) -> Result<Fields, FieldErrors> {
        let mut v = Validator::new(mode);
        v.text("student_name", form.student_name.as_deref(), 2, "Student name is required");
        v.slug(form.slug.as_deref());
        v.text(
            "current_position",
            form.current_position.as_deref(),
            2,
            "Current position is required",
        );
        v.text(
            "testimonial_text",
            form.testimonial_text.as_deref(),
            10,
            "Testimonial is too short",
        );
        v.integer_in("rating", form.rating, 1, 5, "Rating must be between 1 and 5");
        v.flag("is_approved", form.is_approved);
        v.flag("is_featured", form.is_featured);
        v.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some(0), false)]
    #[case(Some(1), true)]
    #[case(Some(5), true)]
    #[case(Some(6), false)]
    #[case(None, true)]
    fn rating_range(#[case] rating: Option<i64>, #[case] valid: bool) {
        let form = TestimonialForm {
            student_name: Some("Thandi M.".into()),
            current_position: Some("Site supervisor".into()),
            testimonial_text: Some("The course got me my first job.".into()),
            rating,
            ..Default::default()
        };
        assert_eq!(Testimonial::validate(&form, WriteMode::Create).is_ok(), valid);
    }

    #[test]
    fn new_testimonials_start_unapproved() {
        let form = TestimonialForm {
            student_name: Some("Thandi M.".into()),
            current_position: Some("Site supervisor".into()),
            testimonial_text: Some("The course got me my first job.".into()),
            ..Default::default()
        };
        let fields = Testimonial::validate(&form, WriteMode::Create).unwrap();
        assert_eq!(fields["is_approved"], false);
    }
}
