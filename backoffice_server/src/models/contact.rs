//! contact_submissions — Messages from the public contact form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{FieldErrors, Validator, WriteMode};
use super::{Entity, LeadKind};
use crate::store::{Collection, Fields};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactStatus {
    #[default]
    New,
    #[serde(rename = "Followed Up")]
    FollowedUp,
    Archived,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub id: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_interest: Option<String>,
    pub submission_date: DateTime<Utc>,
    #[serde(default)]
    pub status: ContactStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContactForm {
    #[serde(alias = "fullName")]
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
    #[serde(alias = "courseInterest")]
    pub course_interest: Option<String>,
}

impl Entity for ContactSubmission {
    const COLLECTION: Collection = Collection::ContactSubmissions;
    const TIMESTAMP_FIELD: &'static str = "submission_date";
}

impl LeadKind for ContactSubmission {
    type Form = ContactForm;
    type Status = ContactStatus;

    const NOUN: &'static str = "contact submission";
    const STATUS_NOUN: &'static str = "contact status";

    fn validate(form: &ContactForm) -> Result<Fields, FieldErrors> {
        let mut v = Validator::new(WriteMode::Create);
        v.text("full_name", form.full_name.as_deref(), 2, "Full name is required");
        v.email("email", form.email.as_deref(), "Invalid email address");
        v.text_or_empty("phone", form.phone.as_deref());
        v.text("message", form.message.as_deref(), 10, "Message is too short");
        v.optional_text("course_interest", form.course_interest.as_deref());
        v.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn followed_up_uses_display_name() {
        assert_eq!(serde_json::to_value(ContactStatus::FollowedUp).unwrap(), json!("Followed Up"));
        let parsed: ContactStatus = serde_json::from_value(json!("Followed Up")).unwrap();
        assert_eq!(parsed, ContactStatus::FollowedUp);
    }

    #[test]
    fn message_is_required() {
        let form = ContactForm {
            full_name: Some("Lerato".into()),
            email: Some("lerato@example.com".into()),
            ..Default::default()
        };
        let errors = ContactSubmission::validate(&form).unwrap_err();
        assert_eq!(errors.get("message"), Some(&["Required".to_string()][..]));
    }
}
