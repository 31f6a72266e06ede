//! course_registrations — Course sign-ups submitted from the public site.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{FieldErrors, Validator, WriteMode};
use super::{Entity, LeadKind};
use crate::store::{Collection, Fields};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationStatus {
    #[default]
    New,
    Contacted,
    Enrolled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRegistration {
    pub id: String,
    pub full_name: String,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub id_number: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub emergency_contact_name: String,
    #[serde(default)]
    pub emergency_contact_phone: String,
    #[serde(default)]
    pub course_interest: String,
    pub submission_date: DateTime<Utc>,
    #[serde(default)]
    pub status: RegistrationStatus,
}

impl CourseRegistration {
    /// Column order of the CSV export.
    pub const CSV_COLUMNS: [&'static str; 11] = [
        "id",
        "full_name",
        "phone",
        "email",
        "id_number",
        "address",
        "emergency_contact_name",
        "emergency_contact_phone",
        "course_interest",
        "submission_date",
        "status",
    ];
}

/// Registration submission. Also accepts the camelCase names sent by the
/// public registration form.
#[derive(Debug, Default, Deserialize)]
pub struct RegistrationForm {
    #[serde(alias = "fullName")]
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(alias = "idNumber")]
    pub id_number: Option<String>,
    pub address: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    #[serde(alias = "course")]
    pub course_interest: Option<String>,
}

impl Entity for CourseRegistration {
    const COLLECTION: Collection = Collection::Registrations;
    const TIMESTAMP_FIELD: &'static str = "submission_date";
}

impl LeadKind for CourseRegistration {
    type Form = RegistrationForm;
    type Status = RegistrationStatus;

    const NOUN: &'static str = "registration";
    const STATUS_NOUN: &'static str = "registration status";

    fn validate(form: &RegistrationForm) -> Result<Fields, FieldErrors> {
        let mut v = Validator::new(WriteMode::Create);
        v.text("full_name", form.full_name.as_deref(), 2, "Full name is required");
        v.email("email", form.email.as_deref(), "Invalid email address");
        v.text("phone", form.phone.as_deref(), 7, "Phone number is too short");
        v.text_or_empty("id_number", form.id_number.as_deref());
        v.text_or_empty("address", form.address.as_deref());
        v.text_or_empty("emergency_contact_name", form.emergency_contact_name.as_deref());
        v.text_or_empty("emergency_contact_phone", form.emergency_contact_phone.as_deref());
        v.text_or_empty("course_interest", form.course_interest.as_deref());
        v.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_public_form_field_names() {
        let form: RegistrationForm = serde_json::from_value(json!({
            "fullName": "Sipho Dlamini",
            "email": "sipho@example.com",
            "phone": "0821234567",
            "idNumber": "9001015800087",
            "course": "Grade C"
        }))
        .unwrap();

        let fields = CourseRegistration::validate(&form).unwrap();
        assert_eq!(fields["full_name"], "Sipho Dlamini");
        assert_eq!(fields["id_number"], "9001015800087");
        assert_eq!(fields["course_interest"], "Grade C");
        assert_eq!(fields["address"], "");
    }

    #[test]
    fn status_serializes_as_title_case() {
        assert_eq!(serde_json::to_value(RegistrationStatus::Enrolled).unwrap(), json!("Enrolled"));
        assert_eq!(RegistrationStatus::default(), RegistrationStatus::New);
    }
}
