//! Field-level validation shared by every form.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::store::Fields;

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

const REQUIRED: &str = "Required";

/// Create validates every required field; update only the supplied ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    Update,
}

/// Field name → messages, returned to the caller when a submission is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Collects validated fields and errors for one submission.
pub struct Validator {
    mode: WriteMode,
    fields: Fields,
    errors: FieldErrors,
}

impl Validator {
    pub fn new(mode: WriteMode) -> Self {
        Self {
            mode,
            fields: Fields::new(),
            errors: FieldErrors::default(),
        }
    }

    /// Returns the value to check, or records "Required" when a create omits it.
    fn required<'a, T: ?Sized>(&mut self, name: &str, value: Option<&'a T>) -> Option<&'a T> {
        if value.is_none() && self.mode == WriteMode::Create {
            self.errors.add(name, REQUIRED);
        }
        value
    }

    /// Required text with a minimum length in characters.
    pub fn text(&mut self, name: &str, value: Option<&str>, min_chars: usize, message: &str) {
        let Some(value) = self.required(name, value) else {
            return;
        };
        if value.chars().count() < min_chars {
            self.errors.add(name, message);
        } else {
            self.fields.insert(name.to_string(), Value::String(value.to_string()));
        }
    }

    /// Free text written only when supplied.
    pub fn optional_text(&mut self, name: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.fields.insert(name.to_string(), Value::String(value.to_string()));
        }
    }

    /// Optional text that defaults to empty on create.
    pub fn text_or_empty(&mut self, name: &str, value: Option<&str>) {
        match value {
            Some(value) => self.optional_text(name, Some(value)),
            None if self.mode == WriteMode::Create => {
                self.fields.insert(name.to_string(), Value::String(String::new()));
            }
            None => {}
        }
    }

    /// A supplied, non-blank slug. Blank slugs are left for derivation.
    pub fn slug(&mut self, value: Option<&str>) {
        if let Some(slug) = value.map(str::trim).filter(|s| !s.is_empty()) {
            self.fields.insert("slug".to_string(), Value::String(slug.to_string()));
        }
    }

    pub fn number(&mut self, name: &str, value: Option<f64>, min: f64, message: &str) {
        let Some(value) = self.required(name, value.as_ref()).copied() else {
            return;
        };
        match serde_json::Number::from_f64(value) {
            Some(n) if value >= min => {
                self.fields.insert(name.to_string(), Value::Number(n));
            }
            _ => self.errors.add(name, message),
        }
    }

    /// Optional integer constrained to `min..=max`.
    pub fn integer_in(&mut self, name: &str, value: Option<i64>, min: i64, max: i64, message: &str) {
        let Some(value) = value else {
            return;
        };
        if (min..=max).contains(&value) {
            self.fields.insert(name.to_string(), Value::from(value));
        } else {
            self.errors.add(name, message);
        }
    }

    /// Boolean flag; defaults to `false` on create.
    pub fn flag(&mut self, name: &str, value: Option<bool>) {
        match value {
            Some(b) => {
                self.fields.insert(name.to_string(), Value::Bool(b));
            }
            None if self.mode == WriteMode::Create => {
                self.fields.insert(name.to_string(), Value::Bool(false));
            }
            None => {}
        }
    }

    /// Required absolute http(s) URL.
    pub fn url(&mut self, name: &str, value: Option<&str>, message: &str) {
        let Some(value) = self.required(name, value) else {
            return;
        };
        if is_web_url(value) {
            self.fields.insert(name.to_string(), Value::String(value.to_string()));
        } else {
            self.errors.add(name, message);
        }
    }

    /// Optional URL; an empty string is accepted and written as empty.
    pub fn optional_url(&mut self, name: &str, value: Option<&str>, message: &str) {
        match value {
            None => {}
            Some("") => {
                self.fields.insert(name.to_string(), Value::String(String::new()));
            }
            Some(url) if is_web_url(url) => {
                self.fields.insert(name.to_string(), Value::String(url.to_string()));
            }
            Some(_) => self.errors.add(name, message),
        }
    }

    pub fn email(&mut self, name: &str, value: Option<&str>, message: &str) {
        let Some(value) = self.required(name, value) else {
            return;
        };
        if EMAIL_REGEX.is_match(value.trim()) {
            self.fields.insert(name.to_string(), Value::String(value.trim().to_string()));
        } else {
            self.errors.add(name, message);
        }
    }

    /// Required value drawn from a closed set.
    pub fn one_of(&mut self, name: &str, value: Option<&str>, allowed: &[&str], message: &str) {
        let Some(value) = self.required(name, value) else {
            return;
        };
        if allowed.contains(&value) {
            self.fields.insert(name.to_string(), Value::String(value.to_string()));
        } else {
            self.errors.add(name, message);
        }
    }

    /// Write a value that needs no checking.
    pub fn set(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }

    pub fn finish(self) -> Result<Fields, FieldErrors> {
        if self.errors.is_empty() {
            Ok(self.fields)
        } else {
            Err(self.errors)
        }
    }
}

fn is_web_url(value: &str) -> bool {
    reqwest::Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}

/// Form inputs post numbers either as JSON numbers or as the text typed in.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

/// `Option<f64>` that also accepts numeric strings. A blank string counts as
/// absent; any other non-numeric text becomes NaN and fails range checks.
pub fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
        None => None,
        Some(NumberOrText::Number(n)) => Some(n),
        Some(NumberOrText::Text(text)) if text.trim().is_empty() => None,
        Some(NumberOrText::Text(text)) => Some(text.trim().parse().unwrap_or(f64::NAN)),
    })
}

/// `Option<i64>` that also accepts integral numeric strings (`"4"`, `"4.0"`).
pub fn lenient_integer<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<i64>, D::Error> {
    let value = match Option::<NumberOrText>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(NumberOrText::Number(n)) => n,
        Some(NumberOrText::Text(text)) if text.trim().is_empty() => return Ok(None),
        Some(NumberOrText::Text(text)) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("expected a whole number, got `{text}`")))?,
    };
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Ok(Some(value as i64))
    } else {
        Err(D::Error::custom(format!("expected a whole number, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn create_reports_missing_required_fields() {
        let mut v = Validator::new(WriteMode::Create);
        v.text("title", None, 3, "Title is too short");
        v.number("price", None, 0.0, "Price must be a positive number.");

        let errors = v.finish().unwrap_err();
        assert_eq!(errors.get("title"), Some(&["Required".to_string()][..]));
        assert_eq!(errors.get("price"), Some(&["Required".to_string()][..]));
    }

    #[test]
    fn update_skips_missing_fields() {
        let mut v = Validator::new(WriteMode::Update);
        v.text("title", None, 3, "Title is too short");
        v.flag("is_active", None);
        v.text("duration", Some("3 weeks"), 1, "Duration is required.");

        let fields = v.finish().unwrap();
        assert_eq!(Value::Object(fields), json!({"duration": "3 weeks"}));
    }

    #[test]
    fn short_text_is_rejected_with_message() {
        let mut v = Validator::new(WriteMode::Update);
        v.text("title", Some("ab"), 3, "Title must be at least 3 characters long.");
        let errors = v.finish().unwrap_err();
        assert_eq!(
            errors.get("title"),
            Some(&["Title must be at least 3 characters long.".to_string()][..])
        );
    }

    #[test]
    fn flags_default_to_false_on_create() {
        let mut v = Validator::new(WriteMode::Create);
        v.flag("is_active", None);
        assert_eq!(Value::Object(v.finish().unwrap()), json!({"is_active": false}));
    }

    #[test]
    fn negative_price_is_rejected() {
        let mut v = Validator::new(WriteMode::Create);
        v.number("price", Some(-1.0), 0.0, "Price must be a positive number.");
        assert!(v.finish().is_err());
    }

    #[rstest]
    #[case("https://example.com/a.png", true)]
    #[case("http://localhost:3000/x", true)]
    #[case("ftp://example.com/file", false)]
    #[case("not a url", false)]
    fn url_validation(#[case] input: &str, #[case] valid: bool) {
        let mut v = Validator::new(WriteMode::Create);
        v.url("image_url", Some(input), "Must be a valid URL");
        assert_eq!(v.finish().is_ok(), valid);
    }

    #[test]
    fn blank_optional_url_is_kept_empty() {
        let mut v = Validator::new(WriteMode::Update);
        v.optional_url("image_url", Some(""), "Must be a valid URL");
        assert_eq!(Value::Object(v.finish().unwrap()), json!({"image_url": ""}));
    }

    #[rstest]
    #[case("trainee@example.com", true)]
    #[case(" trainee@example.com ", true)]
    #[case("trainee@example", false)]
    #[case("trainee.example.com", false)]
    fn email_validation(#[case] input: &str, #[case] valid: bool) {
        let mut v = Validator::new(WriteMode::Create);
        v.email("email", Some(input), "Invalid email address");
        assert_eq!(v.finish().is_ok(), valid);
    }

    #[test]
    fn blank_slug_is_not_written() {
        let mut v = Validator::new(WriteMode::Update);
        v.slug(Some("   "));
        assert!(!v.fields.contains_key("slug"));
        v.slug(Some(" fire-safety "));
        assert_eq!(Value::Object(v.finish().unwrap()), json!({"slug": "fire-safety"}));
    }

    #[derive(Debug, Deserialize)]
    struct NumericForm {
        #[serde(default, deserialize_with = "lenient_number")]
        price: Option<f64>,
        #[serde(default, deserialize_with = "lenient_integer")]
        rating: Option<i64>,
    }

    fn numeric(body: Value) -> Result<NumericForm, serde_json::Error> {
        serde_json::from_value(body)
    }

    #[rstest]
    #[case(json!({"price": 450}), Some(450.0))]
    #[case(json!({"price": 19.5}), Some(19.5))]
    #[case(json!({"price": "450"}), Some(450.0))]
    #[case(json!({"price": " 19.50 "}), Some(19.5))]
    #[case(json!({"price": ""}), None)]
    #[case(json!({"price": null}), None)]
    #[case(json!({}), None)]
    fn numbers_accept_numeric_text(#[case] body: Value, #[case] expected: Option<f64>) {
        assert_eq!(numeric(body).unwrap().price, expected);
    }

    #[test]
    fn non_numeric_price_fails_validation() {
        let form = numeric(json!({"price": "free"})).unwrap();
        assert!(form.price.is_some_and(f64::is_nan));

        let mut v = Validator::new(WriteMode::Create);
        v.number("price", form.price, 0.0, "Price must be a positive number.");
        let errors = v.finish().unwrap_err();
        assert_eq!(
            errors.get("price"),
            Some(&["Price must be a positive number.".to_string()][..])
        );
    }

    #[rstest]
    #[case(json!({"rating": 4}), Some(4))]
    #[case(json!({"rating": "5"}), Some(5))]
    #[case(json!({"rating": "3.0"}), Some(3))]
    #[case(json!({"rating": ""}), None)]
    fn integers_accept_integral_text(#[case] body: Value, #[case] expected: Option<i64>) {
        assert_eq!(numeric(body).unwrap().rating, expected);
    }

    #[rstest]
    #[case(json!({"rating": "four"}))]
    #[case(json!({"rating": 4.5}))]
    #[case(json!({"rating": true}))]
    fn integers_reject_other_values(#[case] body: Value) {
        assert!(numeric(body).is_err());
    }
}
