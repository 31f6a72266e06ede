//! blog_posts — Articles published on the public blog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::validation::{FieldErrors, Validator, WriteMode};
use super::{ContentKind, Entity};
use crate::store::{Collection, Fields};

/// Image used when a post is saved without one.
pub const PLACEHOLDER_IMAGE_URL: &str = "https://picsum.photos/seed/placeholder/800/600";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub slug: String,
    pub author: String,
    pub category: String,
    pub excerpt: String,
    pub content: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub published_at: String,
    #[serde(default)]
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BlogPostForm {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub published_at: Option<String>,
    pub is_published: Option<bool>,
}

impl Entity for BlogPost {
    const COLLECTION: Collection = Collection::BlogPosts;
}

impl ContentKind for BlogPost {
    type Form = BlogPostForm;

    const NOUN: &'static str = "blog post";
    const TITLE_FIELD: &'static str = "title";
    const FLAG_FIELD: &'static str = "is_published";
    const LISTING_PATH: &'static str = "/blog";
    const DETAIL_PREFIX: Option<&'static str> = Some("/blog");

    fn validate(form: &BlogPostForm, mode: WriteMode) -> Result<Fields, FieldErrors> {
        let mut v = Validator::new(mode);
        v.text("title", form.title.as_deref(), 3, "Title is too short");
        v.slug(form.slug.as_deref());
        v.text("author", form.author.as_deref(), 2, "Author name is required");
        v.text("category", form.category.as_deref(), 2, "Category is required");
        v.text("excerpt", form.excerpt.as_deref(), 10, "Excerpt is too short");
        v.text("content", form.content.as_deref(), 20, "Content is too short");
        v.optional_url("image_url", form.image_url.as_deref(), "Must be a valid URL");
        v.text("published_at", form.published_at.as_deref(), 0, "Publish date is required");
        v.flag("is_published", form.is_published);

        // A post always carries an image; blank or missing on create gets the placeholder.
        let blank_image = match form.image_url.as_deref() {
            Some(url) => url.is_empty(),
            None => mode == WriteMode::Create,
        };
        if blank_image {
            v.set("image_url", Value::String(PLACEHOLDER_IMAGE_URL.to_string()));
        }
        v.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> BlogPostForm {
        BlogPostForm {
            title: Some("Five habits of a good guard".into()),
            author: Some("Training Desk".into()),
            category: Some("Careers".into()),
            excerpt: Some("What separates good guards from great ones.".into()),
            content: Some("Observation, communication, and steady routines matter most.".into()),
            published_at: Some("2024-05-01".into()),
            is_published: Some(true),
            ..Default::default()
        }
    }

    #[test]
    fn missing_image_gets_placeholder_on_create() {
        let fields = BlogPost::validate(&valid_form(), WriteMode::Create).unwrap();
        assert_eq!(fields["image_url"], PLACEHOLDER_IMAGE_URL);
    }

    #[test]
    fn blank_image_gets_placeholder_on_update() {
        let form = BlogPostForm {
            image_url: Some(String::new()),
            ..Default::default()
        };
        let fields = BlogPost::validate(&form, WriteMode::Update).unwrap();
        assert_eq!(fields["image_url"], PLACEHOLDER_IMAGE_URL);
    }

    #[test]
    fn update_without_image_leaves_it_alone() {
        let form = BlogPostForm {
            is_published: Some(false),
            ..Default::default()
        };
        let fields = BlogPost::validate(&form, WriteMode::Update).unwrap();
        assert!(!fields.contains_key("image_url"));
    }

    #[test]
    fn invalid_image_url_is_rejected() {
        let form = BlogPostForm {
            image_url: Some("picsum".into()),
            ..valid_form()
        };
        let errors = BlogPost::validate(&form, WriteMode::Create).unwrap_err();
        assert!(errors.get("image_url").is_some());
    }
}
