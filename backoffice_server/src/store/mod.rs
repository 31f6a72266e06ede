//! Storage collaborators — one capability set, several backends.
//!
//! The backend is chosen once at startup ([`Backend`]) and handed to the
//! rest of the server as an `Arc<dyn DocumentStore>`.

pub mod firestore;
pub mod memory;
pub mod postgres;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::SiteConfig;

/// A flat JSON object of entity fields.
pub type Fields = serde_json::Map<String, Value>;

/// Collections known to the back-office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Courses,
    BlogPosts,
    Testimonials,
    GalleryImages,
    Registrations,
    ContactSubmissions,
}

impl Collection {
    /// Name used by every backend (table key, Firestore collection id).
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Courses => "courses",
            Collection::BlogPosts => "blog_posts",
            Collection::Testimonials => "testimonials",
            Collection::GalleryImages => "gallery_images",
            Collection::Registrations => "course_registrations",
            Collection::ContactSubmissions => "contact_submissions",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored record: server-assigned id and creation time plus its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// String field accessor.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Deserialize into a typed entity. The id is exposed as `id` and the
    /// creation time under `timestamp_field`.
    pub fn decode<T: DeserializeOwned>(&self, timestamp_field: &str) -> Result<T, StoreError> {
        let mut map = self.fields.clone();
        map.insert("id".to_string(), Value::String(self.id.clone()));
        map.insert(
            timestamp_field.to_string(),
            Value::String(self.created_at.to_rfc3339()),
        );
        serde_json::from_value(Value::Object(map))
            .map_err(|e| StoreError::Decode(format!("{}: {e}", self.id)))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{collection}/{id} not found")]
    NotFound { collection: Collection, id: String },
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("connection pool error: {0}")]
    Pool(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{backend} rejected request ({status}): {body}")]
    Rejected {
        backend: &'static str,
        status: u16,
        body: String,
    },
    #[error("malformed document {0}")]
    Decode(String),
}

impl StoreError {
    pub fn not_found(collection: Collection, id: &str) -> Self {
        StoreError::NotFound {
            collection,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// get-all / get-by-id / insert / partial update / delete over collections.
///
/// `insert` assigns the id and `created_at`; `update` merges `patch` into the
/// stored fields and never touches `created_at`. Both `update` and `delete`
/// report [`StoreError::NotFound`] for unknown ids.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError>;

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError>;

    async fn insert(&self, collection: Collection, fields: Fields) -> Result<Document, StoreError>;

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Fields,
    ) -> Result<Document, StoreError>;

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError>;
}

/// Storage backend selected at process start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    Memory,
    Postgres,
    Firestore,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Backend::Memory => "memory",
            Backend::Postgres => "postgres",
            Backend::Firestore => "firestore",
        })
    }
}

/// Build the configured backend.
pub async fn connect(
    backend: Backend,
    database_url: Option<&str>,
    config: &SiteConfig,
) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let store: Arc<dyn DocumentStore> = match backend {
        Backend::Memory => Arc::new(memory::MemoryStore::new()),
        Backend::Postgres => {
            let url = database_url
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for the postgres backend"))?;
            let store = postgres::PostgresStore::connect(url)?;
            store.migrate().await?;
            Arc::new(store)
        }
        Backend::Firestore => Arc::new(firestore::FirestoreStore::from_config(config)?),
    };
    tracing::info!(%backend, "Storage backend ready");
    Ok(store)
}

/// Newest first.
pub(crate) fn sort_newest_first(docs: &mut [Document]) {
    docs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
}
