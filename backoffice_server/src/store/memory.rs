//! In-process backend for tests and local development.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{sort_newest_first, Collection, Document, DocumentStore, Fields, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, HashMap<String, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        let guard = self.collections.read().await;
        let mut docs: Vec<Document> = guard
            .get(&collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default();
        sort_newest_first(&mut docs);
        Ok(docs)
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let guard = self.collections.read().await;
        Ok(guard.get(&collection).and_then(|docs| docs.get(id)).cloned())
    }

    async fn insert(&self, collection: Collection, fields: Fields) -> Result<Document, StoreError> {
        let doc = Document {
            id: uuid::Uuid::new_v4().simple().to_string(),
            fields,
            created_at: Utc::now(),
        };
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .insert(doc.id.clone(), doc.clone());
        Ok(doc)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Fields,
    ) -> Result<Document, StoreError> {
        let mut guard = self.collections.write().await;
        let doc = guard
            .get_mut(&collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        for (key, value) in patch {
            doc.fields.insert(key, value);
        }
        Ok(doc.clone())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let mut guard = self.collections.write().await;
        guard
            .get_mut(&collection)
            .and_then(|docs| docs.remove(id))
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(collection, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn insert_assigns_id_and_timestamp() {
        let store = MemoryStore::new();
        let doc = store
            .insert(Collection::Courses, fields(json!({"title": "Fire Safety 101"})))
            .await
            .unwrap();

        assert!(!doc.id.is_empty());
        assert!(!doc.fields.contains_key("id"));
        assert!(!doc.fields.contains_key("created_at"));
        let fetched = store.get(Collection::Courses, &doc.id).await.unwrap();
        assert_eq!(fetched, Some(doc));
    }

    #[tokio::test]
    async fn update_merges_and_keeps_other_fields() {
        let store = MemoryStore::new();
        let doc = store
            .insert(Collection::Courses, fields(json!({"title": "A", "price": 10})))
            .await
            .unwrap();

        let updated = store
            .update(Collection::Courses, &doc.id, fields(json!({"price": 20})))
            .await
            .unwrap();

        assert_eq!(updated.fields, fields(json!({"title": "A", "price": 20})));
        assert_eq!(updated.created_at, doc.created_at);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update(Collection::Courses, "missing", Fields::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn delete_removes_and_rejects_unknown() {
        let store = MemoryStore::new();
        let doc = store
            .insert(Collection::GalleryImages, Fields::new())
            .await
            .unwrap();

        store.delete(Collection::GalleryImages, &doc.id).await.unwrap();
        assert!(store.get(Collection::GalleryImages, &doc.id).await.unwrap().is_none());
        assert!(store
            .delete(Collection::GalleryImages, &doc.id)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn collections_are_isolated() {
        let store = MemoryStore::new();
        store.insert(Collection::Courses, Fields::new()).await.unwrap();
        assert!(store.list(Collection::BlogPosts).await.unwrap().is_empty());
        assert_eq!(store.list(Collection::Courses).await.unwrap().len(), 1);
    }
}
