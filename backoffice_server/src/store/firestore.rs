//! Document backend — Firestore REST API.
//!
//! Fields are stored as Firestore typed values (`stringValue`,
//! `booleanValue`, ...). Partial updates use an update mask with an
//! existence precondition so unknown ids surface as 404.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{sort_newest_first, Collection, Document, DocumentStore, Fields, StoreError};
use crate::config::SiteConfig;

const FIRESTORE_API: &str = "https://firestore.googleapis.com/v1";
const PAGE_SIZE: &str = "300";
const BACKEND: &str = "firestore";

pub struct FirestoreStore {
    client: reqwest::Client,
    documents_url: String,
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteDocument {
    name: String,
    #[serde(default)]
    fields: serde_json::Map<String, Value>,
    create_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RemoteDocument>,
    next_page_token: Option<String>,
}

impl FirestoreStore {
    pub fn from_config(config: &SiteConfig) -> anyhow::Result<Self> {
        let project_id = config
            .firestore_project_id
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("FIRESTORE_PROJECT_ID is required for the firestore backend"))?;
        let access_token = config
            .firestore_access_token
            .clone()
            .ok_or_else(|| anyhow::anyhow!("FIRESTORE_ACCESS_TOKEN is required for the firestore backend"))?;
        Ok(Self {
            client: config.http_client()?,
            documents_url: format!("{FIRESTORE_API}/projects/{project_id}/databases/(default)/documents"),
            access_token,
        })
    }

    fn collection_url(&self, collection: Collection) -> String {
        format!("{}/{}", self.documents_url, collection.as_str())
    }

    /// `None` for ids that are not a single path segment; those would
    /// address a subcollection instead of a document.
    fn document_url(&self, collection: Collection, id: &str) -> Option<String> {
        if id.is_empty() || id.contains('/') || id == "." || id == ".." {
            return None;
        }
        Some(format!("{}/{}/{}", self.documents_url, collection.as_str(), id))
    }

    async fn rejected(resp: reqwest::Response) -> StoreError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        StoreError::Rejected {
            backend: BACKEND,
            status,
            body,
        }
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        let mut docs = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", PAGE_SIZE.to_string())];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }
            let resp = self
                .client
                .get(self.collection_url(collection))
                .bearer_auth(&self.access_token)
                .query(&query)
                .send()
                .await?;
            if !resp.status().is_success() {
                return Err(Self::rejected(resp).await);
            }
            let page: ListResponse = resp.json().await?;
            for remote in page.documents {
                docs.push(from_remote(remote)?);
            }
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        sort_newest_first(&mut docs);
        Ok(docs)
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let Some(url) = self.document_url(collection, id) else {
            return Ok(None);
        };
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => Ok(Some(from_remote(resp.json().await?)?)),
            _ => Err(Self::rejected(resp).await),
        }
    }

    async fn insert(&self, collection: Collection, fields: Fields) -> Result<Document, StoreError> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let resp = self
            .client
            .post(self.collection_url(collection))
            .bearer_auth(&self.access_token)
            .query(&[("documentId", id.as_str())])
            .json(&json!({ "fields": encode_fields(&fields) }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::rejected(resp).await);
        }
        let doc = from_remote(resp.json().await?)?;
        tracing::debug!(%collection, id = %doc.id, "Document inserted");
        Ok(doc)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Fields,
    ) -> Result<Document, StoreError> {
        let mut query: Vec<(&str, &str)> = patch
            .keys()
            .map(|key| ("updateMask.fieldPaths", key.as_str()))
            .collect();
        query.push(("currentDocument.exists", "true"));

        let url = self
            .document_url(collection, id)
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        let resp = self
            .client
            .patch(url)
            .bearer_auth(&self.access_token)
            .query(&query)
            .json(&json!({ "fields": encode_fields(&patch) }))
            .send()
            .await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Err(StoreError::not_found(collection, id)),
            s if s.is_success() => from_remote(resp.json().await?),
            _ => Err(Self::rejected(resp).await),
        }
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let url = self
            .document_url(collection, id)
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        let resp = self
            .client
            .delete(url)
            .bearer_auth(&self.access_token)
            .query(&[("currentDocument.exists", "true")])
            .send()
            .await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Err(StoreError::not_found(collection, id)),
            s if s.is_success() => Ok(()),
            _ => Err(Self::rejected(resp).await),
        }
    }
}

fn from_remote(remote: RemoteDocument) -> Result<Document, StoreError> {
    let id = remote
        .name
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| StoreError::Decode(remote.name.clone()))?
        .to_string();
    let fields = remote
        .fields
        .into_iter()
        .map(|(key, value)| (key, decode_value(value)))
        .collect();
    Ok(Document {
        id,
        fields,
        created_at: remote.create_time,
    })
}

/// Encode a plain JSON object as Firestore `fields`.
pub fn encode_fields(fields: &Fields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(key, value)| (key.clone(), encode_value(value)))
            .collect(),
    )
}

/// Plain JSON → Firestore typed value.
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            // integerValue is transported as a decimal string
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Firestore typed value → plain JSON. Unknown shapes decode to `null`.
pub fn decode_value(value: Value) -> Value {
    let Value::Object(mut typed) = value else {
        return Value::Null;
    };
    if let Some(s) = typed.remove("stringValue") {
        return s;
    }
    if let Some(b) = typed.remove("booleanValue") {
        return b;
    }
    if let Some(i) = typed.remove("integerValue") {
        let parsed = i.as_str().and_then(|s| s.parse::<i64>().ok());
        return parsed.map(Value::from).unwrap_or(i);
    }
    if let Some(d) = typed.remove("doubleValue") {
        return d;
    }
    if let Some(ts) = typed.remove("timestampValue") {
        return ts;
    }
    if let Some(r) = typed.remove("referenceValue") {
        return r;
    }
    if let Some(b) = typed.remove("bytesValue") {
        return b;
    }
    if let Some(g) = typed.remove("geoPointValue") {
        return g;
    }
    if let Some(Value::Object(mut array)) = typed.remove("arrayValue") {
        return match array.remove("values") {
            Some(Value::Array(values)) => Value::Array(values.into_iter().map(decode_value).collect()),
            _ => Value::Array(Vec::new()),
        };
    }
    if let Some(Value::Object(mut map)) = typed.remove("mapValue") {
        return match map.remove("fields") {
            Some(Value::Object(fields)) => Value::Object(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, decode_value(value)))
                    .collect(),
            ),
            _ => Value::Object(Fields::new()),
        };
    }
    Value::Null
}
