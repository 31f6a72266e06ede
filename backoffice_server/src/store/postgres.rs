//! Relational backend — Postgres through diesel-async with a deadpool pool.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{Jsonb, Text};
use diesel_async::pooled_connection::deadpool::{Object, Pool};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde_json::Value;

use super::{Collection, Document, DocumentStore, Fields, StoreError};
use crate::schema::site_documents;

const MAX_CONNECTIONS: usize = 10;

#[derive(Debug, Clone, Queryable, QueryableByName, Selectable, Insertable)]
#[diesel(table_name = site_documents)]
struct DocumentRow {
    collection: String,
    id: String,
    data: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DocumentRow {
    fn into_document(self) -> Result<Document, StoreError> {
        match self.data {
            Value::Object(fields) => Ok(Document {
                id: self.id,
                fields,
                created_at: self.created_at,
            }),
            other => Err(StoreError::Decode(format!(
                "{}/{}: expected JSON object, found {other}",
                self.collection, self.id
            ))),
        }
    }
}

pub struct PostgresStore {
    pool: Pool<AsyncPgConnection>,
}

impl PostgresStore {
    pub fn connect(database_url: &str) -> anyhow::Result<Self> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
        let pool = Pool::builder(manager)
            .max_size(MAX_CONNECTIONS)
            .build()
            .map_err(|e| anyhow::anyhow!("diesel pool: {e}"))?;
        Ok(Self { pool })
    }

    /// Create the document table if it does not exist yet.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| anyhow::anyhow!("diesel pool: {e}"))?;
        tracing::info!("Running site migration...");
        crate::migration::run_migration(&mut conn).await?;
        tracing::info!("Site migration completed.");
        Ok(())
    }

    async fn conn(&self) -> Result<Object<AsyncPgConnection>, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Pool(e.to_string()))
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        let mut conn = self.conn().await?;
        let rows: Vec<DocumentRow> = site_documents::table
            .filter(site_documents::collection.eq(collection.as_str()))
            .order((site_documents::created_at.desc(), site_documents::id.asc()))
            .select(DocumentRow::as_select())
            .load(&mut conn)
            .await?;
        rows.into_iter().map(DocumentRow::into_document).collect()
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let mut conn = self.conn().await?;
        let row: Option<DocumentRow> = site_documents::table
            .find((collection.as_str(), id))
            .select(DocumentRow::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        row.map(DocumentRow::into_document).transpose()
    }

    async fn insert(&self, collection: Collection, fields: Fields) -> Result<Document, StoreError> {
        let mut conn = self.conn().await?;
        let now = Utc::now();
        let row = DocumentRow {
            collection: collection.as_str().to_string(),
            id: uuid::Uuid::new_v4().simple().to_string(),
            data: Value::Object(fields),
            created_at: now,
            updated_at: now,
        };
        let inserted: DocumentRow = diesel::insert_into(site_documents::table)
            .values(&row)
            .returning(DocumentRow::as_returning())
            .get_result(&mut conn)
            .await?;
        tracing::debug!(%collection, id = %inserted.id, "Document inserted");
        inserted.into_document()
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Fields,
    ) -> Result<Document, StoreError> {
        let mut conn = self.conn().await?;
        // `||` merges top-level keys, leaving fields absent from the patch untouched.
        let row: Option<DocumentRow> = diesel::sql_query(
            "UPDATE site_documents \
             SET data = data || $1, updated_at = NOW() \
             WHERE collection = $2 AND id = $3 \
             RETURNING collection, id, data, created_at, updated_at",
        )
        .bind::<Jsonb, _>(Value::Object(patch))
        .bind::<Text, _>(collection.as_str())
        .bind::<Text, _>(id)
        .get_result(&mut conn)
        .await
        .optional()?;

        row.ok_or_else(|| StoreError::not_found(collection, id))?
            .into_document()
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        let deleted = diesel::delete(site_documents::table.find((collection.as_str(), id)))
            .execute(&mut conn)
            .await?;
        if deleted == 0 {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(())
    }
}
