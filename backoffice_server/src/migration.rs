//! Schema bootstrap for the relational backend.

use diesel_async::{AsyncPgConnection, SimpleAsyncConnection};

/// SQL migration for back-office tables.
///
/// Idempotent; safe to run on every start.
pub const MIGRATION_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS site_documents (
    collection  VARCHAR(64)  NOT NULL,
    id          VARCHAR(64)  NOT NULL,
    data        JSONB        NOT NULL DEFAULT '{}'::jsonb,
    created_at  TIMESTAMPTZ  NOT NULL DEFAULT NOW(),
    updated_at  TIMESTAMPTZ  NOT NULL DEFAULT NOW(),
    PRIMARY KEY (collection, id)
);

CREATE INDEX IF NOT EXISTS idx_site_documents_created
    ON site_documents (collection, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_site_documents_slug
    ON site_documents (collection, (data->>'slug'));
"#;

/// Run the back-office migration.
pub async fn run_migration(conn: &mut AsyncPgConnection) -> anyhow::Result<()> {
    conn.batch_execute(MIGRATION_SQL)
        .await
        .map_err(|e| anyhow::anyhow!("site migration failed: {e}"))?;
    Ok(())
}
