//! Lead intake and follow-up: public submissions, staff status changes,
//! and the registrations CSV export.

use serde_json::Value;

use super::{record_outcome, MutationError, SiteContext};
use crate::models::registration::CourseRegistration;
use crate::models::{Entity, LeadKind};
use crate::store::{Document, DocumentStore, Fields, StoreError};

/// Store a new lead with the kind's initial status. Leads have no public
/// page, so nothing is revalidated.
pub async fn create<L: LeadKind>(ctx: &SiteContext, form: &L::Form) -> Result<String, MutationError> {
    let result = create_lead::<L>(ctx, form).await;
    record_outcome(L::COLLECTION, &result);
    result
}

async fn create_lead<L: LeadKind>(ctx: &SiteContext, form: &L::Form) -> Result<String, MutationError> {
    let mut fields = L::validate(form).map_err(MutationError::Invalid)?;
    fields.insert("status".to_string(), status_value::<L>(&L::Status::default())?);

    let doc = ctx.store.insert(L::COLLECTION, fields).await.map_err(|e| {
        tracing::error!(collection = %L::COLLECTION, error = %e, "Lead insert failed");
        MutationError::failed("submit", L::NOUN, e)
    })?;
    tracing::info!(collection = %L::COLLECTION, id = %doc.id, "Lead received");
    Ok(doc.id)
}

/// Status-only partial update.
pub async fn update_status<L: LeadKind>(
    ctx: &SiteContext,
    id: &str,
    status: &L::Status,
) -> Result<(), MutationError> {
    let result = async {
        let mut patch = Fields::new();
        patch.insert("status".to_string(), status_value::<L>(status)?);
        ctx.store
            .update(L::COLLECTION, id, patch)
            .await
            .map(|_| tracing::info!(collection = %L::COLLECTION, id, "Lead status updated"))
            .map_err(|e| {
                tracing::error!(collection = %L::COLLECTION, id, error = %e, "Lead status update failed");
                MutationError::failed("update", L::STATUS_NOUN, e)
            })
    }
    .await;
    record_outcome(L::COLLECTION, &result);
    result
}

fn status_value<L: LeadKind>(status: &L::Status) -> Result<Value, MutationError> {
    serde_json::to_value(status).map_err(|e| {
        MutationError::failed("update", L::STATUS_NOUN, StoreError::Decode(e.to_string()))
    })
}

/// Every registration as CSV, newest first. The header row holds the field
/// names; each cell is a JSON string literal; lines end in CRLF.
pub async fn export_registrations_csv(store: &dyn DocumentStore) -> Result<String, StoreError> {
    let docs = store.list(CourseRegistration::COLLECTION).await?;

    let mut lines = Vec::with_capacity(docs.len() + 1);
    lines.push(CourseRegistration::CSV_COLUMNS.join(","));
    for doc in &docs {
        let row = CourseRegistration::CSV_COLUMNS
            .iter()
            .map(|column| csv_cell(&registration_value(doc, column)))
            .collect::<Vec<_>>();
        lines.push(row.join(","));
    }
    tracing::info!(rows = docs.len(), "Exported registrations");
    Ok(lines.join("\r\n"))
}

fn registration_value(doc: &Document, column: &str) -> Value {
    match column {
        "id" => Value::String(doc.id.clone()),
        "submission_date" => Value::String(doc.created_at.to_rfc3339()),
        _ => doc.fields.get(column).cloned().unwrap_or(Value::Null),
    }
}

fn csv_cell(value: &Value) -> String {
    match value {
        Value::Null => "\"\"".to_string(),
        Value::String(s) => Value::String(s.clone()).to_string(),
        other => Value::String(other.to_string()).to_string(),
    }
}
