//! Diesel table definitions for the relational backend.
//!
//! Every collection lives in `site_documents`, keyed by (collection, id).
//! Entity fields are stored as a JSONB object so partial updates merge.

diesel::table! {
    site_documents (collection, id) {
        collection -> Varchar,
        id -> Varchar,
        data -> Jsonb,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}
