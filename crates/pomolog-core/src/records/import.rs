//! Lenient parsing of import sources.
//!
//! A source is either a bare JSON array of records or an export payload
//! whose `records` field is such an array. Extra fields are ignored.
//! Entries without a non-empty string `id`, or with mistyped fields, are
//! dropped one by one without failing the source.

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use super::export::EXPORT_SCHEMA;
use super::record::Record;

/// One input to [`RecordStore::import_merge`](super::RecordStore::import_merge).
#[derive(Debug, Clone)]
pub enum ImportSource {
    /// Raw JSON text.
    Text(String),
    /// An already-parsed JSON document.
    Json(Value),
    /// A source that could not be read; always counted as unparsed.
    Unreadable { label: String, reason: String },
}

impl From<String> for ImportSource {
    fn from(text: String) -> Self {
        ImportSource::Text(text)
    }
}

impl From<&str> for ImportSource {
    fn from(text: &str) -> Self {
        ImportSource::Text(text.to_string())
    }
}

impl From<Value> for ImportSource {
    fn from(value: Value) -> Self {
        ImportSource::Json(value)
    }
}

#[derive(Debug, Error)]
pub(crate) enum SourceError {
    #[error("could not read {label}: {reason}")]
    Unreadable { label: String, reason: String },

    #[error("not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a record array or an object with a `records` array")]
    Shape,
}

pub(crate) fn parse_source(source: ImportSource) -> Result<Vec<Record>, SourceError> {
    let value = match source {
        ImportSource::Text(text) => serde_json::from_str::<Value>(&text)?,
        ImportSource::Json(value) => value,
        ImportSource::Unreadable { label, reason } => {
            return Err(SourceError::Unreadable { label, reason })
        }
    };

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => {
            if let Some(schema) = obj.get("schema").and_then(Value::as_str) {
                if schema != EXPORT_SCHEMA {
                    tracing::warn!(schema, "importing payload with unfamiliar schema tag");
                }
            }
            // Valid JSON that carries no record array counts as unparsed,
            // so the summary flags files that were not exports at all.
            match obj.remove("records") {
                Some(Value::Array(items)) => items,
                _ => return Err(SourceError::Shape),
            }
        }
        _ => return Err(SourceError::Shape),
    };

    let total = items.len();
    let records: Vec<Record> = items.into_iter().filter_map(parse_record).collect();
    if records.len() < total {
        tracing::warn!(dropped = total - records.len(), "discarded records without a usable id");
    }
    Ok(records)
}

fn parse_record(item: Value) -> Option<Record> {
    let has_id = item
        .get("id")
        .and_then(Value::as_str)
        .is_some_and(|id| !id.is_empty());
    if !has_id {
        return None;
    }
    serde_json::from_value(item).ok()
}

/// Read every file into an import source. Read failures become
/// [`ImportSource::Unreadable`] so the batch still runs.
pub async fn read_sources(paths: &[PathBuf]) -> Vec<ImportSource> {
    let mut sources = Vec::with_capacity(paths.len());
    for path in paths {
        sources.push(read_source(path).await);
    }
    sources
}

async fn read_source(path: &Path) -> ImportSource {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => ImportSource::Text(text),
        Err(e) => ImportSource::Unreadable {
            label: path.display().to_string(),
            reason: e.to_string(),
        },
    }
}
