//! Mapping raw API records onto [`Topic`] and [`Work`].
//!
//! Every field except `id` is optional and falls back to `None` (or an empty
//! reference list) when it is missing or has an unexpected type. Only a missing
//! or non-string `id` is an error.

use serde_json::Value;

use super::SourceError;
use crate::models::{Topic, Work};

fn required_id(record: &Value, kind: &str) -> Result<String, SourceError> {
    match record.get("id").and_then(Value::as_str) {
        Some(id) if !id.trim().is_empty() => Ok(id.to_string()),
        _ => Err(SourceError::Validation(format!("{} record has no id", kind))),
    }
}

fn opt_string(record: &Value, key: &str) -> Option<String> {
    record.get(key).and_then(Value::as_str).map(str::to_string)
}

fn opt_i32(record: &Value, key: &str) -> Option<i32> {
    record
        .get(key)
        .and_then(Value::as_i64)
        .and_then(|n| i32::try_from(n).ok())
}

/// Normalize a topic record
pub fn normalize_topic(record: &Value) -> Result<Topic, SourceError> {
    Ok(Topic {
        id: required_id(record, "topic")?,
        display_name: opt_string(record, "display_name"),
        level: opt_i32(record, "level"),
        description: opt_string(record, "description"),
    })
}

/// Normalize a work record
///
/// `referenced_works` becomes `references`; non-string entries are dropped.
pub fn normalize_work(record: &Value) -> Result<Work, SourceError> {
    let references = record
        .get("referenced_works")
        .and_then(Value::as_array)
        .map(|refs| {
            refs.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(Work {
        id: required_id(record, "work")?,
        title: opt_string(record, "title").or_else(|| opt_string(record, "display_name")),
        publication_year: opt_i32(record, "publication_year"),
        doi: opt_string(record, "doi"),
        cited_by_count: record.get("cited_by_count").and_then(Value::as_u64),
        references,
    })
}
