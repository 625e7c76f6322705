//! Tolerant readers for node and edge files.
//!
//! Node files may hold one JSON value per line, values concatenated with no
//! separator, blank lines, or any mix of these. Anything that does not decode
//! is skipped up to the next line break and reading carries on. A missing
//! file reads as empty.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::StoreError;
use crate::models::ReferenceEdge;

/// Read the file's text, or `None` if it does not exist
fn read_text(path: &Path) -> Result<Option<String>, StoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Decode a sequence of top-level JSON values from `text`.
///
/// Scans left to right: skip whitespace, decode one value and continue right
/// after it (a value may start mid-line). On a decode failure the rest of the
/// current line is dropped, keeping a leading number or literal if one decodes.
pub fn parse_concatenated(text: &str) -> Vec<Value> {
    let mut values = Vec::new();
    let mut idx = 0;
    let mut skipped_lines = 0usize;

    loop {
        let rest = &text[idx..];
        let trimmed = rest.trim_start();
        idx += rest.len() - trimmed.len();
        if trimmed.is_empty() {
            break;
        }

        let mut stream = serde_json::Deserializer::from_str(trimmed).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) => {
                values.push(value);
                idx += stream.byte_offset();
            }
            _ => {
                // A number or literal glued to trailing junk fails the stream
                // check but still decodes on its own.
                let line_end = trimmed.find('\n');
                let line = &trimmed[..line_end.unwrap_or(trimmed.len())];
                match Value::deserialize(&mut serde_json::Deserializer::from_str(line)) {
                    Ok(value) => values.push(value),
                    Err(_) => skipped_lines += 1,
                }
                match line_end {
                    Some(nl) => idx += nl + 1,
                    None => break,
                }
            }
        }
    }

    if skipped_lines > 0 {
        warn!("Skipped {} undecodable line(s)", skipped_lines);
    }
    values
}

/// Read every JSON value in a node file
pub fn read_records(path: &Path) -> Result<Vec<Value>, StoreError> {
    let Some(text) = read_text(path)? else {
        debug!(path = %path.display(), "No such file, nothing to read");
        return Ok(Vec::new());
    };
    let values = parse_concatenated(&text);
    debug!(path = %path.display(), "Parsed {} JSON values", values.len());
    Ok(values)
}

/// Read the value under a top-level `key` of a single JSON document.
///
/// A list value is returned as is and any other value is wrapped in a
/// one-element list. A string value is first tried as embedded JSON text.
/// When the file is not one JSON object holding `key`, this falls back to
/// [`read_records`] behavior.
pub fn read_records_by_key(path: &Path, key: &str) -> Result<Vec<Value>, StoreError> {
    let Some(text) = read_text(path)? else {
        return Ok(Vec::new());
    };

    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(mut whole)) if whole.contains_key(key) => {
            let value = whole.remove(key).unwrap_or(Value::Null);
            debug!(key, "Found key in {}", path.display());
            Ok(unwrap_keyed(value))
        }
        Ok(_) => Ok(parse_concatenated(&text)),
        Err(e) => {
            debug!("Whole-document parse of {} failed ({}), streaming instead", path.display(), e);
            Ok(parse_concatenated(&text))
        }
    }
}

fn unwrap_keyed(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => items,
            Ok(parsed) => vec![parsed],
            Err(_) => vec![Value::String(raw)],
        },
        other => vec![other],
    }
}

/// Read every edge row of an edge file; malformed rows are skipped
pub fn read_edges(path: &Path) -> Result<Vec<ReferenceEdge>, StoreError> {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut edges = Vec::new();
    for (row, result) in reader.deserialize::<ReferenceEdge>().enumerate() {
        match result {
            Ok(edge) => edges.push(edge),
            Err(e) => warn!("Skipping edge row {} in {}: {}", row + 1, path.display(), e),
        }
    }
    Ok(edges)
}
