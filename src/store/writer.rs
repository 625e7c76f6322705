//! Append-only sinks for node (JSON lines) and edge (CSV) records.
//!
//! Each call opens the target in append mode (creating it and its parent
//! directory if needed), writes, flushes and closes it. Nothing is truncated
//! or deduplicated: writing the same batch twice stores it twice.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use super::StoreError;
use crate::models::ReferenceEdge;

fn open_append(path: &Path) -> Result<File, StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// Append one JSON object per line, in slice order
pub fn append_json_lines<T: Serialize>(path: &Path, records: &[T]) -> Result<usize, StoreError> {
    let mut writer = BufWriter::new(open_append(path)?);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(records.len())
}

/// Append one `from_work,referenced_work` row per edge, without a header
pub fn append_edges(path: &Path, edges: &[ReferenceEdge]) -> Result<usize, StoreError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(open_append(path)?);
    for edge in edges {
        writer.serialize(edge)?;
    }
    writer.flush()?;
    Ok(edges.len())
}
