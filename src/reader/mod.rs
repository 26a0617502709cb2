//! JSON dataset reader
//!
//! Loads every JSON-lines file matching a glob under a storage location into
//! one in-memory [`Table`].
//!
//! # Overview
//!
//! - Files are resolved with [`GlobPattern`] and read in key order, lines in
//!   file order, so "read order" is deterministic.
//! - Each non-empty line must be one JSON object. Other lines are handled by
//!   the [`MalformedRecords`] policy.
//! - Columns come from a declared schema ([`song_schema`], [`log_schema`]) or
//!   are inferred from the records.

mod convert;
mod schemas;

pub use convert::{infer_schema, json_to_arrow};
pub use schemas::{log_schema, song_schema};

use crate::error::{Error, Result, ResultExt};
use crate::storage::{GlobPattern, StorageLocation};
use crate::table::Table;
use crate::types::MalformedRecords;
use arrow::datatypes::SchemaRef;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Counters for one dataset read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReadStats {
    /// Files matched by the glob
    pub files: usize,
    /// Records decoded
    pub records: usize,
    /// Lines skipped as malformed
    pub skipped: usize,
}

/// A dataset loaded into memory
#[derive(Debug, Clone)]
pub struct JsonDataset {
    pub table: Table,
    pub stats: ReadStats,
}

/// Reader for JSON-lines datasets under one location
#[derive(Debug, Clone)]
pub struct JsonDatasetReader {
    location: StorageLocation,
    malformed: MalformedRecords,
}

impl JsonDatasetReader {
    /// Create a reader rooted at `location`
    pub fn new(location: StorageLocation) -> Self {
        Self {
            location,
            malformed: MalformedRecords::default(),
        }
    }

    /// Set the policy for lines that are not JSON objects
    #[must_use]
    pub fn with_malformed_records(mut self, policy: MalformedRecords) -> Self {
        self.malformed = policy;
        self
    }

    pub fn location(&self) -> &StorageLocation {
        &self.location
    }

    /// Read all files matching `pattern` into a table called `name`
    ///
    /// With `schema` set, exactly those columns are produced; otherwise the
    /// schema is inferred over all records. No matching files yields an empty
    /// table.
    pub async fn read(
        &self,
        name: &str,
        pattern: &str,
        schema: Option<SchemaRef>,
    ) -> Result<JsonDataset> {
        let glob = GlobPattern::new(pattern)?;
        let files = self.location.glob(&glob).await?;

        if files.is_empty() {
            warn!(
                dataset = name,
                pattern,
                location = %self.location,
                "No files matched"
            );
        }

        let mut records = Vec::new();
        let mut stats = ReadStats {
            files: files.len(),
            ..ReadStats::default()
        };

        for meta in &files {
            let file = self.location.display(&meta.location);
            let body = self
                .location
                .get(&meta.location)
                .await
                .with_context(|| format!("Failed to read {file}"))?;
            let before = records.len();
            stats.skipped += decode_lines(&file, &body, self.malformed, &mut records)?;
            debug!(file = %file, records = records.len() - before, "Decoded file");
        }
        stats.records = records.len();

        let schema = schema.unwrap_or_else(|| Arc::new(infer_schema(&records)));
        let batch = json_to_arrow(&records, schema)?;

        info!(
            dataset = name,
            files = stats.files,
            records = stats.records,
            skipped = stats.skipped,
            "Read dataset"
        );

        Ok(JsonDataset {
            table: Table::new(name, batch),
            stats,
        })
    }
}

/// Decode one JSON-lines body, appending objects to `records`
///
/// Returns the number of skipped lines.
pub(crate) fn decode_lines(
    path: &str,
    body: &[u8],
    policy: MalformedRecords,
    records: &mut Vec<Value>,
) -> Result<usize> {
    let text = match std::str::from_utf8(body) {
        Ok(text) => std::borrow::Cow::Borrowed(text),
        Err(e) if policy == MalformedRecords::Fail => {
            return Err(Error::decode(path, format!("invalid UTF-8: {e}")));
        }
        Err(_) => String::from_utf8_lossy(body),
    };

    let mut skipped = 0;
    for (line_num, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let problem = match serde_json::from_str::<Value>(line) {
            Ok(value @ Value::Object(_)) => {
                records.push(value);
                continue;
            }
            Ok(_) => "not a JSON object".to_string(),
            Err(e) => e.to_string(),
        };

        match policy {
            MalformedRecords::Fail => {
                return Err(Error::decode(
                    path,
                    format!("line {}: {problem}", line_num + 1),
                ));
            }
            MalformedRecords::Skip => {
                warn!(file = path, line = line_num + 1, error = %problem, "Skipping malformed record");
                skipped += 1;
            }
        }
    }

    Ok(skipped)
}

#[cfg(test)]
mod tests;
