//! Reading written tables back

use super::partitioned::SUCCESS_MARKER;
use crate::error::{Error, Result};
use crate::storage::StorageLocation;
use crate::table::Table;
use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Shape of a table directory
#[derive(Debug, Clone, Serialize)]
pub struct TableInfo {
    pub location: String,
    pub rows: usize,
    pub files: usize,
    pub partitions: usize,
    /// Whether the `_SUCCESS` marker is present
    pub committed: bool,
    /// `name: type` per column
    pub columns: Vec<String>,
}

/// Markers and hidden files are not data
fn is_data_file(relative: &str) -> bool {
    let name = relative.rsplit('/').next().unwrap_or(relative);
    !name.starts_with('_') && !name.starts_with('.')
}

struct Scan {
    table: Table,
    files: usize,
    partitions: usize,
    committed: bool,
}

async fn scan(location: &StorageLocation, name: &str) -> Result<Scan> {
    let objects = location.list().await?;

    let mut batches: Vec<RecordBatch> = Vec::new();
    let mut directories = BTreeSet::new();
    let mut files = 0;
    let mut committed = false;

    for meta in &objects {
        let relative = location.relative(&meta.location);
        if relative == SUCCESS_MARKER {
            committed = true;
        }
        if !is_data_file(relative) {
            continue;
        }

        let data = location.get(&meta.location).await?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(data)?.build()?;
        for batch in reader {
            batches.push(batch?);
        }

        files += 1;
        if let Some((dir, _)) = relative.rsplit_once('/') {
            directories.insert(dir.to_string());
        }
    }

    let table = match batches.first() {
        Some(first) => Table::from_batches(name, first.schema(), &batches)
            .map_err(|e| Error::output(format!("Inconsistent schemas under {location}: {e}")))?,
        None => Table::empty(name, Arc::new(Schema::empty())),
    };

    Ok(Scan {
        table,
        files,
        partitions: directories.len(),
        committed,
    })
}

/// Read every data file under `location` into one table
///
/// Files are read in key order. `_`- and `.`-prefixed objects are skipped.
pub async fn read_table(location: &StorageLocation, name: &str) -> Result<Table> {
    Ok(scan(location, name).await?.table)
}

/// Row count, schema and layout of a table directory
pub async fn inspect_table(location: &StorageLocation) -> Result<TableInfo> {
    let scan = scan(location, "inspect").await?;
    let columns = scan
        .table
        .schema()
        .fields()
        .iter()
        .map(|f| format!("{}: {}", f.name(), f.data_type()))
        .collect();

    Ok(TableInfo {
        location: location.to_string(),
        rows: scan.table.num_rows(),
        files: scan.files,
        partitions: scan.partitions,
        committed: scan.committed,
        columns,
    })
}
