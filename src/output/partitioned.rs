//! Hive-partitioned Parquet tables

use super::writer::{encode_batch, ParquetWriterConfig};
use crate::error::Result;
use crate::storage::StorageLocation;
use crate::table::{row_key, Table};
use arrow::array::UInt32Array;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::path::Path as ObjectPath;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Directory value used for a null or empty partition cell
pub const NULL_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// Name of the data file in each partition directory
pub const PART_FILE: &str = "part-00000.parquet";

/// Empty object written last to mark a complete table
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// Outcome of writing one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    pub table: String,
    /// Display form of the table directory
    pub location: String,
    pub rows: usize,
    pub partitions: usize,
    pub files: usize,
}

/// Destination for finished tables
#[async_trait]
pub trait TableSink: Send + Sync {
    /// Replace whatever the sink holds for `table.name()` with `table`
    async fn write_table(&self, table: &Table, partition_by: &[&str]) -> Result<WriteSummary>;
}

/// Writes tables as partitioned Parquet under a root location
///
/// Each table lands in `<root>/<table name>/`, one directory level per
/// partition column (`col=value`), with the partition columns kept in the
/// file schema.
#[derive(Debug, Clone)]
pub struct ParquetSink {
    root: StorageLocation,
    config: ParquetWriterConfig,
}

impl ParquetSink {
    pub fn new(root: StorageLocation, config: ParquetWriterConfig) -> Self {
        Self { root, config }
    }

    pub fn root(&self) -> &StorageLocation {
        &self.root
    }

    pub fn config(&self) -> &ParquetWriterConfig {
        &self.config
    }
}

/// One encoded partition file, keyed relative to the table directory
struct EncodedPart {
    path: ObjectPath,
    rows: usize,
    data: Bytes,
}

/// Group rows by the rendered values of `partition_by`
///
/// Groups come out sorted by key; rows keep their order inside a group. With
/// no partition columns the whole table is one group.
fn partition_rows(
    table: &Table,
    partition_by: &[&str],
) -> Result<BTreeMap<Vec<Option<String>>, Vec<u32>>> {
    let columns = partition_by
        .iter()
        .map(|c| table.column(c))
        .collect::<Result<Vec<_>>>()?;

    let mut groups: BTreeMap<Vec<Option<String>>, Vec<u32>> = BTreeMap::new();
    if columns.is_empty() {
        groups.insert(Vec::new(), (0..table.num_rows() as u32).collect());
        return Ok(groups);
    }

    for row in 0..table.num_rows() {
        // Empty strings share the null partition
        let key: Vec<Option<String>> = row_key(&columns, row)?
            .into_iter()
            .map(|value| value.filter(|v| !v.is_empty()))
            .collect();
        groups.entry(key).or_default().push(row as u32);
    }
    Ok(groups)
}

/// `col=value/...` directory of one partition key
///
/// Null and empty values both land in [`NULL_PARTITION`].
pub fn partition_path(partition_by: &[&str], values: &[Option<String>]) -> ObjectPath {
    partition_by
        .iter()
        .zip(values)
        .fold(ObjectPath::default(), |path, (column, value)| {
            let value = value
                .as_deref()
                .filter(|v| !v.is_empty())
                .unwrap_or(NULL_PARTITION);
            path.child(format!("{column}={value}"))
        })
}

fn encode_parts(
    table: &Table,
    partition_by: &[&str],
    config: &ParquetWriterConfig,
) -> Result<Vec<EncodedPart>> {
    let groups = partition_rows(table, partition_by)?;

    groups
        .into_iter()
        .map(|(values, rows)| {
            let part = if rows.len() == table.num_rows() {
                table.clone()
            } else {
                table.take(&UInt32Array::from(rows))?
            };
            Ok(EncodedPart {
                path: partition_path(partition_by, &values).child(PART_FILE),
                rows: part.num_rows(),
                data: encode_batch(part.batch(), config)?,
            })
        })
        .collect()
}

#[async_trait]
impl TableSink for ParquetSink {
    async fn write_table(&self, table: &Table, partition_by: &[&str]) -> Result<WriteSummary> {
        let target = self.root.child(table.name());

        // Nothing touches storage until every partition has encoded
        let parts = encode_parts(table, partition_by, &self.config)?;

        let removed = target.delete_all().await?;
        if removed > 0 {
            debug!(table = table.name(), removed, "Cleared previous output");
        }

        let mut rows = 0;
        for part in &parts {
            let key = target.put(&part.path, part.data.clone()).await?;
            debug!(
                table = table.name(),
                path = %target.display(&key),
                rows = part.rows,
                bytes = part.data.len(),
                "Wrote partition"
            );
            rows += part.rows;
        }

        target
            .put(&ObjectPath::from(SUCCESS_MARKER), Bytes::new())
            .await?;

        let summary = WriteSummary {
            table: table.name().to_string(),
            location: target.to_string(),
            rows,
            partitions: if partition_by.is_empty() { 0 } else { parts.len() },
            files: parts.len(),
        };

        info!(
            table = %summary.table,
            location = %summary.location,
            rows = summary.rows,
            partitions = summary.partitions,
            "Wrote table"
        );
        Ok(summary)
    }
}
