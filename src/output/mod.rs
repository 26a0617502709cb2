//! Output module
//!
//! Writes star schema tables as Hive-partitioned Parquet and reads them back.
//!
//! # Overview
//!
//! - [`ParquetWriterConfig`] / [`ParquetWriter`]: Parquet encoding settings and writer
//! - [`TableSink`]: destination trait for finished tables, with [`ParquetSink`]
//!   writing `col=value/part-00000.parquet` trees in overwrite mode
//! - [`read_table`] / [`inspect_table`]: read a written table directory back

mod partitioned;
mod reader;
mod writer;

pub use partitioned::{
    partition_path, ParquetSink, TableSink, WriteSummary, NULL_PARTITION, PART_FILE,
    SUCCESS_MARKER,
};
pub use reader::{inspect_table, read_table, TableInfo};
pub use writer::{encode_batch, ParquetWriter, ParquetWriterConfig};
