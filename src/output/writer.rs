//! Parquet encoding
//!
//! Encodes Arrow RecordBatches as Parquet, either into any `Write` sink or
//! into an in-memory buffer ready for upload.

use crate::error::{Error, Result};
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::io::Write;

/// Configuration for Parquet writer
#[derive(Debug, Clone, PartialEq)]
pub struct ParquetWriterConfig {
    compression: Compression,
    row_group_size: usize,
    dictionary_enabled: bool,
    statistics_enabled: bool,
}

impl Default for ParquetWriterConfig {
    fn default() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: 1024 * 1024, // 1M rows
            dictionary_enabled: true,
            statistics_enabled: true,
        }
    }
}

impl ParquetWriterConfig {
    /// Create a new config with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set row group size
    #[must_use]
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Enable or disable dictionary encoding
    #[must_use]
    pub fn with_dictionary(mut self, enabled: bool) -> Self {
        self.dictionary_enabled = enabled;
        self
    }

    /// Enable or disable statistics
    #[must_use]
    pub fn with_statistics(mut self, enabled: bool) -> Self {
        self.statistics_enabled = enabled;
        self
    }

    /// Use no compression
    #[must_use]
    pub fn uncompressed(mut self) -> Self {
        self.compression = Compression::UNCOMPRESSED;
        self
    }

    /// Use ZSTD compression
    #[must_use]
    pub fn zstd(mut self) -> Self {
        self.compression = Compression::ZSTD(parquet::basic::ZstdLevel::default());
        self
    }

    /// Use GZIP compression
    #[must_use]
    pub fn gzip(mut self) -> Self {
        self.compression = Compression::GZIP(parquet::basic::GzipLevel::default());
        self
    }

    /// Build writer properties
    fn build_properties(&self) -> WriterProperties {
        let mut builder = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size);

        if !self.dictionary_enabled {
            builder = builder.set_dictionary_enabled(false);
        }

        if !self.statistics_enabled {
            builder =
                builder.set_statistics_enabled(parquet::file::properties::EnabledStatistics::None);
        }

        builder.build()
    }
}

/// Parquet writer over any byte sink
pub struct ParquetWriter<W: Write + Send> {
    /// Arrow writer
    writer: ArrowWriter<W>,
    /// Number of rows written
    rows_written: usize,
}

impl<W: Write + Send> ParquetWriter<W> {
    /// Create a new Parquet writer
    pub fn new(sink: W, schema: SchemaRef, config: &ParquetWriterConfig) -> Result<Self> {
        let props = config.build_properties();
        let writer = ArrowWriter::try_new(sink, schema, Some(props))
            .map_err(|e| Error::output(format!("Failed to create Parquet writer: {e}")))?;

        Ok(Self {
            writer,
            rows_written: 0,
        })
    }

    /// Write a RecordBatch
    pub fn write(&mut self, batch: &RecordBatch) -> Result<()> {
        self.writer
            .write(batch)
            .map_err(|e| Error::output(format!("Failed to write batch: {e}")))?;

        self.rows_written += batch.num_rows();
        Ok(())
    }

    /// Get the number of rows written so far
    #[must_use]
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Finalize the file and hand back the sink
    pub fn finish(self) -> Result<(W, usize)> {
        let rows = self.rows_written;
        let sink = self
            .writer
            .into_inner()
            .map_err(|e| Error::output(format!("Failed to close Parquet writer: {e}")))?;
        Ok((sink, rows))
    }
}

/// Encode a single RecordBatch as a complete Parquet file in memory
pub fn encode_batch(batch: &RecordBatch, config: &ParquetWriterConfig) -> Result<Bytes> {
    let mut writer = ParquetWriter::new(Vec::new(), batch.schema(), config)?;
    writer.write(batch)?;
    let (buffer, _) = writer.finish()?;
    Ok(Bytes::from(buffer))
}
