//! Pipeline orchestration
//!
//! One run reads the song dataset, writes the `songs` and `artists`
//! dimensions, then reads the event log and writes `users`, `time` and the
//! `songplays` fact.
//!
//! # Overview
//!
//! - [`Pipeline`] - Owns the resolved locations and the table sink
//! - [`RunSummary`] - What a run read and wrote, per stage and table
//!
//! Stages run sequentially. The raw song table read by the first stage is
//! handed to the second for the songplays join, so the song dataset is read
//! exactly once.

mod types;

pub use types::{LogStage, RunSummary, SongStage};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::extract::{artists_table, filter_eq, songs_table, time_table, users_table, NEXT_SONG};
use crate::facts::{matcher_for, songplays_table};
use crate::output::{ParquetSink, TableSink, WriteSummary};
use crate::reader::{log_schema, song_schema, JsonDatasetReader};
use crate::storage::StorageLocation;
use crate::table::Table;
use crate::time::derive_time_columns;
use crate::types::StarTable;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// A configured song-play ETL run
pub struct Pipeline {
    config: PipelineConfig,
    input: StorageLocation,
    sink: Arc<dyn TableSink>,
    /// Display form of the output root
    output: String,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("input", &self.input.to_string())
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Validate `config` and resolve its input and output locations
    ///
    /// A local output directory is created if missing; a local input
    /// directory must exist.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;

        let input = StorageLocation::parse(&config.input_data, &config.credentials, false)?;
        let output = StorageLocation::parse(&config.output_data, &config.credentials, true)?;

        Ok(Self {
            output: output.to_string(),
            sink: Arc::new(ParquetSink::new(output, config.parquet.writer_config())),
            input,
            config,
        })
    }

    /// Build a pipeline over already-resolved locations
    pub fn with_locations(
        config: PipelineConfig,
        input: StorageLocation,
        output: StorageLocation,
    ) -> Self {
        Self {
            output: output.to_string(),
            sink: Arc::new(ParquetSink::new(output, config.parquet.writer_config())),
            input,
            config,
        }
    }

    /// Send finished tables somewhere other than the configured output
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn TableSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn input(&self) -> &StorageLocation {
        &self.input
    }

    fn reader(&self) -> JsonDatasetReader {
        JsonDatasetReader::new(self.input.clone())
            .with_malformed_records(self.config.malformed_records)
    }

    async fn write(&self, table: &Table, target: StarTable) -> Result<WriteSummary> {
        self.sink.write_table(table, target.partition_by()).await
    }

    /// Run both stages, song data first
    pub async fn run(&self) -> Result<RunSummary> {
        let start = Instant::now();
        info!(input = %self.input, output = %self.output, "Starting run");

        let (song_data, songs) = self.process_song_data().await?;
        let log_data = self.process_log_data(&songs).await?;

        let summary = RunSummary {
            input: self.input.to_string(),
            output: self.output.clone(),
            song_data,
            log_data,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            rows = summary.rows_written(),
            duration_ms = summary.duration_ms,
            "Run complete"
        );
        Ok(summary)
    }

    /// Read song records and write the `songs` and `artists` dimensions
    ///
    /// Returns the raw song table for the songplays join.
    pub async fn process_song_data(&self) -> Result<(SongStage, Table)> {
        let dataset = self
            .reader()
            .read("song_data", &self.config.song_data, Some(song_schema()))
            .await?;
        let raw = dataset.table;
        let dedup = self.config.deduplicate;

        let songs = self
            .write(&songs_table(&raw, dedup)?, StarTable::Songs)
            .await?;
        let artists = self
            .write(&artists_table(&raw, dedup)?, StarTable::Artists)
            .await?;

        let stage = SongStage {
            read: dataset.stats,
            songs,
            artists,
        };
        Ok((stage, raw))
    }

    /// Read the event log and write `users`, `time` and `songplays`
    ///
    /// `songs` is the raw song table returned by [`Self::process_song_data`].
    pub async fn process_log_data(&self, songs: &Table) -> Result<LogStage> {
        let dataset = self
            .reader()
            .read("log_data", &self.config.log_data, Some(log_schema()))
            .await?;

        let plays = filter_eq(&dataset.table, "page", NEXT_SONG)?;
        let events = derive_time_columns(&plays, "ts", self.config.timezone)?;
        info!(
            records = dataset.table.num_rows(),
            events = events.num_rows(),
            timezone = ?self.config.timezone,
            "Selected song-play events"
        );

        let dedup = self.config.deduplicate;
        let users = self
            .write(&users_table(&events, dedup)?, StarTable::Users)
            .await?;
        let time = self
            .write(&time_table(&events, dedup)?, StarTable::Time)
            .await?;

        let matcher = matcher_for(self.config.match_strategy);
        let facts = songplays_table(&events, songs, matcher.as_ref())?;
        let songplays = self.write(&facts, StarTable::Songplays).await?;

        Ok(LogStage {
            read: dataset.stats,
            events: events.num_rows(),
            users,
            time,
            songplays,
        })
    }
}
