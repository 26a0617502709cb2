//! Pipeline run results

use crate::output::WriteSummary;
use crate::reader::ReadStats;
use serde::Serialize;

/// Output of the song stage
#[derive(Debug, Clone, Serialize)]
pub struct SongStage {
    pub read: ReadStats,
    pub songs: WriteSummary,
    pub artists: WriteSummary,
}

/// Output of the log stage
#[derive(Debug, Clone, Serialize)]
pub struct LogStage {
    pub read: ReadStats,
    /// Log rows with `page == NextSong`
    pub events: usize,
    pub users: WriteSummary,
    pub time: WriteSummary,
    pub songplays: WriteSummary,
}

/// Everything one run read and wrote
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub input: String,
    pub output: String,
    pub song_data: SongStage,
    pub log_data: LogStage,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl RunSummary {
    /// Per-table write results in the order they were written
    pub fn tables(&self) -> [&WriteSummary; 5] {
        [
            &self.song_data.songs,
            &self.song_data.artists,
            &self.log_data.users,
            &self.log_data.time,
            &self.log_data.songplays,
        ]
    }

    /// Total rows written over all tables
    pub fn rows_written(&self) -> usize {
        self.tables().iter().map(|t| t.rows).sum()
    }
}
