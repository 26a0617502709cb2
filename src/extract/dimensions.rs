//! The four dimension tables of the star schema

use super::dedup::keep_last;
use super::mapping::{project, ColumnMapping};
use crate::error::Result;
use crate::table::Table;
use crate::types::StarTable;

/// `page` value of a log row that records a song play
pub const NEXT_SONG: &str = "NextSong";

/// songs: song_id, title, artist_id, year, duration
pub fn songs_columns() -> Vec<ColumnMapping> {
    vec![
        ColumnMapping::keep("song_id"),
        ColumnMapping::keep("title"),
        ColumnMapping::keep("artist_id"),
        ColumnMapping::keep("year"),
        ColumnMapping::keep("duration"),
    ]
}

/// artists: artist_id, name, location, latitude, longitude
pub fn artists_columns() -> Vec<ColumnMapping> {
    vec![
        ColumnMapping::keep("artist_id"),
        ColumnMapping::rename("artist_name", "name"),
        ColumnMapping::rename("artist_location", "location"),
        ColumnMapping::rename("artist_latitude", "latitude"),
        ColumnMapping::rename("artist_longitude", "longitude"),
    ]
}

/// users: user_id, first_name, last_name, gender, level
pub fn users_columns() -> Vec<ColumnMapping> {
    vec![
        ColumnMapping::rename("userId", "user_id"),
        ColumnMapping::rename("firstName", "first_name"),
        ColumnMapping::rename("lastName", "last_name"),
        ColumnMapping::keep("gender"),
        ColumnMapping::keep("level"),
    ]
}

/// time: start_time, hour, day, week, month, year, weekday
pub fn time_columns() -> Vec<ColumnMapping> {
    ["start_time", "hour", "day", "week", "month", "year", "weekday"]
        .into_iter()
        .map(ColumnMapping::keep)
        .collect()
}

/// Songs dimension from raw song records, one row per song_id when deduplicating
pub fn songs_table(songs: &Table, deduplicate: bool) -> Result<Table> {
    let source = if deduplicate {
        keep_last(songs, &["song_id"], None)?
    } else {
        songs.clone()
    };
    project(&source, StarTable::Songs.name(), &songs_columns())
}

/// Artists dimension from raw song records; the last record read wins
pub fn artists_table(songs: &Table, deduplicate: bool) -> Result<Table> {
    let source = if deduplicate {
        keep_last(songs, &["artist_id"], None)?
    } else {
        songs.clone()
    };
    project(&source, StarTable::Artists.name(), &artists_columns())
}

/// Users dimension from song-play events; the latest event by `ts` wins
///
/// `events` must already be restricted to `page == NextSong`.
pub fn users_table(events: &Table, deduplicate: bool) -> Result<Table> {
    let source = if deduplicate {
        keep_last(events, &["userId"], Some("ts"))?
    } else {
        events.clone()
    };
    project(&source, StarTable::Users.name(), &users_columns())
}

/// Time dimension from events carrying derived calendar columns
pub fn time_table(events: &Table, deduplicate: bool) -> Result<Table> {
    let source = if deduplicate {
        keep_last(events, &["start_time"], None)?
    } else {
        events.clone()
    };
    project(&source, StarTable::Time.name(), &time_columns())
}
