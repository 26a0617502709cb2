//! Songplays fact table
//!
//! Correlates `NextSong` events with catalog songs on (artist, title) and
//! projects one fact row per matching pair.

mod matcher;

pub use matcher::{matcher_for, ExactMatcher, MatchKey, NormalizedMatcher, SongMatcher};

use crate::error::{Error, Result};
use crate::extract::{project, ColumnMapping};
use crate::table::Table;
use crate::types::StarTable;
use arrow::array::{Array, StringArray, UInt32Array};
use std::collections::HashMap;
use tracing::debug;

/// Event columns carried into the fact, in output order around the song columns
fn event_columns() -> Vec<ColumnMapping> {
    vec![
        ColumnMapping::keep("start_time"),
        ColumnMapping::rename("userId", "user_id"),
        ColumnMapping::keep("level"),
        ColumnMapping::rename("sessionId", "session_id"),
        ColumnMapping::rename("userAgent", "user_agent"),
        ColumnMapping::keep("year"),
        ColumnMapping::keep("month"),
    ]
}

fn song_columns() -> Vec<ColumnMapping> {
    vec![
        ColumnMapping::keep("song_id"),
        ColumnMapping::keep("artist_id"),
        ColumnMapping::rename("artist_location", "location"),
    ]
}

/// Output column order of the songplays table
pub const SONGPLAYS_COLUMNS: [&str; 10] = [
    "start_time",
    "user_id",
    "level",
    "song_id",
    "artist_id",
    "session_id",
    "location",
    "user_agent",
    "year",
    "month",
];

/// Title of the song each event played: `title`, falling back to `song`
///
/// Either column may be absent, but not both.
pub fn event_titles(events: &Table) -> Result<Vec<Option<String>>> {
    let title = events
        .has_column("title")
        .then(|| events.string_column("title"))
        .transpose()?;
    let song = events
        .has_column("song")
        .then(|| events.string_column("song"))
        .transpose()?;

    if title.is_none() && song.is_none() {
        return Err(Error::missing_column(events.name(), "title"));
    }

    let cell = |array: Option<&StringArray>, row: usize| {
        array.and_then(|a| (!a.is_null(row)).then(|| a.value(row).to_string()))
    };
    Ok((0..events.num_rows())
        .map(|row| cell(title, row).or_else(|| cell(song, row)))
        .collect())
}

/// Build the songplays fact from events and the raw song records
///
/// `events` must already be restricted to `NextSong` rows and carry the
/// derived time columns. Inner join: events without a matching song are
/// dropped, and an event matching several songs yields one row per song.
/// Rows come out in event order, then song order.
pub fn songplays_table(events: &Table, songs: &Table, matcher: &dyn SongMatcher) -> Result<Table> {
    let song_artists = songs.string_column("artist_name")?;
    let song_titles = songs.string_column("title")?;

    let mut index: HashMap<MatchKey, Vec<u32>> = HashMap::new();
    for row in 0..songs.num_rows() {
        let artist = (!song_artists.is_null(row)).then(|| song_artists.value(row));
        let title = (!song_titles.is_null(row)).then(|| song_titles.value(row));
        if let Some(key) = matcher.key(artist, title) {
            index.entry(key).or_default().push(row as u32);
        }
    }

    let event_artists = events.string_column("artist")?;
    let titles = event_titles(events)?;

    let mut event_rows = Vec::new();
    let mut song_rows = Vec::new();
    for (row, title) in titles.iter().enumerate() {
        let artist = (!event_artists.is_null(row)).then(|| event_artists.value(row));
        let Some(matches) = matcher
            .key(artist, title.as_deref())
            .and_then(|key| index.get(&key))
        else {
            continue;
        };
        for &song_row in matches {
            event_rows.push(row as u32);
            song_rows.push(song_row);
        }
    }

    debug!(
        matcher = matcher.name(),
        events = events.num_rows(),
        songs = songs.num_rows(),
        matched = event_rows.len(),
        "Joined events to songs"
    );

    let name = StarTable::Songplays.name();
    let left = project(
        &events.take(&UInt32Array::from(event_rows))?,
        name,
        &event_columns(),
    )?;
    let right = project(
        &songs.take(&UInt32Array::from(song_rows))?,
        name,
        &song_columns(),
    )?;

    let columns = SONGPLAYS_COLUMNS
        .iter()
        .map(|column| {
            let side = if left.has_column(column) { &left } else { &right };
            Ok((side.field(column)?, side.column(column)?.clone()))
        })
        .collect::<Result<Vec<_>>>()?;

    Table::from_columns(name, columns)
}
