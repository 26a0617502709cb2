//! Common types used throughout playlake
//!
//! This module contains shared type definitions and small enums that are
//! referenced from configuration as well as from the transformation modules.

use serde::{Deserialize, Serialize};

// ============================================================================
// Star Schema Tables
// ============================================================================

/// The five tables produced by one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StarTable {
    Songs,
    Artists,
    Users,
    Time,
    Songplays,
}

impl StarTable {
    /// All tables in the order a run writes them
    pub const ALL: [StarTable; 5] = [
        StarTable::Songs,
        StarTable::Artists,
        StarTable::Users,
        StarTable::Time,
        StarTable::Songplays,
    ];

    /// Directory name of the table under the output location
    pub fn name(self) -> &'static str {
        match self {
            StarTable::Songs => "songs",
            StarTable::Artists => "artists",
            StarTable::Users => "users",
            StarTable::Time => "time",
            StarTable::Songplays => "songplays",
        }
    }

    /// Partition columns, outermost first
    pub fn partition_by(self) -> &'static [&'static str] {
        match self {
            StarTable::Songs => &["year", "artist_id"],
            StarTable::Artists => &["artist_id"],
            StarTable::Users => &["user_id"],
            StarTable::Time | StarTable::Songplays => &["year", "month"],
        }
    }
}

impl std::fmt::Display for StarTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Time Zone
// ============================================================================

/// Zone used to turn epoch seconds into calendar attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeZoneMode {
    /// The run environment's default zone
    #[default]
    Local,
    /// Coordinated Universal Time
    Utc,
}

// ============================================================================
// Match Strategy
// ============================================================================

/// How log events are correlated with catalog songs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Exact artist and title string equality
    #[default]
    Exact,
    /// Case-insensitive, whitespace-collapsed equality
    Normalized,
}

// ============================================================================
// Malformed Record Policy
// ============================================================================

/// What the reader does with a line that is not a JSON object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedRecords {
    /// Log and skip the line
    #[default]
    Skip,
    /// Abort the read
    Fail,
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_table_partitioning() {
        assert_eq!(StarTable::Songs.partition_by(), &["year", "artist_id"]);
        assert_eq!(StarTable::Artists.partition_by(), &["artist_id"]);
        assert_eq!(StarTable::Users.partition_by(), &["user_id"]);
        assert_eq!(StarTable::Time.partition_by(), &["year", "month"]);
        assert_eq!(StarTable::Songplays.partition_by(), &["year", "month"]);
    }

    #[test]
    fn test_star_table_serde() {
        let table: StarTable = serde_json::from_str("\"songplays\"").unwrap();
        assert_eq!(table, StarTable::Songplays);
        assert_eq!(StarTable::Time.to_string(), "time");
    }

    #[test]
    fn test_enum_defaults() {
        assert_eq!(TimeZoneMode::default(), TimeZoneMode::Local);
        assert_eq!(MatchStrategy::default(), MatchStrategy::Exact);
        assert_eq!(MalformedRecords::default(), MalformedRecords::Skip);

        let mode: MatchStrategy = serde_json::from_str("\"normalized\"").unwrap();
        assert_eq!(mode, MatchStrategy::Normalized);
    }

    #[test]
    fn test_option_string_none_if_empty() {
        assert_eq!(
            Some("test".to_string()).none_if_empty(),
            Some("test".to_string())
        );
        assert_eq!(Some(String::new()).none_if_empty(), None);
        assert_eq!(None::<String>.none_if_empty(), None);
    }
}
