//! Song matching predicates

use crate::types::MatchStrategy;

/// Join key of an (artist, title) pair
pub type MatchKey = (String, String);

/// Decides which catalog songs a log event refers to
///
/// Two sides match when their keys are equal. A missing artist or title
/// never produces a key, so it never matches.
pub trait SongMatcher: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Canonical form of one side of the key
    fn normalize(&self, value: &str) -> String;

    /// Key of an (artist, title) pair, `None` if either is missing
    fn key(&self, artist: Option<&str>, title: Option<&str>) -> Option<MatchKey> {
        Some((self.normalize(artist?), self.normalize(title?)))
    }
}

/// Exact string equality on artist and title
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatcher;

impl SongMatcher for ExactMatcher {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn normalize(&self, value: &str) -> String {
        value.to_string()
    }
}

/// Case-insensitive equality with runs of whitespace collapsed
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedMatcher;

impl SongMatcher for NormalizedMatcher {
    fn name(&self) -> &'static str {
        "normalized"
    }

    fn normalize(&self, value: &str) -> String {
        value
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}

/// Matcher for a configured strategy
pub fn matcher_for(strategy: MatchStrategy) -> Box<dyn SongMatcher> {
    match strategy {
        MatchStrategy::Exact => Box::new(ExactMatcher),
        MatchStrategy::Normalized => Box::new(NormalizedMatcher),
    }
}
