//! Hierarchical glob patterns over object keys
//!
//! Supports `*` (any run of characters inside one path segment), `?` (one
//! character inside a segment) and `**` (any number of whole segments).
//! Patterns are always matched against keys relative to a location prefix.

use crate::error::{Error, Result};
use regex::Regex;

/// A compiled glob pattern
#[derive(Debug, Clone)]
pub struct GlobPattern {
    pattern: String,
    regex: Regex,
    literal_prefix: Vec<String>,
}

impl GlobPattern {
    /// Compile a glob such as `song_data/*/*/*/*.json`
    pub fn new(pattern: &str) -> Result<Self> {
        let segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Err(Error::InvalidPattern {
                pattern: pattern.to_string(),
                message: "pattern has no path segments".to_string(),
            });
        }
        if segments.iter().any(|s| *s == "." || *s == "..") {
            return Err(Error::InvalidPattern {
                pattern: pattern.to_string(),
                message: "relative segments are not allowed".to_string(),
            });
        }

        // the final segment names files, never a directory to list under
        let literal_prefix = segments[..segments.len() - 1]
            .iter()
            .take_while(|s| !has_wildcard(s))
            .map(|s| (*s).to_string())
            .collect();

        let mut expr = String::from("^");
        for (idx, segment) in segments.iter().enumerate() {
            let last = idx + 1 == segments.len();
            if *segment == "**" {
                // zero or more whole segments
                expr.push_str(if last { ".*" } else { "(?:[^/]+/)*" });
                continue;
            }
            for ch in segment.chars() {
                match ch {
                    '*' => expr.push_str("[^/]*"),
                    '?' => expr.push_str("[^/]"),
                    other => expr.push_str(&regex::escape(&other.to_string())),
                }
            }
            if !last {
                expr.push('/');
            }
        }
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|e| Error::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            literal_prefix,
        })
    }

    /// The pattern as written
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Leading segments that contain no wildcard
    ///
    /// Listing can start below these instead of at the location root.
    pub fn literal_prefix(&self) -> &[String] {
        &self.literal_prefix
    }

    /// Test a relative key such as `song_data/A/B/C/TRABCEI128F424C983.json`
    pub fn is_match(&self, key: &str) -> bool {
        self.regex.is_match(key.trim_start_matches('/'))
    }
}

fn has_wildcard(segment: &str) -> bool {
    segment.contains('*') || segment.contains('?')
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("song_data/*/*/*/*.json", "song_data/A/B/C/TRAAAAW128F429D538.json", true; "song file")]
    #[test_case("song_data/*/*/*/*.json", "song_data/A/B/TRAAAAW128F429D538.json", false; "song file too shallow")]
    #[test_case("song_data/*/*/*/*.json", "song_data/A/B/C/D/x.json", false; "star does not cross segments")]
    #[test_case("log_data/*/*/*.json", "log_data/2018/11/2018-11-12-events.json", true; "log file")]
    #[test_case("log_data/*/*/*.json", "log_data/2018/11/2018-11-12-events.jsonl", false; "extension anchored")]
    #[test_case("log_data/**/*.json", "log_data/2018/11/a.json", true; "double star many segments")]
    #[test_case("log_data/**/*.json", "log_data/a.json", true; "double star zero segments")]
    #[test_case("data/file?.json", "data/file1.json", true; "question mark")]
    #[test_case("data/file?.json", "data/file12.json", false; "question mark single char")]
    #[test_case("data/a.b.json", "data/aXb.json", false; "dot is literal")]
    fn test_glob_matching(pattern: &str, key: &str, expected: bool) {
        let glob = GlobPattern::new(pattern).unwrap();
        assert_eq!(glob.is_match(key), expected);
    }

    #[test]
    fn test_literal_prefix() {
        let glob = GlobPattern::new("song_data/*/*/*/*.json").unwrap();
        assert_eq!(glob.literal_prefix(), &["song_data".to_string()]);

        let glob = GlobPattern::new("raw/events/2018/*.json").unwrap();
        assert_eq!(glob.literal_prefix().len(), 3);

        let glob = GlobPattern::new("raw/events.json").unwrap();
        assert_eq!(glob.literal_prefix(), &["raw".to_string()]);
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(GlobPattern::new("").is_err());
        assert!(GlobPattern::new("/").is_err());
        assert!(GlobPattern::new("../secrets/*.json").is_err());
    }
}
