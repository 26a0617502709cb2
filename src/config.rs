//! Pipeline configuration
//!
//! Everything a run needs is carried by one [`PipelineConfig`] value that is
//! passed into [`crate::pipeline::Pipeline::new`]. Nothing is read from or
//! written to the process environment.
//!
//! # Example
//!
//! ```yaml
//! input_data: s3a://udacity-dend/
//! output_data: s3a://my-lake/star/
//! credentials:
//!   access_key_id: AKIA...
//!   secret_access_key: "..."
//!   region: us-west-2
//! timezone: utc
//! match_strategy: exact
//! parquet:
//!   compression: zstd
//! ```

use crate::error::{Error, Result, ResultExt};
use crate::output::ParquetWriterConfig;
use crate::types::{MalformedRecords, MatchStrategy, OptionStringExt, TimeZoneMode};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default glob for the song catalog, relative to `input_data`
pub const DEFAULT_SONG_DATA: &str = "song_data/*/*/*/*.json";

/// Default glob for the event logs, relative to `input_data`
pub const DEFAULT_LOG_DATA: &str = "log_data/*/*/*.json";

const MASK: &str = "********";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete configuration for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Base URL or path of the raw JSON dataset
    ///
    /// May be left out of a config file and supplied on the command line;
    /// [`PipelineConfig::validate`] rejects it if still empty.
    #[serde(default)]
    pub input_data: String,

    /// Base URL or path the star schema is written to
    #[serde(default)]
    pub output_data: String,

    /// Song catalog glob, relative to `input_data`
    #[serde(default = "default_song_data")]
    pub song_data: String,

    /// Event log glob, relative to `input_data`
    #[serde(default = "default_log_data")]
    pub log_data: String,

    /// Object storage credentials
    #[serde(default)]
    pub credentials: StorageCredentials,

    /// Zone for calendar attributes
    #[serde(default)]
    pub timezone: TimeZoneMode,

    /// Songplays join predicate
    #[serde(default)]
    pub match_strategy: MatchStrategy,

    /// Keep one row per dimension key
    #[serde(default = "default_true")]
    pub deduplicate: bool,

    /// Reader policy for lines that are not JSON objects
    #[serde(default)]
    pub malformed_records: MalformedRecords,

    /// Parquet encoding settings
    #[serde(default)]
    pub parquet: ParquetSettings,
}

fn default_song_data() -> String {
    DEFAULT_SONG_DATA.to_string()
}

fn default_log_data() -> String {
    DEFAULT_LOG_DATA.to_string()
}

fn default_true() -> bool {
    true
}

impl PipelineConfig {
    /// Create a config with defaults for everything but the two locations
    pub fn new(input_data: impl Into<String>, output_data: impl Into<String>) -> Self {
        Self {
            input_data: input_data.into(),
            output_data: output_data.into(),
            song_data: default_song_data(),
            log_data: default_log_data(),
            credentials: StorageCredentials::default(),
            timezone: TimeZoneMode::default(),
            match_strategy: MatchStrategy::default(),
            deduplicate: true,
            malformed_records: MalformedRecords::default(),
            parquet: ParquetSettings::default(),
        }
    }

    /// Parse YAML (a superset of JSON)
    pub fn from_yaml(content: &str) -> Result<Self> {
        Self::parse_yaml(content)?.validated()
    }

    /// Parse a JSON document
    pub fn from_json(content: &str) -> Result<Self> {
        Self::parse_json(content)?.validated()
    }

    /// Load a YAML or JSON file, picked by extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::read_file(path)?.validated()
    }

    /// Parse YAML without validating, so overrides can fill in locations
    pub fn parse_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Parse JSON without validating
    pub fn parse_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Read a YAML or JSON file without validating
    pub fn read_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::parse_json(&content),
            _ => Self::parse_yaml(&content),
        }
    }

    fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }

    /// Override the input location
    #[must_use]
    pub fn with_input(mut self, input_data: impl Into<String>) -> Self {
        self.input_data = input_data.into();
        self
    }

    /// Override the output location
    #[must_use]
    pub fn with_output(mut self, output_data: impl Into<String>) -> Self {
        self.output_data = output_data.into();
        self
    }

    #[must_use]
    pub fn with_timezone(mut self, timezone: TimeZoneMode) -> Self {
        self.timezone = timezone;
        self
    }

    #[must_use]
    pub fn with_match_strategy(mut self, strategy: MatchStrategy) -> Self {
        self.match_strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_deduplicate(mut self, enabled: bool) -> Self {
        self.deduplicate = enabled;
        self
    }

    #[must_use]
    pub fn with_malformed_records(mut self, policy: MalformedRecords) -> Self {
        self.malformed_records = policy;
        self
    }

    /// Check the values serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.input_data.trim().is_empty() {
            return Err(Error::missing_field("input_data"));
        }
        if self.output_data.trim().is_empty() {
            return Err(Error::missing_field("output_data"));
        }
        if self.song_data.trim().is_empty() {
            return Err(Error::invalid_value("song_data", "glob must not be empty"));
        }
        if self.log_data.trim().is_empty() {
            return Err(Error::invalid_value("log_data", "glob must not be empty"));
        }
        if self.parquet.row_group_size == 0 {
            return Err(Error::invalid_value(
                "parquet.row_group_size",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Copy with secrets replaced, for printing
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.credentials = self.credentials.redacted();
        config
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Credentials handed to the object store builders
///
/// These apply to `s3://` and `s3a://` locations. When absent, the S3 client
/// falls back to its own provider chain (instance metadata and similar).
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Custom endpoint for S3-compatible stores (MinIO, R2)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl StorageCredentials {
    /// Static key pair
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: Some(access_key_id.into()),
            secret_access_key: Some(secret_access_key.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Copy with empty strings treated as unset
    ///
    /// YAML like `access_key_id: ""` then falls through to the store's own
    /// provider chain instead of sending an empty key.
    #[must_use]
    pub fn non_empty(&self) -> Self {
        Self {
            access_key_id: self.access_key_id.clone().none_if_empty(),
            secret_access_key: self.secret_access_key.clone().none_if_empty(),
            session_token: self.session_token.clone().none_if_empty(),
            region: self.region.clone().none_if_empty(),
            endpoint: self.endpoint.clone().none_if_empty(),
        }
    }

    fn redacted(&self) -> Self {
        Self {
            access_key_id: self.access_key_id.clone(),
            secret_access_key: self.secret_access_key.as_ref().map(|_| MASK.to_string()),
            session_token: self.session_token.as_ref().map(|_| MASK.to_string()),
            region: self.region.clone(),
            endpoint: self.endpoint.clone(),
        }
    }
}

// Keep secrets out of `{:?}` output and logs
impl std::fmt::Debug for StorageCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageCredentials")
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| MASK),
            )
            .field("session_token", &self.session_token.as_ref().map(|_| MASK))
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

// ============================================================================
// Parquet Settings
// ============================================================================

/// Parquet codec names accepted in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParquetCompression {
    #[default]
    Snappy,
    Zstd,
    Gzip,
    Uncompressed,
}

/// Parquet encoding settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParquetSettings {
    #[serde(default)]
    pub compression: ParquetCompression,

    #[serde(default = "default_row_group_size")]
    pub row_group_size: usize,

    #[serde(default = "default_true")]
    pub dictionary: bool,

    #[serde(default = "default_true")]
    pub statistics: bool,
}

fn default_row_group_size() -> usize {
    1024 * 1024
}

impl Default for ParquetSettings {
    fn default() -> Self {
        Self {
            compression: ParquetCompression::default(),
            row_group_size: default_row_group_size(),
            dictionary: true,
            statistics: true,
        }
    }
}

impl ParquetSettings {
    /// Build the writer config these settings describe
    pub fn writer_config(&self) -> ParquetWriterConfig {
        let config = ParquetWriterConfig::new()
            .with_row_group_size(self.row_group_size)
            .with_dictionary(self.dictionary)
            .with_statistics(self.statistics);
        match self.compression {
            ParquetCompression::Snappy => config,
            ParquetCompression::Zstd => config.zstd(),
            ParquetCompression::Gzip => config.gzip(),
            ParquetCompression::Uncompressed => config.uncompressed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let config = PipelineConfig::from_yaml(
            r"
input_data: s3a://udacity-dend/
output_data: /tmp/lake
",
        )
        .unwrap();

        assert_eq!(config.song_data, DEFAULT_SONG_DATA);
        assert_eq!(config.log_data, DEFAULT_LOG_DATA);
        assert_eq!(config.timezone, TimeZoneMode::Local);
        assert_eq!(config.match_strategy, MatchStrategy::Exact);
        assert!(config.deduplicate);
        assert_eq!(config.malformed_records, MalformedRecords::Skip);
        assert_eq!(config.parquet, ParquetSettings::default());
        assert_eq!(config.credentials, StorageCredentials::default());
    }

    #[test]
    fn test_full_yaml() {
        let config = PipelineConfig::from_yaml(
            r#"
input_data: s3a://udacity-dend/
output_data: s3://lake/star
song_data: songs/**/*.json
credentials:
  access_key_id: AKIAEXAMPLE
  secret_access_key: "s3cr3t"
  region: us-west-2
timezone: utc
match_strategy: normalized
deduplicate: false
malformed_records: fail
parquet:
  compression: zstd
  row_group_size: 5000
"#,
        )
        .unwrap();

        assert_eq!(config.song_data, "songs/**/*.json");
        assert_eq!(config.log_data, DEFAULT_LOG_DATA);
        assert_eq!(
            config.credentials.access_key_id.as_deref(),
            Some("AKIAEXAMPLE")
        );
        assert_eq!(config.credentials.region.as_deref(), Some("us-west-2"));
        assert_eq!(config.timezone, TimeZoneMode::Utc);
        assert_eq!(config.match_strategy, MatchStrategy::Normalized);
        assert!(!config.deduplicate);
        assert_eq!(config.malformed_records, MalformedRecords::Fail);
        assert_eq!(config.parquet.compression, ParquetCompression::Zstd);
        assert_eq!(
            config.parquet.writer_config(),
            ParquetWriterConfig::new().zstd().with_row_group_size(5000)
        );
    }

    #[test]
    fn test_json_config() {
        let config =
            PipelineConfig::from_json(r#"{"input_data": "/in", "output_data": "/out"}"#).unwrap();
        assert_eq!(config, PipelineConfig::new("/in", "/out"));
    }

    #[test]
    fn test_missing_location_rejected() {
        let err = PipelineConfig::from_yaml("input_data: /in\noutput_data: ''\n").unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { ref field } if field == "output_data"));

        let err = PipelineConfig::from_yaml("output_data: /out\n").unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { ref field } if field == "input_data"));
    }

    #[test]
    fn test_parse_without_locations() {
        let config = PipelineConfig::parse_yaml("timezone: utc\n").unwrap();
        assert!(config.input_data.is_empty());
        assert!(config.output_data.is_empty());
        assert_eq!(config.timezone, TimeZoneMode::Utc);
        assert!(config.validate().is_err());

        let config = config.with_input("/in").with_output("/out");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_credentials_are_unset() {
        let config = PipelineConfig::from_yaml(
            r#"
input_data: s3a://udacity-dend/
output_data: /tmp/lake
credentials:
  access_key_id: ""
  secret_access_key: ""
  region: us-west-2
"#,
        )
        .unwrap();

        let credentials = config.credentials.non_empty();
        assert_eq!(credentials.access_key_id, None);
        assert_eq!(credentials.secret_access_key, None);
        assert_eq!(credentials.region.as_deref(), Some("us-west-2"));
        assert_eq!(StorageCredentials::new("", "").non_empty(), StorageCredentials::default());
    }

    #[test]
    fn test_zero_row_group_rejected() {
        let mut config = PipelineConfig::new("/in", "/out");
        config.parquet.row_group_size = 0;
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfigValue { .. })
        ));
    }

    #[test]
    fn test_redacted_hides_secrets() {
        let mut config = PipelineConfig::new("/in", "/out");
        config.credentials = StorageCredentials::new("AKIAEXAMPLE", "s3cr3t");

        let redacted = config.redacted();
        assert_eq!(
            redacted.credentials.access_key_id.as_deref(),
            Some("AKIAEXAMPLE")
        );
        assert_eq!(redacted.credentials.secret_access_key.as_deref(), Some(MASK));

        let debug = format!("{:?}", config.credentials);
        assert!(!debug.contains("s3cr3t"));
    }

    #[test]
    fn test_from_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("etl.yaml");
        std::fs::write(&yaml, "input_data: /in\noutput_data: /out\n").unwrap();
        let json = dir.path().join("etl.json");
        std::fs::write(&json, r#"{"input_data": "/in", "output_data": "/out"}"#).unwrap();

        assert_eq!(
            PipelineConfig::from_file(&yaml).unwrap(),
            PipelineConfig::from_file(&json).unwrap()
        );
        let err = PipelineConfig::from_file(dir.path().join("missing.yaml")).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read config file"));
    }
}
