// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # playlake
//!
//! Builds a star schema of song plays from raw JSON-lines data and writes it
//! as Hive-partitioned Parquet to local disk or object storage.
//!
//! ## Tables
//!
//! - `songs` (partitioned by year, artist_id) and `artists` (artist_id) from the
//!   song catalog
//! - `users` (user_id), `time` (year, month) and the `songplays` fact
//!   (year, month) from the `NextSong` events of the activity log
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use playlake::{Pipeline, PipelineConfig, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = PipelineConfig::new("s3a://udacity-dend/", "./lake");
//!     let summary = Pipeline::new(config)?.run().await?;
//!     println!("{} rows written", summary.rows_written());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐    ┌─────────────────────────────┐    ┌──────────────┐
//! │    reader    │    │ extract · time · facts      │    │    output    │
//! │ glob + JSONL ├───►│ project, dedup, derive, join├───►│ Hive Parquet │
//! │  → Table     │    │ (pure, over Arrow)          │    │ + _SUCCESS   │
//! └──────┬───────┘    └─────────────────────────────┘    └──────┬───────┘
//!        └────────────────── storage (object_store) ────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Pipeline configuration
pub mod config;

/// Object storage locations and glob matching
pub mod storage;

/// Named Arrow tables
pub mod table;

/// JSON-lines dataset reader
pub mod reader;

/// Dimension projection and deduplication
pub mod extract;

/// Timestamp derivation
pub mod time;

/// Songplays fact construction
pub mod facts;

/// Partitioned Parquet output
pub mod output;

/// Run orchestration
pub mod pipeline;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use pipeline::{Pipeline, RunSummary};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
