//! Storage module
//!
//! Object storage access for both the raw JSON dataset and the Parquet output.
//!
//! # Overview
//!
//! - [`StorageLocation`]: an `object_store` backend plus a key prefix, parsed
//!   from `s3://`, `s3a://`, `gs://`, `az://`, `file://` URLs or plain paths
//! - [`GlobPattern`]: hierarchical globs (`song_data/*/*/*/*.json`) resolved
//!   against a location

mod glob;
mod location;

pub use glob::GlobPattern;
pub use location::StorageLocation;
