//! CLI module
//!
//! Command-line interface for running the pipeline.
//!
//! # Commands
//!
//! - `run` - Build the star schema
//! - `config` - Show the effective configuration, secrets masked
//! - `inspect` - Describe a written table directory

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
