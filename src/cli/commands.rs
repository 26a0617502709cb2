//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Song-play star schema builder
#[derive(Parser, Debug)]
#[command(name = "playlake")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Pipeline configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Inline configuration JSON, takes precedence over --config
    #[arg(long, global = true)]
    pub config_json: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build all five tables from the raw dataset
    Run {
        /// Raw dataset location, overrides `input_data`
        /// Supports: /path, file:///path, s3://bucket/path, gs://bucket/path, az://container/path
        #[arg(short, long)]
        input: Option<String>,

        /// Star schema location, overrides `output_data`
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Print the effective configuration with secrets masked
    Config {
        #[arg(short, long)]
        input: Option<String>,

        #[arg(short, long)]
        output: Option<String>,
    },

    /// Read a written table directory back and describe it
    Inspect {
        /// Table directory, e.g. ./lake/songplays or s3://bucket/lake/songs
        path: String,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON on one line
    Json,
    /// Indented JSON
    Pretty,
}
