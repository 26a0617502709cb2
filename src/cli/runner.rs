//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::output::inspect_table;
use crate::pipeline::Pipeline;
use crate::storage::StorageLocation;
use serde::Serialize;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Run { input, output } => {
                self.run_pipeline(input.as_deref(), output.as_deref())
                    .await
            }
            Commands::Config { input, output } => {
                self.show_config(input.as_deref(), output.as_deref())
            }
            Commands::Inspect { path } => self.inspect(path).await,
        }
    }

    /// Configuration from `--config-json` or `--config`, if given
    ///
    /// Not yet validated: locations may still come from flags.
    fn config_source(&self) -> Result<Option<PipelineConfig>> {
        if let Some(json_str) = &self.cli.config_json {
            return PipelineConfig::parse_json(json_str).map(Some);
        }
        if let Some(path) = &self.cli.config {
            return PipelineConfig::read_file(path).map(Some);
        }
        Ok(None)
    }

    /// Load configuration and apply command-line overrides
    ///
    /// Inline JSON takes precedence over the config file. Without either,
    /// both `--input` and `--output` are required.
    pub fn load_config(
        &self,
        input: Option<&str>,
        output: Option<&str>,
    ) -> Result<PipelineConfig> {
        let mut config = match (self.config_source()?, input, output) {
            (Some(config), _, _) => config,
            (None, Some(input), Some(output)) => PipelineConfig::new(input, output),
            (None, None, _) => return Err(Error::missing_field("input_data")),
            (None, _, None) => return Err(Error::missing_field("output_data")),
        };

        if let Some(input) = input {
            config = config.with_input(input);
        }
        if let Some(output) = output {
            config = config.with_output(output);
        }

        config.validate()?;
        Ok(config)
    }

    /// Run the pipeline and print its summary
    async fn run_pipeline(&self, input: Option<&str>, output: Option<&str>) -> Result<()> {
        let config = self.load_config(input, output)?;
        info!(config = ?config.redacted(), "Loaded configuration");

        let pipeline = Pipeline::new(config)?;
        let summary = pipeline.run().await?;
        self.output_message(&summary)
    }

    /// Print the effective configuration
    fn show_config(&self, input: Option<&str>, output: Option<&str>) -> Result<()> {
        let config = self.load_config(input, output)?;
        self.output_message(&config.redacted())
    }

    /// Describe a written table
    async fn inspect(&self, path: &str) -> Result<()> {
        // Only cloud paths need credentials from a config
        let credentials = self
            .config_source()?
            .map(|config| config.credentials)
            .unwrap_or_default();

        let location = StorageLocation::parse(path, &credentials, false)?;
        let info = inspect_table(&location).await?;
        self.output_message(&info)
    }

    /// Output a message
    fn output_message<T: Serialize>(&self, msg: &T) -> Result<()> {
        let text = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(msg)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(msg)?,
        };
        println!("{text}");
        Ok(())
    }
}
