//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::Cli;
use crate::config::{KeyingConfig, KeyingConfigBuilder, OutputMode};
use anyhow::{Context, Result};

/// Convert CLI arguments to a validated `KeyingConfig`
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build the keying configuration: config file first, then flag overrides
    pub(crate) fn from_cli(cli: &Cli) -> Result<KeyingConfig> {
        let base = match &cli.config {
            Some(path) => KeyingConfig::from_json_file(path).with_context(|| {
                format!("Failed to load configuration file: {}", path.display())
            })?,
            None => KeyingConfig::default(),
        };

        let mut builder = KeyingConfigBuilder::from_config(base);

        if let Some(min_channel) = cli.min_channel {
            builder = builder.min_channel(min_channel);
        }
        if let Some(max_spread) = cli.max_spread {
            builder = builder.max_spread(max_spread);
        }
        if let Some(format) = cli.format {
            builder = builder.output_format(format.into());
        }
        if cli.in_place {
            builder = builder.output_mode(OutputMode::InPlace);
        }
        if cli.verbose > 0 {
            builder = builder.debug(true);
        }

        builder.build().context("Invalid configuration")
    }

    /// Validate CLI arguments for consistency
    pub(crate) fn validate_cli(cli: &Cli) -> Result<()> {
        if cli.limit == Some(0) {
            anyhow::bail!("--limit must be at least 1");
        }

        if cli.analyze && (cli.in_place || cli.output.is_some()) {
            anyhow::bail!("--analyze only reads images; drop --in-place and --output");
        }

        // In-place output keeps each file's own container format
        if cli.in_place && cli.format.is_some() {
            anyhow::bail!("--format cannot be combined with --in-place");
        }

        if let Some(pattern) = &cli.pattern {
            glob::Pattern::new(pattern)
                .with_context(|| format!("Invalid --pattern: {pattern}"))?;
        }

        Ok(())
    }
}
