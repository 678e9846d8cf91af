//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// gaudi-collect - consolidate the output of a GAUDI run
///
/// Merges the per-subprocess logs of a finished run into one log and
/// writes the final population's scores as a YAML results document.
///
/// Examples:
///   gaudi-collect --config run/gaudi-collect.toml
///   gaudi-collect --config run.toml --output-dir /tmp/run --name trial
///   gaudi-collect --config run.toml --only results
///   gaudi-collect --config run.toml --dry-run
///   gaudi-collect --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the run manifest
    ///
    /// If not specified, looks for gaudi-collect.toml in the current directory
    #[arg(short, long, value_name = "FILE", env = "GAUDI_COLLECT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory the merged artifacts are written to
    ///
    /// Overrides [output].path of the manifest
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Filename stem of the merged artifacts
    ///
    /// Overrides [output].name of the manifest
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// JSON file holding the final population
    ///
    /// Overrides the manifest's population entry
    #[arg(long, value_name = "FILE")]
    pub population: Option<PathBuf>,

    /// Which artifacts to produce
    #[arg(long, default_value = "all", value_name = "WHAT")]
    pub only: Artifacts,

    /// Show what would be written without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default gaudi-collect.toml manifest
    #[arg(long)]
    pub init_config: bool,
}

/// Artifact selection for --only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Artifacts {
    /// Merged log and results document (default)
    #[default]
    All,
    /// Merged log only
    Logs,
    /// Results document only
    Results,
}

impl Artifacts {
    pub fn logs(self) -> bool {
        matches!(self, Artifacts::All | Artifacts::Logs)
    }

    pub fn results(self) -> bool {
        matches!(self, Artifacts::All | Artifacts::Results)
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref name) = self.name {
            if name.is_empty() {
                return Err("Output name must not be empty".to_string());
            }
        }

        // Validate manifest path if provided
        if let Some(ref config) = self.config {
            if !config.is_file() {
                return Err(format!("Manifest does not exist: {}", config.display()));
            }
        }

        // Validate output directory if provided
        if let Some(ref dir) = self.output_dir {
            if !dir.is_dir() {
                return Err(format!(
                    "Output directory does not exist: {}",
                    dir.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
