//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// ReadScore - readability and AI-visibility scoring for web content
///
/// Score a page from a prepared analysis request (check results plus
/// extraction views), persist the result, and render a report.
///
/// Examples:
///   readscore --input request.json
///   readscore --input request.json --format json --output page.json
///   readscore --input request.json --share --share-days 7
///   readscore --input request.json --dry-run
///   readscore --sweep
///   readscore --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Analysis request file (JSON)
    ///
    /// Produced by the check runner and extraction providers. Not required
    /// when using --init-config, --sweep, or --revoke.
    #[arg(
        short,
        long,
        value_name = "FILE",
        required_unless_present_any = ["init_config", "sweep", "revoke"]
    )]
    pub input: Option<PathBuf>,

    /// Output file path for the report
    ///
    /// Defaults to readscore_report.md, or the config file setting.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .readscore.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory for persisted analysis documents
    #[arg(long, value_name = "DIR", env = "READSCORE_STORE")]
    pub store: Option<PathBuf>,

    /// Score history file
    #[arg(long, value_name = "FILE", env = "READSCORE_HISTORY")]
    pub history: Option<PathBuf>,

    /// User id owning this analysis (overrides the request's userId)
    #[arg(long, value_name = "ID")]
    pub user: Option<String>,

    /// Issue a time-boxed share link for the stored document
    #[arg(long)]
    pub share: bool,

    /// Days a newly issued share link stays valid
    #[arg(long, value_name = "DAYS")]
    pub share_days: Option<i64>,

    /// Fail if the overall score is below this value
    ///
    /// Useful for CI pipelines. Exit code 2 when the score falls short.
    #[arg(long, value_name = "SCORE")]
    pub fail_under: Option<u8>,

    /// Validate and summarize the request without scoring or persisting
    #[arg(long)]
    pub dry_run: bool,

    /// Delete stored documents past the retention cutoff, then exit
    #[arg(long)]
    pub sweep: bool,

    /// Revoke the share link of a stored document, then exit
    #[arg(long, value_name = "DOC_ID")]
    pub revoke: Option<String>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .readscore.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
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

        if let Some(ref input) = self.input {
            if !input.exists() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
            if !input.is_file() {
                return Err(format!("Input path is not a file: {}", input.display()));
            }
        }

        if let Some(fail_under) = self.fail_under {
            if fail_under > 100 {
                return Err("Fail-under score must be between 0 and 100".to_string());
            }
        }

        if let Some(days) = self.share_days {
            if days < 1 {
                return Err("Share days must be at least 1".to_string());
            }
        }

        if self.share_days.is_some() && !self.share {
            return Err("--share-days requires --share".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.dry_run && self.sweep {
            return Err("Cannot use both --dry-run and --sweep".to_string());
        }

        if self.revoke.is_some() && (self.dry_run || self.sweep || self.share) {
            return Err("--revoke cannot be combined with --dry-run, --sweep, or --share".to_string());
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
