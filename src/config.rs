//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.readscore.toml` files.

use crate::models::Category;
use crate::scoring::CategoryWeights;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Scoring settings.
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Share link settings.
    #[serde(default)]
    pub share: ShareConfig,

    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "readscore_report.md".to_string()
}

/// Scoring algorithm settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Version tag of the scoring algorithm, embedded in every document.
    #[serde(default = "default_scoring_version")]
    pub scoring_version: String,

    /// Version tag of the extraction prompts, embedded in every document.
    #[serde(default = "default_prompt_version")]
    pub prompt_version: String,

    /// Category weights (percent). Expected to total 100.
    #[serde(default)]
    pub weights: WeightsConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            scoring_version: default_scoring_version(),
            prompt_version: default_prompt_version(),
            weights: WeightsConfig::default(),
        }
    }
}

fn default_scoring_version() -> String {
    "2.1.0".to_string()
}

fn default_prompt_version() -> String {
    "1.4.0".to_string()
}

/// Per-category weights in percent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_weight_content_structure")]
    pub content_structure: f64,
    #[serde(default = "default_weight_content_clarity")]
    pub content_clarity: f64,
    #[serde(default = "default_weight_technical_accessibility")]
    pub technical_accessibility: f64,
    #[serde(default = "default_weight_metadata_schema")]
    pub metadata_schema: f64,
    #[serde(default = "default_weight_ai_signals")]
    pub ai_signals: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            content_structure: default_weight_content_structure(),
            content_clarity: default_weight_content_clarity(),
            technical_accessibility: default_weight_technical_accessibility(),
            metadata_schema: default_weight_metadata_schema(),
            ai_signals: default_weight_ai_signals(),
        }
    }
}

fn default_weight_content_structure() -> f64 {
    20.0
}

fn default_weight_content_clarity() -> f64 {
    25.0
}

fn default_weight_technical_accessibility() -> f64 {
    20.0
}

fn default_weight_metadata_schema() -> f64 {
    15.0
}

fn default_weight_ai_signals() -> f64 {
    20.0
}

impl WeightsConfig {
    /// Convert to the aggregator's weight table, warning when the
    /// configured total drifts from 100 (redistribution normalizes it
    /// either way).
    pub fn to_category_weights(&self) -> CategoryWeights {
        let total = self.content_structure
            + self.content_clarity
            + self.technical_accessibility
            + self.metadata_schema
            + self.ai_signals;
        if (total - 100.0).abs() > 0.01 {
            warn!("configured category weights total {:.1}, expected 100", total);
        }

        CategoryWeights::new(
            [
                (Category::ContentStructure, self.content_structure),
                (Category::ContentClarity, self.content_clarity),
                (
                    Category::TechnicalAccessibility,
                    self.technical_accessibility,
                ),
                (Category::MetadataSchema, self.metadata_schema),
                (Category::AiSignals, self.ai_signals),
            ]
            .into_iter()
            .collect(),
        )
    }
}

/// Share link settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareConfig {
    /// Days a share link stays valid.
    #[serde(default = "default_share_days")]
    pub default_days: i64,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            default_days: default_share_days(),
        }
    }
}

fn default_share_days() -> i64 {
    30
}

/// Document and history storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one JSON file per analysis.
    #[serde(default = "default_store_dir")]
    pub store_dir: String,

    /// Path of the score history file.
    #[serde(default = "default_history_file")]
    pub history_file: String,

    /// Per-document size ceiling in bytes, with margin under the store cap.
    #[serde(default = "default_size_ceiling")]
    pub size_ceiling: usize,

    /// Days before an analysis becomes eligible for deletion.
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,

    /// Maximum entries held by the in-process analysis cache.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            history_file: default_history_file(),
            size_ceiling: default_size_ceiling(),
            retention_days: default_retention_days(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

fn default_store_dir() -> String {
    ".readscore/analyses".to_string()
}

fn default_history_file() -> String {
    ".readscore/history.json".to_string()
}

fn default_size_ceiling() -> usize {
    900_000
}

fn default_retention_days() -> i64 {
    180
}

fn default_cache_capacity() -> usize {
    64
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".readscore.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        if let Some(ref store) = args.store {
            self.storage.store_dir = store.display().to_string();
        }
        if let Some(ref history) = args.history {
            self.storage.history_file = history.display().to_string();
        }

        if let Some(days) = args.share_days {
            self.share.default_days = days;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
