//! TOML configuration file support.
//!
//! Instead of passing many CLI flags, users can specify settings in a config file:
//!
//! ```toml
//! # tsbatch.toml
//! [batch]
//! database = "telegraf"
//! retention_policy = "autogen"
//! measurement = "cpu"
//! max_rows = 50000
//!
//! [export]
//! compression_level = 9
//! row_group_size = 200000
//! ```
//!
//! Command-line flags take precedence over file values.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Root configuration structure for tsbatch.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Batch target and sizing.
    #[serde(default)]
    pub batch: BatchConfig,

    /// Parquet export settings.
    #[serde(default)]
    pub export: ExportSection,
}

/// Batch identifiers and sizing.
#[derive(Debug, Default, Deserialize)]
pub struct BatchConfig {
    /// Target database.
    pub database: Option<String>,

    /// Target retention policy.
    pub retention_policy: Option<String>,

    /// Target measurement.
    pub measurement: Option<String>,

    /// Rows per batch before a flush.
    pub max_rows: Option<usize>,
}

/// Configuration for Parquet output.
#[derive(Debug, Default, Deserialize)]
pub struct ExportSection {
    /// ZSTD compression level (1-22).
    pub compression_level: Option<i32>,

    /// Rows per Parquet row group.
    pub row_group_size: Option<usize>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}
