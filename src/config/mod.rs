//! Configuration management for export operations
//!
//! This module holds the declarative settings of an export: batching,
//! header/footer rendering, file rotation, CSV file layout and result
//! handling. Settings can be built programmatically or loaded from a TOML
//! file.
//!
//! Configuration precedence (highest to lowest):
//! 1. Builder methods on [`crate::CsvGrid`]
//! 2. Values loaded from a configuration file
//! 3. Default values

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

/// Main configuration structure for an export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Number of rows fetched from the data source per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Whether to write a header row at the top of each output file
    #[serde(default = "default_true")]
    pub show_header: bool,

    /// Whether to write a footer row at the end of the export
    #[serde(default)]
    pub show_footer: bool,

    /// Whether continuation files created by rotation repeat the header row.
    /// When `false` the header is written to the first file only.
    #[serde(default = "default_true")]
    pub repeat_header: bool,

    /// Placeholder rendered for cells without content
    #[serde(default)]
    pub empty_cell: String,

    /// Text rendered for cells whose resolved value is null
    #[serde(default)]
    pub null_display: String,

    /// Maximum number of data rows per output file; `None` disables rotation
    #[serde(default)]
    pub max_entries_per_file: Option<usize>,

    /// CSV file layout configuration
    #[serde(default)]
    pub csv: CsvFileConfig,

    /// Export result configuration
    #[serde(default)]
    pub result: ResultConfig,
}

/// Layout configuration for a single CSV output file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvFileConfig {
    /// Delimiter between rows
    #[serde(default = "default_row_delimiter")]
    pub row_delimiter: String,

    /// Delimiter between cells
    #[serde(default = "default_cell_delimiter")]
    pub cell_delimiter: String,

    /// Cell content enclosure; the empty string disables escaping
    #[serde(default = "default_enclosure")]
    pub enclosure: String,

    /// Byte order mark written before the first row
    #[serde(default)]
    pub bom: BomConfig,
}

/// Byte-order-mark setting.
///
/// `true` enables the standard UTF-8 BOM (`EF BB BF`), `false` disables the
/// BOM, and a string supplies literal bytes to emit instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum BomConfig {
    /// Standard UTF-8 BOM when `true`, no BOM when `false`
    Enabled(bool),
    /// Caller-supplied literal bytes
    Literal(String),
}

impl Default for BomConfig {
    fn default() -> Self {
        BomConfig::Enabled(false)
    }
}

/// Configuration for the export result and its working directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultConfig {
    /// Directory under which per-export working directories are created
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,

    /// Base name used for output files and the archive
    #[serde(default = "default_file_base_name")]
    pub file_base_name: String,

    /// Produce an archive even when there is only one output file
    #[serde(default)]
    pub force_archive: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            show_header: true,
            show_footer: false,
            repeat_header: true,
            empty_cell: String::new(),
            null_display: String::new(),
            max_entries_per_file: None,
            csv: CsvFileConfig::default(),
            result: ResultConfig::default(),
        }
    }
}

impl Default for CsvFileConfig {
    fn default() -> Self {
        Self {
            row_delimiter: default_row_delimiter(),
            cell_delimiter: default_cell_delimiter(),
            enclosure: default_enclosure(),
            bom: BomConfig::default(),
        }
    }
}

impl Default for ResultConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            file_base_name: default_file_base_name(),
            force_archive: false,
        }
    }
}

impl ExportConfig {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Result<Self>` - Parsed configuration or error
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|_| {
            ConfigError::FileNotFound(path.display().to_string())
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value constraints the type system cannot express.
    ///
    /// # Errors
    /// * `ConfigError::InvalidValue` when `batch_size` is zero or a
    ///   configured `max_entries_per_file` is zero
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "batch_size".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        if self.max_entries_per_file == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "max_entries_per_file".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/* ========================= Default value functions ========================= */

fn default_batch_size() -> usize {
    100
}

fn default_true() -> bool {
    true
}

fn default_row_delimiter() -> String {
    "\r\n".to_string()
}

fn default_cell_delimiter() -> String {
    ",".to_string()
}

fn default_enclosure() -> String {
    "\"".to_string()
}

fn default_base_path() -> PathBuf {
    std::env::temp_dir().join("csvgrid")
}

fn default_file_base_name() -> String {
    "data".to_string()
}
