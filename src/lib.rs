//! Streaming CSV Export Library
//!
//! This library streams tabular data from a paginated or cursor-backed data
//! source into one or more CSV files, optionally bundling multiple output
//! files into a single ZIP archive, while keeping memory usage bounded
//! regardless of total row count.
//!
//! # Modules
//!
//! - `column`: Column definitions, shorthand specs and resolution
//! - `config`: Configuration management
//! - `error`: Error types and handling
//! - `export`: Encoder, output files, result handling and the pipeline
//! - `format`: Value formatting and label derivation contracts
//! - `source`: Batched data source abstractions
//!
//! # Example
//!
//! ```no_run
//! use csvgrid::{CsvGrid, Result, SerialColumn};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let rows = vec![
//!         json!({"id": 1, "name": "Alice", "joined": "2024-01-05"}),
//!         json!({"id": 2, "name": "Bob", "joined": "2024-03-17"}),
//!     ];
//!
//!     let mut result = CsvGrid::new()
//!         .with_column(SerialColumn::new())
//!         .with_column("name")
//!         .with_column("joined:date:Member Since")
//!         .with_rows(rows)
//!         .export()
//!         .await?;
//!
//!     result.save_as("members.csv", true).await?;
//!     Ok(())
//! }
//! ```

pub mod column;
pub mod config;
pub mod error;
pub mod export;
pub mod format;
pub mod source;

// Re-export commonly used types
pub use column::{Column, ColumnSpec, DataColumn, GenericColumn, SerialColumn};
pub use config::{BomConfig, CsvFileConfig, ExportConfig, ResultConfig};
pub use error::{ExportError, Result};
pub use export::{Archiver, CsvFile, CsvGrid, ExportResult, RowEncoder, ZipArchiver};
pub use format::{LabelSource, RawFormatter, ValueFormatter};
pub use source::{Batch, BatchCursor, PaginatedProvider, Pagination, RowStream, VecProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
///
/// # Returns
/// * `&str` - Version string
pub fn version() -> &'static str {
    VERSION
}
