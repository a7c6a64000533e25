//! Export pipeline module
//!
//! This module contains the moving parts of an export, leaf-first:
//!
//! 1. **RowEncoder**: delimiter-joined, quote-escaped row text
//! 2. **CsvFile**: one lazily-opened output file with BOM and row-delimiter
//!    handling
//! 3. **ExportResult**: working directory, produced files, archiving, final
//!    artifact
//! 4. **CsvGrid**: the pipeline pulling batches through columns into files
//! 5. **ProgressTracker**: optional progress feedback
//!
//! Data flow: `CsvGrid` pulls batches from the source, the resolved columns
//! render cell rows, `RowEncoder` serializes them, `CsvFile` appends bytes,
//! and `ExportResult` owns everything produced and resolves the final
//! deliverable.

pub mod encoder;
pub mod file;
pub mod pipeline;
pub mod progress;
pub mod result;

pub use encoder::RowEncoder;
pub use file::{BomMode, CsvFile};
pub use pipeline::CsvGrid;
pub use progress::ProgressTracker;
pub use result::{Archiver, ExportResult, ZipArchiver};
