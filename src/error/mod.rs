//! Error handling module for export operations.
//!
//! This module provides the error taxonomy used throughout the crate:
//! - I/O errors from file, directory and archive handling
//! - Configuration errors that fail fast before any I/O happens
//! - Resource errors from archive strategies and artifact resolution
//!
//! # Example
//!
//! ```rust,no_run
//! use csvgrid::error::{ExportError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     // Fallible export operations return the crate-wide Result alias
//!     Ok(())
//! }
//! ```

pub mod kinds;

// Re-export commonly used types
pub use kinds::{ConfigError, ExportError, ResourceError, Result};
