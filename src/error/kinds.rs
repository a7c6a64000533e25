use std::{fmt, io};

/// Crate-wide `Result` type using [`ExportError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Top-level error type for export operations.
///
/// This type wraps more specific error kinds and provides a single
/// error type that can be used throughout the crate.
#[derive(Debug)]
pub enum ExportError {
    /// I/O errors: file or directory creation, writes, metadata lookups.
    ///
    /// Never retried internally; the caller decides the retry policy.
    Io(io::Error),

    /// Configuration errors, raised before any I/O takes place.
    Config(ConfigError),

    /// Resource errors from archive strategies and artifact resolution.
    Resource(ResourceError),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// A column shorthand string does not match `attribute[:format[:label]]`.
    InvalidColumnFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },

    /// Neither a row stream nor a paginated provider was configured.
    MissingSource,

    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),
}

/// Resource-specific errors.
#[derive(Debug)]
pub enum ResourceError {
    /// Archive strategy failed to produce an artifact.
    ArchiveFailed(String),

    /// The export produced no output files, so there is no artifact.
    NoOutputFiles,
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Io(e) => write!(f, "I/O error: {e}"),
            ExportError::Config(e) => write!(f, "Configuration error: {e}"),
            ExportError::Resource(e) => write!(f, "Resource error: {e}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidColumnFormat(spec) => {
                write!(f, "Invalid column format: '{spec}'")
            }
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
            ConfigError::MissingSource => {
                write!(f, "No data source configured: set a row stream or a paginated provider")
            }
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
        }
    }
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::ArchiveFailed(msg) => write!(f, "Failed to create archive: {msg}"),
            ResourceError::NoOutputFiles => write!(f, "Export produced no output files"),
        }
    }
}

impl std::error::Error for ExportError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for ResourceError {}

/* ========================= Conversions to ExportError ========================= */

impl From<io::Error> for ExportError {
    fn from(err: io::Error) -> Self {
        ExportError::Io(err)
    }
}

impl From<ConfigError> for ExportError {
    fn from(err: ConfigError) -> Self {
        ExportError::Config(err)
    }
}

impl From<ResourceError> for ExportError {
    fn from(err: ResourceError) -> Self {
        ExportError::Resource(err)
    }
}
