//! Error types for the pdfgrid converter pipeline.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Primary error type for converter invocation and envelope parsing.
///
/// Table reconstruction itself never fails; see [`TableError`] for the
/// configuration checks callers may run up front.
#[derive(Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed converter output: {0}")]
    MalformedOutput(String),

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("{tool} did not finish within {timeout:?}")]
    Timeout { tool: String, timeout: Duration },

    #[error("channel: {0}")]
    Diagnostic(String),

    #[error("cannot check version of {0}")]
    VersionUnavailable(String),

    #[error("cannot parse version {0:?}")]
    VersionParse(String),

    #[error("version {version} does not pass the version constraint {range}")]
    UnsupportedVersion { version: String, range: String },

    #[error("failed to remove {}: {source}", path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience Result type alias for [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration problems detected by `TableExtractionConfig::validate`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("table needs at least one column")]
    NoColumns,

    #[error("{available} column positions configured for {expected} columns")]
    ColumnCountMismatch { expected: usize, available: usize },

    #[error("column tolerance must be positive, got {0}")]
    NonPositiveColumnTolerance(i32),

    #[error("row height tolerance must not be negative, got {0}")]
    NegativeRowTolerance(i32),

    #[error("column range {index} is inverted ({from} > {to})")]
    InvertedRange { index: usize, from: i32, to: i32 },

    #[error("vertical range is inverted ({from} > {to})")]
    InvertedVerticalRange { from: i32, to: i32 },
}
