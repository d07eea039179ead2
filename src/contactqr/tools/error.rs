use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the different failure cases that can occur when the
/// tool reads a contact list or emits vCard, QR, and workbook files.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures that are not tied to a specific output file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when an input file (contact list or vCard) does not exist.
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    /// Raised when a vCard file has no content to encode.
    #[error("empty vCard file: {0}")]
    EmptyFile(PathBuf),

    /// Raised when a list row is too short to hold every expected column.
    #[error("malformed row at line {line}: expected {expected} columns, found {found}")]
    MalformedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// Raised when a contact marked as custom has no hand-written vCard.
    #[error("custom vCard file is missing: {0}")]
    CustomFileMissing(PathBuf),

    /// Raised when an output file cannot be written.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Raised when the QR encoder rejects the payload.
    #[error("QR encode error: {0}")]
    Encode(String),

    /// Errors bubbled up from the PNG encoder.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Errors bubbled up from the delimited list reader.
    #[error("list read error: {0}")]
    Csv(#[from] csv::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Raised when JSON serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when a vCard path has no file stem to derive the PNG name from.
    #[error("invalid vCard file name: {0}")]
    InvalidVCardPath(PathBuf),

    /// Raised when the tracing filter cannot be built.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl ToolError {
    /// Wraps an IO failure with the path that was being written.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ToolError::Write {
            path: path.into(),
            source,
        }
    }
}
