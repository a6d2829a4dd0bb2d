use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the failure cases that can occur while loading the
/// checklist catalog, recording status, or producing reports.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when the catalog workbook does not exist at the configured path.
    #[error("catalog workbook not found: {0}")]
    CatalogUnavailable(PathBuf),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("catalog read error: {0}")]
    CatalogRead(#[from] calamine::XlsxError),

    /// Raised when the catalog sheet does not follow the expected layout.
    #[error("invalid catalog layout: {0}")]
    CatalogParse(String),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Raised when the status database cannot be opened or its lock is poisoned.
    #[error("status store unavailable: {0}")]
    StoreUnavailable(String),

    /// Raised when a status store query fails.
    #[error("status store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// Raised when the PDF report cannot be assembled.
    #[error("report rendering failed: {0}")]
    Render(String),

    /// Raised when a request carries missing or malformed fields.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Raised when a multipart evidence upload cannot be read.
    #[error("evidence upload failed: {0}")]
    Upload(String),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
