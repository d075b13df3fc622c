//! Error types for the sheetinv-core library.

use thiserror::Error;

/// Main error type for the sheetinv library.
#[derive(Error, Debug)]
pub enum SheetinvError {
    /// Problem with the workbook handed to the pipeline.
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// Invoice extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors describing an unusable workbook.
///
/// These are the only conditions the pipeline refuses to work around. Bad cell
/// data never produces one of these.
#[derive(Error, Debug)]
pub enum SourceError {
    /// A sheet was requested by name but the workbook has no such sheet.
    #[error("sheet not found: {0}")]
    SheetNotFound(String),
}

/// Errors raised while turning rows into a single invoice.
///
/// Callers in the transformer convert these into warning strings, so one bad
/// group never aborts a batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// Monetary arithmetic left the representable range.
    #[error("amount overflow while computing {0}")]
    Overflow(&'static str),

    /// The group had no rows to build from.
    #[error("no rows in invoice group")]
    NoData,
}

/// Result type for the sheetinv library.
pub type Result<T> = std::result::Result<T, SheetinvError>;
