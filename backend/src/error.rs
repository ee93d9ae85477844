//! Error types for the psmtable pipeline.
//!
//! - [`ParseError`] - reading raw bytes into a sheet
//! - [`ExtractError`] - locating the header row (fatal for an upload)
//! - [`OptionsError`] - invalid pipeline options
//! - [`RenderError`] - markup rendering (caught at the render boundary)
//! - [`ExportError`] - CSV/document/PDF sinks
//! - [`PipelineError`] - top-level orchestration
//! - [`ServerError`] - HTTP layer
//!
//! Conversion is automatic via `From`, so `?` works across stage boundaries.

use thiserror::Error;

// =============================================================================
// Parsing Errors
// =============================================================================

/// Errors while reading an uploaded file into a raw sheet.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed delimited text.
    #[error("Invalid CSV format: {0}")]
    Csv(#[from] csv::Error),

    /// The file contains no rows at all.
    #[error("CSV file is empty")]
    EmptyFile,
}

// =============================================================================
// Extraction Errors
// =============================================================================

/// Errors while locating the data region of a sheet.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// No row's first cell contains the marker.
    #[error("No header row found: no first cell contains '{marker}'")]
    NoHeaderFound { marker: String },

    /// Fewer rows than `skip + 1`.
    #[error("Insufficient rows: skipping {skip} rows needs at least {needed}, found {found}")]
    InsufficientRows {
        skip: usize,
        needed: usize,
        found: usize,
    },
}

// =============================================================================
// Options Errors
// =============================================================================

/// Errors in caller-supplied pipeline options.
#[derive(Debug, Error)]
pub enum OptionsError {
    /// Options JSON is not even valid JSON.
    #[error("Options are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Options violate the options schema.
    #[error("Invalid options: {}", .0.join("; "))]
    Schema(Vec<String>),

    /// Significance column pattern does not compile.
    #[error("Invalid significance column pattern: {0}")]
    Pattern(#[from] regex::Error),
}

// =============================================================================
// Render Errors
// =============================================================================

/// Errors while serializing a table to markup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The span map was computed for a different row count.
    #[error("Span map covers {spans} rows but the table has {rows}")]
    SpanMismatch { spans: usize, rows: usize },

    /// The span map points past the last column.
    #[error("Span column {column} is out of range for {width} columns")]
    SpanColumnOutOfRange { column: usize, width: usize },

    /// Band widths do not add up to the column count.
    #[error("Column bands cover {covered} columns but the table has {width}")]
    BandMismatch { covered: usize, width: usize },

    /// A full-width group row falls inside a row-span run.
    #[error("Group row {row} falls inside a merged cell")]
    GroupRowInsideSpan { row: usize },
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors from export sinks. These propagate to the caller.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization failed.
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    /// PDF assembly failed.
    #[error("PDF export failed: {0}")]
    Pdf(#[from] lopdf::Error),

    /// Writing the output failed.
    #[error("Export IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unknown export format name.
    #[error("Unknown export format: {0}")]
    UnknownFormat(String),

    /// The table has no columns to lay out.
    #[error("Nothing to export: the table has no columns")]
    NoColumns,
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::transform::pipeline::run`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Reading the upload failed.
    #[error("Could not read file: {0}")]
    Parse(#[from] ParseError),

    /// The data region could not be located.
    #[error("Could not parse file: {0}")]
    Extract(#[from] ExtractError),

    /// Invalid options.
    #[error("{0}")]
    Options(#[from] OptionsError),

    /// An export sink failed.
    #[error("{0}")]
    Export(#[from] ExportError),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Binding or serving failed.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for extraction.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Result type for rendering.
pub type RenderResult<T> = Result<T, RenderError>;

/// Result type for export sinks.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // ExtractError -> PipelineError
        let extract_err = ExtractError::NoHeaderFound {
            marker: "Characteristic".into(),
        };
        let pipeline_err: PipelineError = extract_err.into();
        let msg = pipeline_err.to_string();
        assert!(msg.starts_with("Could not parse file"));
        assert!(msg.contains("Characteristic"));

        // ParseError -> PipelineError
        let pipeline_err: PipelineError = ParseError::EmptyFile.into();
        assert!(pipeline_err.to_string().contains("empty"));
    }

    #[test]
    fn test_insufficient_rows_format() {
        let err = ExtractError::InsufficientRows {
            skip: 9,
            needed: 10,
            found: 4,
        };
        let msg = err.to_string();
        assert!(msg.contains("skipping 9"));
        assert!(msg.contains("found 4"));
    }

    #[test]
    fn test_schema_errors_joined() {
        let err = OptionsError::Schema(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "Invalid options: a; b");
    }
}
