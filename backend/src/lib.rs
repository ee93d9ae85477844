//! # psmtable - publication tables from TriNetX PSM exports
//!
//! Turns the CSV a clinical-research platform exports after propensity score
//! matching into a formatted characteristics table: banner rows dropped,
//! numbers rounded, tiny p-values shown as `p<.001`, repeated labels merged,
//! optional group rows and column bands. The result is previewed as
//! self-contained HTML and exported as CSV, a Word document, or PDF.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────┐   ┌───────────┐   ┌──────────┐   ┌──────────┐
//! │ CSV bytes │──▶│  Parser  │──▶│ Extractor │──▶│ Pipeline │──▶│ Renderer │
//! │ (any enc) │   │(auto-enc)│   │ (header)  │   │ (stages) │   │  (HTML)  │
//! └───────────┘   └──────────┘   └───────────┘   └────┬─────┘   └──────────┘
//!                                                     ▼
//!                                              ┌──────────────┐
//!                                              │ CSV/DOC/PDF  │
//!                                              └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use psmtable::{run_file, ExportFormat, PipelineOptions};
//!
//! let options = PipelineOptions::default();
//! let output = run_file("export.csv", &options)?;
//! std::fs::write("table.html", &output.rendered.html)?;
//! std::fs::write("table.pdf", output.export(ExportFormat::Pdf, &options.export)?)?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per stage
//! - [`models`] - Tables, spans, bands and options
//! - [`parser`] - CSV parsing with encoding/delimiter detection
//! - [`transform`] - Extraction, formatting, grouping, pipeline
//! - [`render`] - HTML preview
//! - [`export`] - CSV, document and PDF sinks
//! - [`validation`] - Options JSON Schema
//! - [`config`] - Server settings
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Output
pub mod export;
pub mod render;

// Validation
pub mod validation;

// HTTP API
pub mod api;
pub mod config;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ExportError, ExtractError, OptionsError, ParseError, PipelineError, RenderError, ServerError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    Cell, CleanTable, CollapseMode, ColumnSpec, ExportOptions, ExtractMode, FormattingOptions,
    GroupSpec, GroupedTable, HorizontalAlign, PipelineOptions, RawSheet, Row, RowSpan,
    SheetInfo, SpanMap, StylePreset, VerticalAlign,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use export::{ExportFormat, ExportSink};
pub use parser::{parse_bytes_auto, parse_file_auto};
pub use render::{render, Rendered};
pub use transform::pipeline::{export_table, format_table, run, run_bytes, run_file, PipelineOutput};
pub use validation::parse_options;

// =============================================================================
// Re-exports - Server
// =============================================================================

pub use api::server;
pub use config::ServerConfig;
