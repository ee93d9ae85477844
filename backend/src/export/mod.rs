//! Export sinks for the final table.
//!
//! | Format     | Sink                 | Extension | MIME                 |
//! |------------|----------------------|-----------|----------------------|
//! | `csv`      | [`CsvSink`]          | `.csv`    | `text/csv`           |
//! | `document` | [`WordDocumentSink`] | `.doc`    | `application/msword` |
//! | `pdf`      | [`PdfSink`]          | `.pdf`    | `application/pdf`    |
//!
//! Sinks take the table as-is: rounding and substitutions happen upstream.

pub mod csv;
pub mod document;
pub mod pdf;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{ExportError, ExportResult};
use crate::models::{CleanTable, ExportOptions, HorizontalAlign, MAX_EXPORT_FONT_SIZE, MIN_FONT_SIZE};

pub use self::csv::CsvSink;
pub use self::document::WordDocumentSink;
pub use self::pdf::PdfSink;

/// Serializes a table to a downloadable file.
pub trait ExportSink {
    fn export(&self, table: &CleanTable, font_size: u32, align: HorizontalAlign) -> ExportResult<Vec<u8>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Document,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Document => "doc",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Document => "application/msword",
            ExportFormat::Pdf => "application/pdf",
        }
    }

    /// Default download name.
    pub fn file_name(self) -> String {
        format!("formatted_table.{}", self.extension())
    }

    fn sink(self) -> Box<dyn ExportSink> {
        match self {
            ExportFormat::Csv => Box::new(CsvSink),
            ExportFormat::Document => Box::new(WordDocumentSink),
            ExportFormat::Pdf => Box::new(PdfSink::default()),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "document" | "doc" | "docx" | "word" => Ok(ExportFormat::Document),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

/// Export `table` in `format`, taking font size and alignment from `options`.
pub fn export(table: &CleanTable, format: ExportFormat, options: &ExportOptions) -> ExportResult<Vec<u8>> {
    let (font_size, align) = match format {
        ExportFormat::Csv => (0, HorizontalAlign::Left),
        ExportFormat::Document => (options.document_font_size, options.document_align),
        ExportFormat::Pdf => (options.pdf_font_size, options.pdf_align),
    };
    format.sink().export(table, clamp_font_size(font_size), align)
}

/// Clamp to the document/PDF font range.
pub(crate) fn clamp_font_size(size: u32) -> u32 {
    size.clamp(MIN_FONT_SIZE, MAX_EXPORT_FONT_SIZE)
}
