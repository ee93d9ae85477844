//! Delimited-text sink.

use crate::error::ExportResult;
use crate::models::{CleanTable, HorizontalAlign};

use super::ExportSink;

/// RFC 4180 CSV, header first, UTF-8. Font size and alignment are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvSink;

impl ExportSink for CsvSink {
    fn export(&self, table: &CleanTable, _font_size: u32, _align: HorizontalAlign) -> ExportResult<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&table.header)?;
        for row in table.texts() {
            writer.write_record(&row)?;
        }
        writer.flush()?;

        writer
            .into_inner()
            .map_err(|e| std::io::Error::other(e.to_string()).into())
    }
}
