//! Word-processor document sink.
//!
//! Emits an HTML document that Word and LibreOffice open natively as a
//! `.doc`: one heading and a gridded table, every cell carrying the
//! requested font size and alignment.

use crate::error::ExportResult;
use crate::models::{CleanTable, HorizontalAlign};
use crate::render::escape_html;

use super::ExportSink;

const HEADING: &str = "Formatted Table";

#[derive(Debug, Clone, Copy, Default)]
pub struct WordDocumentSink;

impl ExportSink for WordDocumentSink {
    fn export(&self, table: &CleanTable, font_size: u32, align: HorizontalAlign) -> ExportResult<Vec<u8>> {
        let cell_style = format!(
            "border: 1px solid #000; padding: 2pt 4pt; font-size: {}pt; text-align: {};",
            font_size,
            align.as_css()
        );
        let width = table.width().max(1);

        let mut doc = String::new();
        doc.push_str(
            "<html xmlns:o=\"urn:schemas-microsoft-com:office:office\" \
             xmlns:w=\"urn:schemas-microsoft-com:office:word\" \
             xmlns=\"http://www.w3.org/TR/REC-html40\">\n",
        );
        doc.push_str("<head>\n<meta charset=\"utf-8\">\n");
        doc.push_str(&format!("<title>{}</title>\n", HEADING));
        doc.push_str(
            "<style>\nbody { font-family: Calibri, Arial, sans-serif; }\n\
             table { border-collapse: collapse; }\n</style>\n",
        );
        doc.push_str("</head>\n<body>\n");
        doc.push_str(&format!("<h1>{}</h1>\n", HEADING));
        doc.push_str("<table>\n<tr>");
        for name in &table.header {
            doc.push_str(&format!(
                "<th style=\"{}\">{}</th>",
                cell_style,
                escape_html(name)
            ));
        }
        doc.push_str("</tr>\n");

        for row in &table.rows {
            doc.push_str("<tr>");
            if row.separator {
                let label = row.texts().into_iter().find(|t| !t.trim().is_empty()).unwrap_or_default();
                doc.push_str(&format!(
                    "<td colspan=\"{}\" style=\"{} font-weight: bold;\">{}</td>",
                    width,
                    cell_style,
                    escape_html(&label)
                ));
            } else {
                for cell in &row.cells {
                    doc.push_str(&format!(
                        "<td style=\"{}\">{}</td>",
                        cell_style,
                        escape_html(&cell.to_string())
                    ));
                }
            }
            doc.push_str("</tr>\n");
        }
        doc.push_str("</table>\n</body>\n</html>\n");

        Ok(doc.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Row;

    #[test]
    fn test_document_layout() {
        let mut table = CleanTable::from_texts(
            &["Characteristic Name", "Before: p-Value"],
            &[vec!["Age", "p<.001"]],
        );
        table.rows.insert(0, Row::separator(2, 0, "Demographics"));

        let bytes = WordDocumentSink.export(&table, 12, HorizontalAlign::Right).unwrap();
        let doc = String::from_utf8(bytes).unwrap();

        assert!(doc.contains("<h1>Formatted Table</h1>"));
        assert!(doc.contains("font-size: 12pt; text-align: right;"));
        assert!(doc.contains(">Before: p-Value</th>"));
        assert!(doc.contains(">p&lt;.001</td>"));
        assert!(doc.contains("colspan=\"2\""));
        assert!(doc.contains(">Demographics</td>"));
    }
}
