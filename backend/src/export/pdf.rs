//! Paginated PDF sink built with `lopdf`.
//!
//! ```text
//! ┌───────────────── A4 portrait ─────────────────┐
//! │ margin                                        │
//! │ ┌──────────┬──────────┬──────────┐            │
//! │ │ header   │ header   │ header   │ <- every page
//! │ ├──────────┼──────────┼──────────┤            │
//! │ │ cell     │ cell     │ cell     │ row height = font + 6pt
//! │ ├──────────┴──────────┴──────────┤            │
//! │ │ group row (full width)         │            │
//! │ └────────────────────────────────┘            │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! Text is set in the standard Helvetica font with WinAnsi encoding, so no
//! font file is embedded. Cell text that would overflow its column is cut
//! and suffixed with `..`.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::error::{ExportError, ExportResult};
use crate::models::{CleanTable, HorizontalAlign};

use super::ExportSink;

/// Approximate Helvetica advance width, in ems.
const AVG_CHAR_WIDTH: f32 = 0.5;
/// Horizontal padding inside each cell, in points.
const CELL_PADDING: f32 = 2.0;

#[derive(Debug, Clone, Copy)]
pub struct PdfSink {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
}

impl Default for PdfSink {
    fn default() -> Self {
        Self {
            page_width: 595.0,
            page_height: 842.0,
            margin: 36.0,
        }
    }
}

impl ExportSink for PdfSink {
    fn export(&self, table: &CleanTable, font_size: u32, align: HorizontalAlign) -> ExportResult<Vec<u8>> {
        if table.width() == 0 {
            return Err(ExportError::NoColumns);
        }

        let layout = Layout::new(self, table.width(), font_size as f32);
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut page_ids: Vec<Object> = Vec::new();
        let chunks: Vec<_> = if table.rows.is_empty() {
            vec![&table.rows[..]]
        } else {
            table.rows.chunks(layout.rows_per_page).collect()
        };

        for chunk in chunks {
            let mut ops = Vec::new();
            let mut y = self.page_height - self.margin - layout.row_height;

            layout.draw_row(&mut ops, &table.header, y, align);
            for row in chunk {
                y -= layout.row_height;
                if row.separator {
                    let label = row.texts().into_iter().find(|t| !t.trim().is_empty()).unwrap_or_default();
                    layout.draw_group_row(&mut ops, &label, y);
                } else {
                    layout.draw_row(&mut ops, &row.texts(), y, align);
                }
            }

            let content = Content { operations: ops };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = add_page(&mut doc, pages_id, content_id);
            page_ids.push(page_id.into());
        }

        let count = page_ids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(self.page_width),
                Object::Real(self.page_height),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        Ok(bytes)
    }
}

fn add_page(doc: &mut Document, pages_id: ObjectId, content_id: ObjectId) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    })
}

/// Geometry shared by every page.
struct Layout {
    left: f32,
    column_width: f32,
    row_height: f32,
    font_size: f32,
    rows_per_page: usize,
    columns: usize,
}

impl Layout {
    fn new(sink: &PdfSink, columns: usize, font_size: f32) -> Self {
        let usable_width = sink.page_width - 2.0 * sink.margin;
        let usable_height = sink.page_height - 2.0 * sink.margin;
        let row_height = font_size + 6.0;
        // One slot per page goes to the repeated header.
        let rows_per_page = ((usable_height / row_height).floor() as usize).saturating_sub(1).max(1);

        Self {
            left: sink.margin,
            column_width: usable_width / columns as f32,
            row_height,
            font_size,
            rows_per_page,
            columns,
        }
    }

    fn draw_row<S: AsRef<str>>(&self, ops: &mut Vec<Operation>, cells: &[S], y: f32, align: HorizontalAlign) {
        for (i, text) in cells.iter().enumerate().take(self.columns) {
            let x = self.left + i as f32 * self.column_width;
            self.draw_cell(ops, text.as_ref(), x, y, self.column_width, align);
        }
    }

    fn draw_group_row(&self, ops: &mut Vec<Operation>, label: &str, y: f32) {
        let width = self.column_width * self.columns as f32;
        self.draw_cell(ops, label, self.left, y, width, HorizontalAlign::Left);
    }

    fn draw_cell(&self, ops: &mut Vec<Operation>, text: &str, x: f32, y: f32, width: f32, align: HorizontalAlign) {
        ops.push(Operation::new(
            "re",
            vec![
                Object::Real(x),
                Object::Real(y),
                Object::Real(width),
                Object::Real(self.row_height),
            ],
        ));
        ops.push(Operation::new("S", vec![]));

        let text = fit_text(text, width - 2.0 * CELL_PADDING, self.font_size);
        if text.is_empty() {
            return;
        }

        let text_width = text.chars().count() as f32 * self.font_size * AVG_CHAR_WIDTH;
        let tx = match align {
            HorizontalAlign::Left => x + CELL_PADDING,
            HorizontalAlign::Center => x + (width - text_width) / 2.0,
            HorizontalAlign::Right => x + width - CELL_PADDING - text_width,
        };
        let ty = y + (self.row_height - self.font_size) / 2.0 + self.font_size * 0.2;

        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec!["F1".into(), Object::Real(self.font_size)],
        ));
        ops.push(Operation::new("Td", vec![Object::Real(tx), Object::Real(ty)]));
        ops.push(Operation::new(
            "Tj",
            vec![Object::string_literal(win_ansi(&text))],
        ));
        ops.push(Operation::new("ET", vec![]));
    }
}

/// WinAnsi bytes for the Helvetica font. Characters outside the code page
/// get an ASCII spelling (`≥` as `>=`) or `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for c in text.chars() {
        let (bytes, _, unmappable) = encoding_rs::WINDOWS_1252.encode(c.encode_utf8(&mut buf));
        if unmappable {
            out.extend_from_slice(ascii_fallback(c).as_bytes());
        } else {
            out.extend_from_slice(&bytes);
        }
    }
    out
}

fn ascii_fallback(c: char) -> &'static str {
    match c {
        '≥' => ">=",
        '≤' => "<=",
        '≠' => "!=",
        '≈' => "~",
        '−' => "-",
        '→' => "->",
        '←' => "<-",
        'α' => "alpha",
        'β' => "beta",
        'χ' => "chi",
        'μ' => "u",
        _ => "?",
    }
}

/// Cut `text` to the characters that fit in `width`, marking cuts with `..`.
fn fit_text(text: &str, width: f32, font_size: f32) -> String {
    let text = text.trim();
    let max_chars = (width / (font_size * AVG_CHAR_WIDTH)).floor().max(0.0) as usize;
    let len = text.chars().count();

    if len <= max_chars {
        return text.to_string();
    }
    if max_chars <= 2 {
        return "..".chars().take(max_chars).collect();
    }
    let mut cut: String = text.chars().take(max_chars - 2).collect();
    cut.push_str("..");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: usize) -> CleanTable {
        let rows: Vec<Vec<String>> = (0..rows)
            .map(|i| vec![format!("Row {}", i), format!("{}.5", i)])
            .collect();
        let header = vec!["Characteristic Name".to_string(), "Mean".to_string()];
        CleanTable::from_texts(&header, &rows)
    }

    #[test]
    fn test_single_page() {
        let bytes = PdfSink::default().export(&table(3), 8, HorizontalAlign::Left).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_paginates() {
        // 770pt usable / 14pt rows = 55 slots, 54 data rows per page
        let bytes = PdfSink::default().export(&table(120), 8, HorizontalAlign::Center).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn test_empty_table_still_has_header_page() {
        let bytes = PdfSink::default().export(&table(0), 8, HorizontalAlign::Left).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_no_columns() {
        let empty = CleanTable::default();
        assert!(matches!(
            PdfSink::default().export(&empty, 8, HorizontalAlign::Left),
            Err(ExportError::NoColumns)
        ));
    }

    #[test]
    fn test_fit_text() {
        assert_eq!(fit_text("Age", 100.0, 10.0), "Age");
        assert_eq!(fit_text("Characteristic Name", 30.0, 10.0), "Char..");
        assert_eq!(fit_text("abc", 5.0, 10.0), ".");
    }

    #[test]
    fn test_win_ansi_fallbacks() {
        assert_eq!(win_ansi("Age ≥ 65"), b"Age >= 65".to_vec());
        assert_eq!(win_ansi("µg/dL – n"), b"\xB5g/dL \x96 n".to_vec());
        assert_eq!(win_ansi("χ² ≠ 0"), b"chi\xB2 != 0".to_vec());
        assert_eq!(win_ansi("漢"), b"?".to_vec());
    }
}
