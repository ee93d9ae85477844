//! HTML table renderer.
//!
//! Output is self-contained: a `<style>` block followed by one `<table>`,
//! no external references, so it survives a copy/paste into a word
//! processor.
//!
//! ```text
//! <style>…</style>
//! <table class="psm-table">
//!   <thead>  band row (colspan) + column row, or a single column row
//!   <tbody>  data rows; group rows as one full-width cell;
//!            spanned label cells carry rowspan
//! </table>
//! ```

pub mod style;

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};
use crate::models::{FormattingOptions, GroupedTable, RowSpan, SpanMap};
use crate::transform::grouper::is_group_label;

pub use style::{style_block, GROUP_ROW_CLASS, TABLE_CLASS};

/// Markup plus the error that blanked it, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rendered {
    pub html: String,
    pub error: Option<String>,
}

impl Rendered {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Render with failures caught: on error the markup is empty and the
/// message is surfaced in [`Rendered::error`].
///
/// Rows whose cell in `label_column` matches one of `group_row_labels`
/// render as group rows, as do rows flagged as separators. With no label
/// column only separator rows are group rows.
pub fn render<S: AsRef<str>>(
    grouped: &GroupedTable,
    spans: Option<&SpanMap>,
    options: &FormattingOptions,
    group_row_labels: &[S],
    label_column: Option<usize>,
) -> Rendered {
    match try_render(grouped, spans, options, group_row_labels, label_column) {
        Ok(html) => Rendered { html, error: None },
        Err(e) => Rendered {
            html: String::new(),
            error: Some(e.to_string()),
        },
    }
}

/// Render `grouped` to markup, or report why it cannot be rendered.
pub fn try_render<S: AsRef<str>>(
    grouped: &GroupedTable,
    spans: Option<&SpanMap>,
    options: &FormattingOptions,
    group_row_labels: &[S],
    label_column: Option<usize>,
) -> RenderResult<String> {
    let table = &grouped.table;
    let width = table.width();

    if let Some(map) = spans {
        if map.spans.len() != table.len() {
            return Err(RenderError::SpanMismatch {
                spans: map.spans.len(),
                rows: table.len(),
            });
        }
        if map.column >= width && !table.is_empty() {
            return Err(RenderError::SpanColumnOutOfRange {
                column: map.column,
                width,
            });
        }
    }
    if grouped.is_banded() {
        let covered: usize = grouped.bands.iter().map(|b| b.span).sum();
        if covered != width {
            return Err(RenderError::BandMismatch { covered, width });
        }
    }

    let mut html = style_block(options);
    html.push_str(&format!("<table class=\"{}\">\n", TABLE_CLASS));
    render_header(&mut html, grouped);
    html.push_str("<tbody>\n");

    let mut open_span = 0usize;
    for (i, row) in table.rows.iter().enumerate() {
        let label_cell = label_column.and_then(|col| row.cells.get(col)).map(|c| c.to_string());
        let is_group = row.separator
            || label_cell
                .as_deref()
                .is_some_and(|c| is_group_label(c, group_row_labels));

        if is_group {
            if open_span > 0 {
                return Err(RenderError::GroupRowInsideSpan { row: i });
            }
            let label = label_cell
                .filter(|s| !s.trim().is_empty())
                .or_else(|| {
                    row.cells
                        .iter()
                        .map(|c| c.to_string())
                        .find(|s| !s.trim().is_empty())
                })
                .unwrap_or_default();
            html.push_str(&format!(
                "<tr class=\"{}\"><td colspan=\"{}\">{}</td></tr>\n",
                GROUP_ROW_CLASS,
                width.max(1),
                escape_html(&label)
            ));
            continue;
        }

        html.push_str("<tr>");
        for (col, cell) in row.cells.iter().enumerate() {
            let span = spans
                .filter(|m| m.column == col)
                .map(|m| m.spans[i])
                .unwrap_or(RowSpan::Lead(1));
            match span {
                RowSpan::Covered => continue,
                RowSpan::Lead(n) if n > 1 => {
                    open_span = n;
                    html.push_str(&format!(
                        "<td rowspan=\"{}\">{}</td>",
                        n,
                        escape_html(&cell.to_string())
                    ));
                }
                RowSpan::Lead(_) => {
                    html.push_str(&format!("<td>{}</td>", escape_html(&cell.to_string())));
                }
            }
        }
        html.push_str("</tr>\n");
        open_span = open_span.saturating_sub(1);
    }

    html.push_str("</tbody>\n</table>\n");
    Ok(html)
}

fn render_header(html: &mut String, grouped: &GroupedTable) {
    let header = &grouped.table.header;
    html.push_str("<thead>\n");

    if !grouped.is_banded() {
        html.push_str("<tr>");
        for name in header {
            html.push_str(&format!("<th>{}</th>", escape_html(name)));
        }
        html.push_str("</tr>\n</thead>\n");
        return;
    }

    // Band row: unbanded columns span both header rows.
    let mut band_row = String::from("<tr>");
    let mut sub_row = String::from("<tr>");
    let mut col = 0;
    for band in &grouped.bands {
        let members = &header[col..col + band.span];
        if band.label.is_empty() {
            for name in members {
                band_row.push_str(&format!("<th rowspan=\"2\">{}</th>", escape_html(name)));
            }
        } else {
            band_row.push_str(&format!(
                "<th colspan=\"{}\">{}</th>",
                band.span,
                escape_html(&band.label)
            ));
            for name in members {
                sub_row.push_str(&format!("<th>{}</th>", escape_html(name)));
            }
        }
        col += band.span;
    }
    html.push_str(&band_row);
    html.push_str("</tr>\n");
    html.push_str(&sub_row);
    html.push_str("</tr>\n</thead>\n");
}

/// Escape text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
