//! Collapse repeated adjacent labels into blanks or row spans.

use crate::models::{Cell, CleanTable, CollapseMode, RowSpan, SpanMap};

/// Collapse runs of identical non-empty values in `column_name`.
///
/// - `Blank`: a value equal to the previous row's value becomes empty.
/// - `Span`: the first row of each run gets `Lead(run length)`, the rest are
///   `Covered` and blanked in the returned table.
///
/// Empty values never continue a run, and separator rows always end one.
/// An unknown column returns the table unchanged with a trivial span map.
pub fn collapse_repeated(table: &CleanTable, column_name: &str, mode: CollapseMode) -> (CleanTable, SpanMap) {
    let Some(col) = table.column_index(column_name) else {
        return (table.clone(), SpanMap::trivial(0, table.len()));
    };

    let spans = compute_spans(table, col);
    let mut out = table.clone();

    for (row, span) in out.rows.iter_mut().zip(&spans) {
        if *span == RowSpan::Covered {
            row.cells[col] = Cell::empty();
        }
    }

    let spans = match mode {
        CollapseMode::Span => spans,
        CollapseMode::Blank => vec![RowSpan::Lead(1); table.len()],
    };

    (out, SpanMap { column: col, spans })
}

/// Run lengths of identical non-empty values in column `col`.
fn compute_spans(table: &CleanTable, col: usize) -> Vec<RowSpan> {
    let mut spans = vec![RowSpan::Lead(1); table.len()];
    let mut run_start: Option<usize> = None;

    for (i, row) in table.rows.iter().enumerate() {
        let cell = &row.cells[col];

        let continues = match run_start {
            Some(start) => {
                !row.separator
                    && !cell.is_empty()
                    && cell.to_string() == table.rows[start].cells[col].to_string()
            }
            None => false,
        };

        if continues {
            if let Some(start) = run_start {
                if let RowSpan::Lead(n) = &mut spans[start] {
                    *n += 1;
                }
            }
            spans[i] = RowSpan::Covered;
        } else if row.separator || cell.is_empty() {
            run_start = None;
        } else {
            run_start = Some(i);
        }
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(values: &[&str]) -> CleanTable {
        CleanTable::from_texts(
            &["Characteristic Name", "Mean"],
            &values.iter().map(|v| vec![*v, "1"]).collect::<Vec<_>>(),
        )
    }

    #[test]
    fn test_blank_mode() {
        let (out, spans) = collapse_repeated(
            &labels(&["A", "A", "B", "B", "B"]),
            "Characteristic Name",
            CollapseMode::Blank,
        );

        assert_eq!(out.column_texts("Characteristic Name"), vec!["A", "", "B", "", ""]);
        assert!(!spans.has_merges());
    }

    #[test]
    fn test_span_mode() {
        let (out, spans) = collapse_repeated(
            &labels(&["A", "A", "B", "B", "B"]),
            "Characteristic Name",
            CollapseMode::Span,
        );

        assert_eq!(
            spans.spans,
            vec![
                RowSpan::Lead(2),
                RowSpan::Covered,
                RowSpan::Lead(3),
                RowSpan::Covered,
                RowSpan::Covered
            ]
        );
        assert_eq!(spans.total(), 5);
        assert_eq!(out.column_texts("Characteristic Name"), vec!["A", "", "B", "", ""]);
    }

    #[test]
    fn test_empty_values_never_merge() {
        let (out, spans) = collapse_repeated(
            &labels(&["A", "", "", "A"]),
            "Characteristic Name",
            CollapseMode::Span,
        );

        assert_eq!(spans.spans, vec![RowSpan::Lead(1); 4]);
        assert_eq!(out.column_texts("Characteristic Name"), vec!["A", "", "", "A"]);
    }

    #[test]
    fn test_blank_mode_empty_value_ends_run() {
        let (out, spans) = collapse_repeated(
            &labels(&["A", "", "A", "A", "", ""]),
            "Characteristic Name",
            CollapseMode::Blank,
        );

        assert_eq!(
            out.column_texts("Characteristic Name"),
            vec!["A", "", "A", "", "", ""]
        );
        assert_eq!(spans.spans, vec![RowSpan::Lead(1); 6]);
    }

    #[test]
    fn test_separator_breaks_run() {
        let mut table = labels(&["A", "A", "A"]);
        table.rows[1].separator = true;

        let (out, spans) = collapse_repeated(&table, "Characteristic Name", CollapseMode::Span);

        assert_eq!(spans.spans, vec![RowSpan::Lead(1); 3]);
        assert_eq!(out, table);
    }

    #[test]
    fn test_unknown_column_and_empty_table() {
        let table = labels(&["A", "A"]);
        let (out, spans) = collapse_repeated(&table, "Nope", CollapseMode::Span);
        assert_eq!(out, table);
        assert_eq!(spans.total(), 2);

        let (out, spans) = collapse_repeated(&labels(&[]), "Characteristic Name", CollapseMode::Span);
        assert!(out.is_empty());
        assert!(spans.spans.is_empty());
    }
}
