//! Row and column grouping.
//!
//! # Row groups
//!
//! ```text
//! positions {0, 3}            output
//! ┌──────┐                    ┌──────────────┐
//! │ r0   │                    │ Demographics │  <- separator
//! │ r1   │                    │ r0           │
//! │ r2   │         →          │ r1           │
//! │ r3   │                    │ r2           │
//! │ r4   │                    │ Labs         │  <- separator
//! └──────┘                    │ r3           │
//!                             │ r4           │
//!                             └──────────────┘
//! ```
//!
//! # Column bands
//!
//! ```text
//! │ Name │ Before: Mean │ Before: SD │ After: Mean │
//!    ↓
//! │      │ Before Matching           │ After Matching │
//! │ Name │ Before: Mean │ Before: SD │ After: Mean    │
//! ```

use crate::models::{Band, BandToken, CleanTable, GroupedTable, Row, SeparatorRow};

/// Insert labeled separator rows before the given original row positions.
///
/// Built in one pass over the original rows, so earlier insertions never
/// shift later positions. A position equal to the row count appends; larger
/// positions are ignored. The label goes in `label_column` (first column if
/// unknown); other cells are empty.
pub fn insert_separator_rows(table: &CleanTable, separators: &[SeparatorRow], label_column: &str) -> CleanTable {
    let mut sorted: Vec<&SeparatorRow> = separators
        .iter()
        .filter(|s| s.position <= table.len())
        .collect();
    sorted.sort_by_key(|s| s.position);

    let width = table.width();
    let label_col = table.column_index(label_column).unwrap_or(0);
    let mut pending = sorted.into_iter().peekable();
    let mut rows = Vec::with_capacity(table.len() + separators.len());

    for position in 0..=table.len() {
        while let Some(sep) = pending.next_if(|s| s.position == position) {
            rows.push(Row::separator(width, label_col, &sep.label));
        }
        if let Some(row) = table.rows.get(position) {
            rows.push(row.clone());
        }
    }

    CleanTable {
        header: table.header.clone(),
        rows,
    }
}

/// Flag rows whose label cell matches one of `labels` (trimmed,
/// case-insensitive) as group rows.
pub fn mark_group_rows<S: AsRef<str>>(table: &CleanTable, labels: &[S], label_column: &str) -> CleanTable {
    let mut out = table.clone();
    let Some(col) = table.column_index(label_column) else {
        return out;
    };

    for row in &mut out.rows {
        if is_group_label(&row.cells[col].to_string(), labels) {
            row.separator = true;
        }
    }

    out
}

/// Trimmed, case-insensitive label match.
pub fn is_group_label<S: AsRef<str>>(value: &str, labels: &[S]) -> bool {
    let value = value.trim().to_lowercase();
    !value.is_empty()
        && labels
            .iter()
            .any(|l| l.as_ref().trim().to_lowercase() == value)
}

/// Split columns into bands by name tokens.
///
/// The first `excluded_prefix_count` columns are never banded. Each other
/// column joins the first token it contains; columns matching nothing get an
/// empty band label. Adjacent columns with the same label share one band.
pub fn group_columns_by_token(table: &CleanTable, band_tokens: &[BandToken], excluded_prefix_count: usize) -> GroupedTable {
    let mut bands: Vec<Band> = Vec::new();

    for (i, name) in table.header.iter().enumerate() {
        let label = if i < excluded_prefix_count {
            ""
        } else {
            band_tokens
                .iter()
                .find(|t| !t.token.is_empty() && name.contains(&t.token))
                .map(|t| t.label.as_str())
                .unwrap_or("")
        };

        match bands.last_mut() {
            Some(band) if band.label == label => band.span += 1,
            _ => bands.push(Band {
                label: label.to_string(),
                span: 1,
            }),
        }
    }

    GroupedTable {
        table: table.clone(),
        bands,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn five_rows() -> CleanTable {
        let rows = (0..5)
            .map(|i| Row::from_texts(&[format!("r{}", i), i.to_string()]))
            .collect();
        CleanTable::new(vec!["Characteristic Name".into(), "Mean".into()], rows)
    }

    fn sep(position: usize, label: &str) -> SeparatorRow {
        SeparatorRow {
            position,
            label: label.to_string(),
        }
    }

    #[test]
    fn test_separator_positions_account_for_shift() {
        let out = insert_separator_rows(
            &five_rows(),
            &[sep(3, "Labs"), sep(0, "Demographics")],
            "Characteristic Name",
        );

        assert_eq!(out.len(), 7);
        let separators: Vec<usize> = out
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.separator)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(separators, vec![0, 4]);
        assert_eq!(
            out.column_texts("Characteristic Name"),
            vec!["Demographics", "r0", "r1", "r2", "Labs", "r3", "r4"]
        );
        assert_eq!(out.texts()[4], vec!["Labs", ""]);
    }

    #[test]
    fn test_separator_append_and_out_of_range() {
        let out = insert_separator_rows(
            &five_rows(),
            &[sep(5, "Footer"), sep(9, "Ignored")],
            "Characteristic Name",
        );

        assert_eq!(out.len(), 6);
        assert!(out.rows[5].separator);
        assert_eq!(out.texts()[5][0], "Footer");
    }

    #[test]
    fn test_mark_group_rows() {
        let table = CleanTable::from_texts(
            &["Characteristic Name", "Mean"],
            &[vec![" demographics ", ""], vec!["Age", "45"]],
        );
        let out = mark_group_rows(&table, &["Demographics"], "Characteristic Name");

        assert!(out.rows[0].separator);
        assert!(!out.rows[1].separator);
    }

    #[test]
    fn test_group_columns_by_token() {
        let table = CleanTable::from_texts(
            &[
                "Characteristic Name",
                "Cohort 1 Before: Mean",
                "Cohort 2 Before: Mean",
                "Before: p-Value",
                "Cohort 1 After: Mean",
                "After: p-Value",
                "Notes",
            ],
            &[],
        );
        let tokens = vec![
            BandToken::new("Before", "Before Matching"),
            BandToken::new("After", "After Matching"),
        ];
        let grouped = group_columns_by_token(&table, &tokens, 1);

        assert_eq!(
            grouped.bands,
            vec![
                Band { label: "".into(), span: 1 },
                Band { label: "Before Matching".into(), span: 3 },
                Band { label: "After Matching".into(), span: 2 },
                Band { label: "".into(), span: 1 },
            ]
        );
        assert!(grouped.is_banded());
    }

    #[test]
    fn test_prefix_columns_excluded() {
        let table = CleanTable::from_texts(&["Before", "Before: Mean"], &[]);
        let grouped = group_columns_by_token(&table, &[BandToken::new("Before", "B")], 1);
        assert_eq!(grouped.bands[0], Band { label: "".into(), span: 1 });
        assert_eq!(grouped.bands[1], Band { label: "B".into(), span: 1 });
    }
}
