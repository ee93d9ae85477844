//! Numeric rounding and p-value display rules.

use regex::Regex;

use crate::models::{Cell, CleanTable};

/// Round every fully numeric column to `decimals` places.
///
/// Column-atomic: a column converts only if every data cell parses as a
/// number. One failing cell leaves the whole column as text. Separator rows
/// are not data and are left alone.
///
/// Rounding is half-to-even on the scaled value.
pub fn round_numeric(table: &CleanTable, decimals: u32) -> CleanTable {
    let mut out = table.clone();

    for col in 0..table.width() {
        let parsed: Option<Vec<(usize, f64)>> = table
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| !row.separator)
            .map(|(i, row)| parse_number(&row.cells[col]).map(|n| (i, n)))
            .collect();

        if let Some(values) = parsed {
            for (i, value) in values {
                out.rows[i].cells[col] = Cell::Number(round_half_even(value, decimals));
            }
        }
    }

    out
}

/// Replace zero cells in matching columns with `replacement`.
///
/// A cell matches when its trimmed display form is exactly `"0"`.
pub fn apply_significance_threshold<F>(table: &CleanTable, predicate: F, replacement: &str) -> CleanTable
where
    F: Fn(&str) -> bool,
{
    let mut out = table.clone();
    let columns: Vec<usize> = (0..table.width())
        .filter(|&i| predicate(&table.header[i]))
        .collect();

    for row in out.rows.iter_mut().filter(|r| !r.separator) {
        for &col in &columns {
            if row.cells[col].to_string().trim() == "0" {
                row.cells[col] = Cell::text(replacement);
            }
        }
    }

    out
}

/// [`apply_significance_threshold`] with a column-name regex.
pub fn apply_significance_pattern(table: &CleanTable, pattern: &Regex, replacement: &str) -> CleanTable {
    apply_significance_threshold(table, |name| pattern.is_match(name), replacement)
}

fn parse_number(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) => Some(*n),
        Cell::Text(s) => s.trim().parse::<f64>().ok(),
    }
}

/// Round half-to-even at `decimals` places, never returning negative zero.
pub fn round_half_even(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    // `+ 0.0` turns -0.0 into 0.0
    scaled.round_ties_even() / factor + 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_table(name: &str, cells: &[&str]) -> CleanTable {
        CleanTable::from_texts(&[name], &cells.iter().map(|c| vec![*c]).collect::<Vec<_>>())
    }

    #[test]
    fn test_rounding_is_column_atomic() {
        let table = column_table("Mean", &["1.5", "x", "2.0"]);
        let out = round_numeric(&table, 2);
        assert_eq!(out, table);
    }

    #[test]
    fn test_rounds_numeric_column() {
        let out = round_numeric(&column_table("Mean", &["45.123", " 2.5 ", "1e-4"]), 2);
        assert_eq!(
            out.rows.iter().map(|r| r.cells[0].clone()).collect::<Vec<_>>(),
            vec![Cell::Number(45.12), Cell::Number(2.5), Cell::Number(0.0)]
        );
        assert_eq!(out.column_texts("Mean"), vec!["45.12", "2.5", "0"]);
    }

    #[test]
    fn test_half_even_consistency() {
        let out = round_numeric(&column_table("x", &["1.005", "2.005"]), 2);
        assert_eq!(out.column_texts("x"), vec!["1", "2"]);

        assert_eq!(round_half_even(0.5, 0), 0.0);
        assert_eq!(round_half_even(1.5, 0), 2.0);
        assert_eq!(round_half_even(2.5, 0), 2.0);
    }

    #[test]
    fn test_no_negative_zero() {
        let value = round_half_even(-0.0001, 2);
        assert!(value.is_sign_positive());
    }

    #[test]
    fn test_empty_cell_blocks_conversion() {
        let table = column_table("SD", &["1.25", ""]);
        assert_eq!(round_numeric(&table, 1), table);
    }

    #[test]
    fn test_separator_rows_ignored() {
        let mut table = column_table("Mean", &["Demographics", "45.123"]);
        table.rows[0].separator = true;

        let out = round_numeric(&table, 1);
        assert_eq!(out.column_texts("Mean"), vec!["Demographics", "45.1"]);
    }

    #[test]
    fn test_p_value_substitution() {
        let table = CleanTable::from_texts(
            &["Before: p-Value", "Count"],
            &[vec!["0", "0"], vec!["0.03", "1"], vec![" 0 ", "2"]],
        );
        let pattern = Regex::new("p-Value").unwrap();
        let out = apply_significance_pattern(&table, &pattern, "p<.001");

        assert_eq!(out.column_texts("Before: p-Value"), vec!["p<.001", "0.03", "p<.001"]);
        assert_eq!(out.column_texts("Count"), vec!["0", "1", "2"]);
    }

    #[test]
    fn test_p_value_after_rounding() {
        let table = column_table("After: p-Value", &["0.0004", "0.04"]);
        let rounded = round_numeric(&table, 2);
        let out = apply_significance_threshold(&rounded, |n| n.contains("p-Value"), "p<.001");

        assert_eq!(out.column_texts("After: p-Value"), vec!["p<.001", "0.04"]);
    }
}
