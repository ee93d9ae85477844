//! Column selection/renaming and row-level edits.
//!
//! Stale names and ids (left over from a previous upload) are ignored rather
//! than reported.

use std::collections::{HashMap, HashSet};

use crate::models::{Cell, CellEdit, CleanTable, ColumnSpec, Row};

/// Keep `selected` columns in that order, then apply `renames`.
///
/// Names not in the header are skipped. Renamed collisions are deduplicated
/// (`X`, `X.1`, ...). Missing cells are filled with empty text.
pub fn select_and_rename<S: AsRef<str>>(
    table: &CleanTable,
    selected: &[S],
    renames: &HashMap<String, String>,
) -> CleanTable {
    let indices: Vec<usize> = selected
        .iter()
        .filter_map(|name| table.column_index(name.as_ref()))
        .collect();

    let header: Vec<String> = indices
        .iter()
        .map(|&i| {
            let original = &table.header[i];
            renames.get(original).unwrap_or(original).clone()
        })
        .collect();

    let rows = table
        .rows
        .iter()
        .map(|row| Row {
            cells: indices
                .iter()
                .map(|&i| row.cells.get(i).cloned().unwrap_or_default())
                .collect(),
            separator: row.separator,
        })
        .collect();

    CleanTable::new(header, rows)
}

/// Apply a [`ColumnSpec`]; no selection keeps every column.
pub fn apply_column_spec(table: &CleanTable, spec: &ColumnSpec) -> CleanTable {
    match &spec.selected {
        Some(selected) => select_and_rename(table, selected, &spec.renames),
        None => select_and_rename(table, &table.header, &spec.renames),
    }
}

/// Reorder rows by id.
///
/// Listed ids come first in the given order; out-of-range and repeated ids
/// are skipped; unlisted rows follow in their original order.
pub fn reorder(table: &CleanTable, new_order: &[usize]) -> CleanTable {
    let mut seen = HashSet::new();
    let mut order: Vec<usize> = new_order
        .iter()
        .copied()
        .filter(|&id| id < table.len() && seen.insert(id))
        .collect();
    order.extend((0..table.len()).filter(|id| !seen.contains(id)));

    CleanTable {
        header: table.header.clone(),
        rows: order.into_iter().map(|id| table.rows[id].clone()).collect(),
    }
}

/// Replace cells with edited text. Unknown rows or columns are skipped.
pub fn edit_cells(table: &CleanTable, edits: &[CellEdit]) -> CleanTable {
    let mut out = table.clone();
    for edit in edits {
        let Some(col) = out.column_index(&edit.column) else {
            continue;
        };
        if let Some(row) = out.rows.get_mut(edit.row) {
            row.cells[col] = Cell::text(edit.value.clone());
        }
    }
    out
}
