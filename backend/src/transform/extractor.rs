//! Locate the header row below a banner preamble and build a [`CleanTable`].

use crate::error::{ExtractError, ExtractResult};
use crate::models::{CleanTable, ExtractMode, RawSheet, Row};

/// Extract the data region of `sheet`.
///
/// - `SkipRows(n)`: drop `n` rows, the next one is the header.
/// - `Marker(m)`: the first row whose first cell contains `m`
///   (case-sensitive) is the header.
///
/// Rows after the header become data rows, padded or truncated to the
/// header width. Fully blank rows are dropped. Header names are deduplicated.
pub fn extract(sheet: &RawSheet, mode: &ExtractMode) -> ExtractResult<CleanTable> {
    let header_index = match mode {
        ExtractMode::SkipRows(skip) => {
            if sheet.len() <= *skip {
                return Err(ExtractError::InsufficientRows {
                    skip: *skip,
                    needed: skip + 1,
                    found: sheet.len(),
                });
            }
            *skip
        }
        ExtractMode::Marker(marker) => find_header_row(sheet, marker).ok_or_else(|| {
            ExtractError::NoHeaderFound {
                marker: marker.clone(),
            }
        })?,
    };

    let header = sheet.rows[header_index].clone();
    let rows = sheet.rows[header_index + 1..]
        .iter()
        .filter(|cells| cells.iter().any(|c| !c.trim().is_empty()))
        .map(|cells| Row::from_texts(cells))
        .collect();

    Ok(CleanTable::new(header, rows))
}

/// Index of the first row whose first cell contains `marker`.
pub fn find_header_row(sheet: &RawSheet, marker: &str) -> Option<usize> {
    sheet.rows.iter().position(|row| {
        row.first()
            .is_some_and(|first| first.contains(marker))
    })
}
