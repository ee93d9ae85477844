//! High-level pipeline API: upload bytes to rendered preview and exports.
//!
//! ```text
//! bytes ─▶ parse ─▶ extract ─▶ curate ─▶ mark groups ─▶ round ─▶ p-values
//!                                                                  │
//!        render ◀─ band columns ◀─ collapse ◀─ insert separators ◀─┘
//! ```
//!
//! Every stage is a pure function of its input table and the
//! [`PipelineOptions`]; nothing is kept between calls.
//!
//! # Example
//!
//! ```rust,ignore
//! use psmtable::{run_file, PipelineOptions};
//!
//! let output = run_file("trinetx_export.csv", &PipelineOptions::default())?;
//! println!("{}", output.rendered.html);
//! ```

use regex::Regex;
use serde::Serialize;
use std::path::Path;

use super::collapser::collapse_repeated;
use super::curator::{apply_column_spec, edit_cells, reorder};
use super::extractor::extract;
use super::formatter::{apply_significance_pattern, round_numeric};
use super::grouper::{group_columns_by_token, insert_separator_rows, mark_group_rows};
use crate::api::logs::{log_error, log_info, log_info_indent, log_success, log_warning};
use crate::error::{OptionsError, PipelineResult};
use crate::export::{self, ExportFormat};
use crate::models::{CleanTable, ExportOptions, GroupedTable, PipelineOptions, RawSheet, RowSpan, SheetInfo, SpanMap};
use crate::parser::{parse_bytes_auto, parse_file_auto};
use crate::render::{render, Rendered};

/// Result of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    /// Final table, after collapsing.
    pub table: CleanTable,
    /// Final table with its column bands.
    pub grouped: GroupedTable,
    /// Row spans of the collapsed column, when labels were merged.
    pub spans: Option<SpanMap>,
    pub rendered: Rendered,
    pub info: SheetInfo,
    /// Header as extracted, before selection and renaming.
    pub extracted_columns: Vec<String>,
}

impl PipelineOutput {
    /// Serialize the final table in `format`.
    pub fn export(&self, format: ExportFormat, options: &ExportOptions) -> PipelineResult<Vec<u8>> {
        export_table(&self.table, format, options)
    }
}

/// Parse, extract and format an uploaded file.
pub fn run_bytes(bytes: &[u8], options: &PipelineOptions) -> PipelineResult<PipelineOutput> {
    log_info("Reading file...");
    let sheet = parse_bytes_auto(bytes)?;
    log_sheet(&sheet);
    run(&sheet, options)
}

/// [`run_bytes`] on a file path.
pub fn run_file<P: AsRef<Path>>(path: P, options: &PipelineOptions) -> PipelineResult<PipelineOutput> {
    log_info(format!("Reading {}...", path.as_ref().display()));
    let sheet = parse_file_auto(path)?;
    log_sheet(&sheet);
    run(&sheet, options)
}

/// Extract the data region of `sheet` and format it.
pub fn run(sheet: &RawSheet, options: &PipelineOptions) -> PipelineResult<PipelineOutput> {
    let clean = extract(sheet, &options.extract).inspect_err(|e| log_error(e.to_string()))?;
    log_success(format!(
        "Extracted {} columns, {} rows",
        clean.width(),
        clean.len()
    ));

    let mut output = format_table(&clean, options)?;
    output.info = sheet.info.clone();
    Ok(output)
}

/// Run every stage after extraction.
pub fn format_table(clean: &CleanTable, options: &PipelineOptions) -> PipelineResult<PipelineOutput> {
    let extracted_columns = clean.header.clone();
    let formatting = &options.formatting;
    let grouping = &options.grouping;

    // Curate
    let mut table = apply_column_spec(clean, &options.columns);
    if let Some(selected) = &options.columns.selected {
        let missing = selected.iter().filter(|n| clean.column_index(n).is_none()).count();
        if missing > 0 {
            log_warning(format!("{} selected column(s) not in this file, skipped", missing));
        }
    }
    if let Some(order) = &options.row_order {
        table = reorder(&table, order);
    }
    if !options.edits.is_empty() {
        table = edit_cells(&table, &options.edits);
        log_info_indent(format!("Applied {} cell edit(s)", options.edits.len()), 1);
    }
    log_success(format!("Kept {} columns, {} rows", table.width(), table.len()));

    let label_index = table.column_or_first(grouping.label_column.as_deref());
    let label_column = label_index
        .map(|i| table.header[i].clone())
        .unwrap_or_default();

    if !grouping.group_row_labels.is_empty() {
        table = mark_group_rows(&table, &grouping.group_row_labels, &label_column);
        let marked = table.rows.iter().filter(|r| r.separator).count();
        log_info(format!("Marked {} group row(s)", marked));
    }

    // Numbers
    let decimals = formatting.decimals();
    table = round_numeric(&table, decimals);
    log_info(format!("Rounded numeric columns to {} decimal(s)", decimals));

    if let Some(rule) = &options.significance {
        let pattern = Regex::new(&rule.column_pattern)
            .map_err(OptionsError::Pattern)
            .inspect_err(|e| log_error(e.to_string()))?;
        table = apply_significance_pattern(&table, &pattern, &rule.replacement);
        log_info(format!("Applied '{}' to columns matching /{}/", rule.replacement, rule.column_pattern));
    }

    // Grouping
    if !grouping.separators.is_empty() {
        table = insert_separator_rows(&table, &grouping.separators, &label_column);
        log_info(format!("Inserted {} separator row(s)", grouping.separators.len()));
    }

    let mut spans = None;
    if formatting.merge_repeated_labels {
        let column = table
            .column_or_first(formatting.collapse_column.as_deref())
            .map(|i| table.header[i].clone());
        if let Some(column) = column {
            let (collapsed, map) = collapse_repeated(&table, &column, formatting.collapse_mode);
            log_info(format!(
                "Collapsed repeated labels in '{}' ({} merged)",
                column,
                map.spans.iter().filter(|s| **s == RowSpan::Covered).count()
            ));
            table = collapsed;
            spans = Some(map);
        }
    }

    let grouped = if grouping.band_columns {
        let grouped = group_columns_by_token(&table, &grouping.band_tokens, grouping.identity_columns);
        log_info(format!("Grouped columns into {} band(s)", grouped.bands.len()));
        grouped
    } else {
        GroupedTable::from(table.clone())
    };

    let rendered = render(
        &grouped,
        spans.as_ref(),
        formatting,
        &grouping.group_row_labels,
        label_index,
    );
    match &rendered.error {
        None => log_success(format!("Rendered preview ({} bytes)", rendered.html.len())),
        Some(e) => log_warning(format!("Preview unavailable: {}", e)),
    }

    Ok(PipelineOutput {
        table,
        grouped,
        spans,
        rendered,
        info: SheetInfo::default(),
        extracted_columns,
    })
}

/// Serialize `table` in `format`. Sink failures propagate.
pub fn export_table(table: &CleanTable, format: ExportFormat, options: &ExportOptions) -> PipelineResult<Vec<u8>> {
    let bytes = export::export(table, format, options)
        .inspect_err(|e| log_error(format!("Export to {} failed: {}", format.file_name(), e)))?;
    log_success(format!("Exported {} ({} bytes)", format.file_name(), bytes.len()));
    Ok(bytes)
}

fn log_sheet(sheet: &RawSheet) {
    log_success(format!("Detected encoding: {}", sheet.info.encoding));
    log_success(format!("Detected separator: '{}'", format_delimiter(sheet.info.delimiter)));
    log_success(format!("Read {} rows", sheet.len()));
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}
