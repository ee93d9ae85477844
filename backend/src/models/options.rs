//! Caller-owned pipeline configuration.
//!
//! The pipeline is stateless: whatever a UI session holds (selected columns,
//! renames, group rows, row order, edits) travels in a [`PipelineOptions`]
//! value on every call.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Decimal places accepted by the formatter.
pub const MAX_DECIMAL_PLACES: u32 = 5;
/// Preview font size bounds, in points.
pub const MIN_FONT_SIZE: u32 = 6;
pub const MAX_FONT_SIZE: u32 = 36;
/// Document and PDF font size bounds, in points.
pub const MAX_EXPORT_FONT_SIZE: u32 = 14;

/// Marker TriNetX puts in the first cell of the header row.
pub const DEFAULT_HEADER_MARKER: &str = "Characteristic";

// =============================================================================
// Extraction
// =============================================================================

/// How the header row is located.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractMode {
    /// Drop exactly N leading rows; the next row is the header.
    SkipRows(usize),
    /// The first row whose first cell contains this text is the header.
    Marker(String),
}

impl Default for ExtractMode {
    fn default() -> Self {
        ExtractMode::Marker(DEFAULT_HEADER_MARKER.to_string())
    }
}

// =============================================================================
// Columns
// =============================================================================

/// Column selection and renaming.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSpec {
    /// Columns to keep, in output order. `None` keeps all columns.
    pub selected: Option<Vec<String>>,
    /// Original name -> display name.
    pub renames: HashMap<String, String>,
}

/// A single inline edit from an editable grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellEdit {
    pub row: usize,
    pub column: String,
    pub value: String,
}

// =============================================================================
// Formatting
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl HorizontalAlign {
    pub fn as_css(self) -> &'static str {
        match self {
            HorizontalAlign::Left => "left",
            HorizontalAlign::Center => "center",
            HorizontalAlign::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    Top,
    #[default]
    Middle,
    Bottom,
}

impl VerticalAlign {
    pub fn as_css(self) -> &'static str {
        match self {
            VerticalAlign::Top => "top",
            VerticalAlign::Middle => "middle",
            VerticalAlign::Bottom => "bottom",
        }
    }
}

/// Named border/shading bundle. Presets only change the style block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StylePreset {
    #[default]
    None,
    Nejm,
    Jama,
    Lancet,
    Apa,
}

/// How repeated labels are collapsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollapseMode {
    /// Repeated values become empty cells.
    Blank,
    /// Runs become one row-spanning cell.
    #[default]
    Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormattingOptions {
    pub decimal_places: u32,
    pub font_size: u32,
    pub horizontal_align: HorizontalAlign,
    pub vertical_align: VerticalAlign,
    pub style_preset: StylePreset,
    pub merge_repeated_labels: bool,
    pub collapse_mode: CollapseMode,
    /// Column whose repeated values are collapsed. `None` = first column.
    pub collapse_column: Option<String>,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            decimal_places: 2,
            font_size: 11,
            horizontal_align: HorizontalAlign::Left,
            vertical_align: VerticalAlign::Middle,
            style_preset: StylePreset::None,
            merge_repeated_labels: true,
            collapse_mode: CollapseMode::Span,
            collapse_column: None,
        }
    }
}

impl FormattingOptions {
    /// Font size clamped to the supported range.
    pub fn font_size_pt(&self) -> u32 {
        self.font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
    }

    /// Decimal places clamped to the supported range.
    pub fn decimals(&self) -> u32 {
        self.decimal_places.min(MAX_DECIMAL_PLACES)
    }
}

/// Display rule for p-values that round to zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignificanceRule {
    /// Regular expression matched against column names.
    pub column_pattern: String,
    pub replacement: String,
}

impl Default for SignificanceRule {
    fn default() -> Self {
        Self {
            column_pattern: "p-Value".to_string(),
            replacement: "p<.001".to_string(),
        }
    }
}

// =============================================================================
// Grouping
// =============================================================================

/// A labeled separator row inserted before `position`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeparatorRow {
    pub position: usize,
    pub label: String,
}

/// Column band: columns whose name contains `token` go under `label`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandToken {
    pub token: String,
    pub label: String,
}

impl BandToken {
    pub fn new(token: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupSpec {
    pub separators: Vec<SeparatorRow>,
    /// Existing rows acting as category headings, matched on the label column.
    pub group_row_labels: Vec<String>,
    pub band_columns: bool,
    pub band_tokens: Vec<BandToken>,
    /// Leading columns never banded.
    pub identity_columns: usize,
    /// Column holding row labels. `None` = first column.
    pub label_column: Option<String>,
}

impl Default for GroupSpec {
    fn default() -> Self {
        Self {
            separators: Vec::new(),
            group_row_labels: Vec::new(),
            band_columns: false,
            band_tokens: vec![
                BandToken::new("Before", "Before Propensity Score Matching"),
                BandToken::new("After", "After Propensity Score Matching"),
            ],
            identity_columns: 1,
            label_column: None,
        }
    }
}

// =============================================================================
// Export
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub document_font_size: u32,
    pub document_align: HorizontalAlign,
    pub pdf_font_size: u32,
    pub pdf_align: HorizontalAlign,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            document_font_size: 10,
            document_align: HorizontalAlign::Left,
            pdf_font_size: 8,
            pdf_align: HorizontalAlign::Left,
        }
    }
}

// =============================================================================
// Pipeline Options
// =============================================================================

/// Everything one pipeline invocation needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub extract: ExtractMode,
    pub columns: ColumnSpec,
    pub formatting: FormattingOptions,
    /// `None` disables the p-value substitution.
    pub significance: Option<SignificanceRule>,
    pub grouping: GroupSpec,
    /// Row ids in display order, as produced by a drag-and-drop grid.
    pub row_order: Option<Vec<usize>>,
    pub edits: Vec<CellEdit>,
    pub export: ExportOptions,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            extract: ExtractMode::default(),
            columns: ColumnSpec::default(),
            formatting: FormattingOptions::default(),
            significance: Some(SignificanceRule::default()),
            grouping: GroupSpec::default(),
            row_order: None,
            edits: Vec::new(),
            export: ExportOptions::default(),
        }
    }
}
