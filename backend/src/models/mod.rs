//! Domain models for the psmtable pipeline.
//!
//! - [`RawSheet`] - verbatim rows read from an upload
//! - [`Cell`] / [`Row`] / [`CleanTable`] - the rectangular table every stage transforms
//! - [`SpanMap`] - row merges computed by the collapser
//! - [`GroupedTable`] / [`Band`] - two-level column headers
//! - [`options`] - caller-owned configuration

pub mod options;

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

pub use options::*;

// =============================================================================
// Raw Sheet
// =============================================================================

/// How an uploaded file was decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetInfo {
    pub encoding: String,
    pub delimiter: char,
}

impl Default for SheetInfo {
    fn default() -> Self {
        Self {
            encoding: "utf-8".to_string(),
            delimiter: ',',
        }
    }
}

/// Rows of raw text cells exactly as read, no type inference.
///
/// Rows may differ in width: banner rows above the header usually have
/// a single cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSheet {
    pub rows: Vec<Vec<String>>,
    #[serde(default)]
    pub info: SheetInfo,
}

impl RawSheet {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows,
            info: SheetInfo::default(),
        }
    }

    pub fn with_info(mut self, info: SheetInfo) -> Self {
        self.info = info;
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// =============================================================================
// Cells and Rows
// =============================================================================

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    pub fn empty() -> Self {
        Cell::Text(String::new())
    }

    /// True for empty or whitespace-only text. Numbers are never empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(_) => None,
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::empty()
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            // `{}` prints the shortest round-trip form: 45.12, 2, 0
            Cell::Number(n) if *n == 0.0 => f.write_str("0"),
            Cell::Number(n) => write!(f, "{}", n),
        }
    }
}

/// One table row, aligned to the header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub cells: Vec<Cell>,
    /// Group/separator rows render full-width and break collapse runs.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub separator: bool,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self {
            cells,
            separator: false,
        }
    }

    /// A separator row: `label` in column `label_column`, empty elsewhere.
    pub fn separator(width: usize, label_column: usize, label: &str) -> Self {
        let cells = (0..width)
            .map(|i| {
                if i == label_column {
                    Cell::text(label)
                } else {
                    Cell::empty()
                }
            })
            .collect();
        Self {
            cells,
            separator: true,
        }
    }

    pub fn from_texts<S: AsRef<str>>(texts: &[S]) -> Self {
        Self::new(texts.iter().map(|s| Cell::text(s.as_ref())).collect())
    }

    /// Display strings of every cell.
    pub fn texts(&self) -> Vec<String> {
        self.cells.iter().map(|c| c.to_string()).collect()
    }
}

// =============================================================================
// Clean Table
// =============================================================================

/// Header plus rows. Every row has exactly the header's width and column
/// names are unique.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanTable {
    pub header: Vec<String>,
    pub rows: Vec<Row>,
}

impl CleanTable {
    /// Build a table, deduplicating the header and padding/truncating rows.
    pub fn new(header: Vec<String>, rows: Vec<Row>) -> Self {
        let header = dedup_column_names(&header);
        let width = header.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.cells.resize_with(width, Cell::empty);
                row
            })
            .collect();
        Self { header, rows }
    }

    /// Convenience constructor from string rows.
    pub fn from_texts<S: AsRef<str>>(header: &[S], rows: &[Vec<S>]) -> Self {
        Self::new(
            header.iter().map(|h| h.as_ref().to_string()).collect(),
            rows.iter().map(|r| Row::from_texts(r)).collect(),
        )
    }

    pub fn width(&self) -> usize {
        self.header.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Resolve an optional column name, falling back to the first column.
    pub fn column_or_first(&self, name: Option<&str>) -> Option<usize> {
        match name {
            Some(n) => self.column_index(n),
            None if self.width() > 0 => Some(0),
            None => None,
        }
    }

    /// Cell at `row` in the named column.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let col = self.column_index(column)?;
        self.rows.get(row)?.cells.get(col)
    }

    /// Display strings of the named column, top to bottom.
    pub fn column_texts(&self, column: &str) -> Vec<String> {
        match self.column_index(column) {
            Some(col) => self
                .rows
                .iter()
                .map(|r| r.cells[col].to_string())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Display strings of every row.
    pub fn texts(&self) -> Vec<Vec<String>> {
        self.rows.iter().map(Row::texts).collect()
    }
}

/// Make column names unique: repeated `X` becomes `X`, `X.1`, `X.2`, ...
///
/// A generated name that already exists elsewhere in the list is skipped.
pub fn dedup_column_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let originals: HashSet<&str> = names.iter().map(|n| n.as_ref()).collect();
    let mut used: HashSet<String> = HashSet::new();
    let mut counters: HashMap<&str, usize> = HashMap::new();
    let mut out = Vec::with_capacity(names.len());

    for name in names {
        let name = name.as_ref();
        if used.insert(name.to_string()) {
            out.push(name.to_string());
            continue;
        }
        let counter = counters.entry(name).or_insert(0);
        loop {
            *counter += 1;
            let candidate = format!("{}.{}", name, counter);
            if !originals.contains(candidate.as_str()) && used.insert(candidate.clone()) {
                out.push(candidate);
                break;
            }
        }
    }

    out
}

// =============================================================================
// Span Map
// =============================================================================

/// Row-merge state of one cell in the collapsed column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowSpan {
    /// First row of a run; the cell covers this many rows.
    Lead(usize),
    /// Covered by a `Lead` above; no cell is emitted.
    Covered,
}

/// Row spans for one column, one entry per table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanMap {
    pub column: usize,
    pub spans: Vec<RowSpan>,
}

impl SpanMap {
    /// Every row stands alone.
    pub fn trivial(column: usize, rows: usize) -> Self {
        Self {
            column,
            spans: vec![RowSpan::Lead(1); rows],
        }
    }

    /// Sum of all lead spans; equals the row count for a consistent map.
    pub fn total(&self) -> usize {
        self.spans
            .iter()
            .map(|s| match s {
                RowSpan::Lead(n) => *n,
                RowSpan::Covered => 0,
            })
            .sum()
    }

    pub fn has_merges(&self) -> bool {
        self.spans.iter().any(|s| *s == RowSpan::Covered)
    }
}

// =============================================================================
// Grouped Table
// =============================================================================

/// A top-level header label over `span` adjacent columns.
///
/// An empty label means the columns are not banded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    pub label: String,
    pub span: usize,
}

/// A table with an optional two-level header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupedTable {
    pub table: CleanTable,
    /// Empty when column banding is off.
    pub bands: Vec<Band>,
}

impl GroupedTable {
    pub fn is_banded(&self) -> bool {
        self.bands.iter().any(|b| !b.label.is_empty())
    }
}

impl From<CleanTable> for GroupedTable {
    fn from(table: CleanTable) -> Self {
        Self {
            table,
            bands: Vec::new(),
        }
    }
}
