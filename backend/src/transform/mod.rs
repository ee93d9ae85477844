//! Table transformation stages.
//!
//! - Extractor: locate the header row below the banner preamble
//! - Curator: column selection/renaming, row order, cell edits
//! - Formatter: rounding and p-value display
//! - Collapser: repeated labels to blanks or row spans
//! - Grouper: separator rows, group rows, column bands
//! - Pipeline: all of the above, in order

pub mod collapser;
pub mod curator;
pub mod extractor;
pub mod formatter;
pub mod grouper;
pub mod pipeline;

pub use collapser::collapse_repeated;
pub use curator::{apply_column_spec, edit_cells, reorder, select_and_rename};
pub use extractor::{extract, find_header_row};
pub use formatter::{apply_significance_pattern, apply_significance_threshold, round_numeric};
pub use grouper::{group_columns_by_token, insert_separator_rows, mark_group_rows};
pub use pipeline::*;
