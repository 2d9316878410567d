//! Table reconstruction from positioned text fragments.
//!
//! Rows are clustered by vertical proximity to each row's first fragment and
//! columns are assigned by horizontal position, using either fixed anchors
//! with a tolerance or explicit ranges.

mod columns;
mod geometry;
mod sweep;
mod types;

// Re-export public types
pub use columns::{AnchoredColumns, ColumnLocator, ColumnRange, ColumnRanges, ColumnStrategy};
pub use types::{
    EntryContent, PositionedText, RowBounds, RowFilter, TableEntry, TableExtractionConfig,
    VerticalRange,
};

// Re-export public API functions
pub use sweep::extract_table;
