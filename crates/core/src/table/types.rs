//! Table reconstruction types and settings.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::TableError;

use super::columns::{AnchoredColumns, ColumnLocator, ColumnRange, ColumnRanges, ColumnStrategy};

// Default constants
pub(crate) const DEFAULT_ROW_HEIGHT_TOLERANCE: i32 = 5;

/// A text run placed on a page by the converter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PositionedText {
    pub top: i32,
    pub left: i32,
    pub width: i32,
    pub height: i32,
    /// Character data directly inside the fragment.
    pub text: String,
    /// Run rendered in bold (`<b>` child), if any.
    pub bold_text: Option<String>,
    /// Font spec id the converter assigned to the fragment.
    pub font: Option<u32>,
}

impl PositionedText {
    pub fn new(top: i32, left: i32, text: impl Into<String>) -> Self {
        Self {
            top,
            left,
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_bold(mut self, bold: impl Into<String>) -> Self {
        self.bold_text = Some(bold.into());
        self
    }

    pub fn with_size(mut self, width: i32, height: i32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// Inclusive bounds on `top` for fragments taking part in the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerticalRange {
    pub from: i32,
    pub to: i32,
}

impl VerticalRange {
    pub fn new(from: i32, to: i32) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, top: i32) -> bool {
        self.from <= top && top <= self.to
    }
}

impl Default for VerticalRange {
    fn default() -> Self {
        Self {
            from: i32::MIN,
            to: i32::MAX,
        }
    }
}

/// Predicate deciding whether a completed row stays in the table.
pub type RowFilter = Arc<dyn Fn(&TableEntry) -> bool + Send + Sync>;

/// Layout of the table to reconstruct.
#[derive(Clone)]
pub struct TableExtractionConfig {
    pub vertical_range: VerticalRange,
    pub column_count: usize,
    pub columns: ColumnStrategy,
    /// Maximum distance below a row's first fragment that still joins the row.
    pub row_height_tolerance: i32,
    pub row_filter: Option<RowFilter>,
}

impl TableExtractionConfig {
    /// Columns matched against fixed anchors with a shared tolerance.
    pub fn anchored(
        vertical_range: VerticalRange,
        anchors: Vec<i32>,
        column_tolerance: i32,
    ) -> Self {
        Self {
            vertical_range,
            column_count: anchors.len(),
            columns: ColumnStrategy::Anchored(AnchoredColumns::new(anchors, column_tolerance)),
            row_height_tolerance: DEFAULT_ROW_HEIGHT_TOLERANCE,
            row_filter: None,
        }
    }

    /// Columns matched against explicit inclusive ranges.
    pub fn with_ranges(vertical_range: VerticalRange, ranges: Vec<ColumnRange>) -> Self {
        Self {
            vertical_range,
            column_count: ranges.len(),
            columns: ColumnStrategy::Ranges(ColumnRanges::new(ranges)),
            row_height_tolerance: DEFAULT_ROW_HEIGHT_TOLERANCE,
            row_filter: None,
        }
    }

    pub fn with_row_height_tolerance(mut self, tolerance: i32) -> Self {
        self.row_height_tolerance = tolerance;
        self
    }

    pub fn with_column_count(mut self, count: usize) -> Self {
        self.column_count = count;
        self
    }

    pub fn with_row_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&TableEntry) -> bool + Send + Sync + 'static,
    {
        self.row_filter = Some(Arc::new(filter));
        self
    }

    /// Check the configuration for contract violations.
    pub fn validate(&self) -> Result<(), TableError> {
        if self.column_count == 0 {
            return Err(TableError::NoColumns);
        }
        if self.columns.len() < self.column_count {
            return Err(TableError::ColumnCountMismatch {
                expected: self.column_count,
                available: self.columns.len(),
            });
        }
        if self.row_height_tolerance < 0 {
            return Err(TableError::NegativeRowTolerance(self.row_height_tolerance));
        }
        if self.vertical_range.from > self.vertical_range.to {
            return Err(TableError::InvertedVerticalRange {
                from: self.vertical_range.from,
                to: self.vertical_range.to,
            });
        }
        self.columns.validate()
    }
}

impl fmt::Debug for TableExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableExtractionConfig")
            .field("vertical_range", &self.vertical_range)
            .field("column_count", &self.column_count)
            .field("columns", &self.columns)
            .field("row_height_tolerance", &self.row_height_tolerance)
            .field("row_filter", &self.row_filter.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Text copied from the fragment assigned to a column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EntryContent {
    pub text: String,
    pub bold_text: Option<String>,
}

impl From<&PositionedText> for EntryContent {
    fn from(fragment: &PositionedText) -> Self {
        Self {
            text: fragment.text.clone(),
            bold_text: fragment.bold_text.clone(),
        }
    }
}

/// Box spanned by the `left`/`top` of fragments assigned to a row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RowBounds {
    pub min_left: i32,
    pub max_left: i32,
    pub min_top: i32,
    pub max_top: i32,
}

impl RowBounds {
    pub(crate) fn at(left: i32, top: i32) -> Self {
        Self {
            min_left: left,
            max_left: left,
            min_top: top,
            max_top: top,
        }
    }

    pub(crate) fn include(&mut self, left: i32, top: i32) {
        self.min_left = self.min_left.min(left);
        self.max_left = self.max_left.max(left);
        self.min_top = self.min_top.min(top);
        self.max_top = self.max_top.max(top);
    }
}

/// One reconstructed table row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TableEntry {
    /// `None` while no fragment of the row matched a column.
    pub bounds: Option<RowBounds>,
    /// Exactly `column_count` slots.
    pub content: Vec<Option<EntryContent>>,
}

impl TableEntry {
    pub(crate) fn with_columns(column_count: usize) -> Self {
        Self {
            bounds: None,
            content: vec![None; column_count],
        }
    }

    pub fn min_left(&self) -> Option<i32> {
        self.bounds.map(|b| b.min_left)
    }

    pub fn max_left(&self) -> Option<i32> {
        self.bounds.map(|b| b.max_left)
    }

    pub fn min_top(&self) -> Option<i32> {
        self.bounds.map(|b| b.min_top)
    }

    pub fn max_top(&self) -> Option<i32> {
        self.bounds.map(|b| b.max_top)
    }

    /// Text of column `index`, if a fragment was assigned to it.
    pub fn cell(&self, index: usize) -> Option<&EntryContent> {
        self.content.get(index).and_then(Option::as_ref)
    }

    pub fn filled_columns(&self) -> usize {
        self.content.iter().filter(|c| c.is_some()).count()
    }

    pub(crate) fn assign(&mut self, column: usize, fragment: &PositionedText) {
        self.content[column] = Some(EntryContent::from(fragment));
        match self.bounds.as_mut() {
            Some(bounds) => bounds.include(fragment.left, fragment.top),
            None => self.bounds = Some(RowBounds::at(fragment.left, fragment.top)),
        }
    }
}
