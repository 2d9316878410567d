//! Column matching strategies.
//!
//! A strategy maps a fragment's `left` coordinate to a column index. Every
//! strategy scans its columns in order and returns the first match, so
//! overlapping columns resolve to the lowest index. A coordinate matching no
//! column yields `None`; the sweep drops such fragments.

use serde::{Deserialize, Serialize};

use crate::error::TableError;

/// Locate the column a horizontal position belongs to.
pub trait ColumnLocator {
    /// Index of the first column accepting `left`.
    fn locate(&self, left: i32) -> Option<usize>;

    /// Number of columns this locator knows about.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Columns aligned to fixed anchors, sharing one tolerance.
///
/// `left` matches anchor `a` when `|left - a| < tolerance`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnchoredColumns {
    pub anchors: Vec<i32>,
    pub tolerance: i32,
}

impl AnchoredColumns {
    pub fn new(anchors: Vec<i32>, tolerance: i32) -> Self {
        Self { anchors, tolerance }
    }
}

impl ColumnLocator for AnchoredColumns {
    fn locate(&self, left: i32) -> Option<usize> {
        let left = i64::from(left);
        let tolerance = i64::from(self.tolerance);
        self.anchors.iter().position(|&anchor| {
            let anchor = i64::from(anchor);
            left - anchor < tolerance && anchor - left < tolerance
        })
    }

    fn len(&self) -> usize {
        self.anchors.len()
    }
}

/// Inclusive horizontal band for one column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRange {
    pub from: i32,
    pub to: i32,
}

impl ColumnRange {
    pub fn new(from: i32, to: i32) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, left: i32) -> bool {
        self.from <= left && left <= self.to
    }
}

/// Columns given as explicit `[from, to]` bands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnRanges {
    pub ranges: Vec<ColumnRange>,
}

impl ColumnRanges {
    pub fn new(ranges: Vec<ColumnRange>) -> Self {
        Self { ranges }
    }
}

impl ColumnLocator for ColumnRanges {
    fn locate(&self, left: i32) -> Option<usize> {
        self.ranges.iter().position(|range| range.contains(left))
    }

    fn len(&self) -> usize {
        self.ranges.len()
    }
}

/// The column strategies a table layout can be configured with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnStrategy {
    Anchored(AnchoredColumns),
    Ranges(ColumnRanges),
}

impl ColumnStrategy {
    pub(crate) fn validate(&self) -> Result<(), TableError> {
        match self {
            ColumnStrategy::Anchored(cols) => {
                if cols.tolerance <= 0 {
                    return Err(TableError::NonPositiveColumnTolerance(cols.tolerance));
                }
            }
            ColumnStrategy::Ranges(cols) => {
                if let Some((index, range)) = cols
                    .ranges
                    .iter()
                    .enumerate()
                    .find(|(_, r)| r.from > r.to)
                {
                    return Err(TableError::InvertedRange {
                        index,
                        from: range.from,
                        to: range.to,
                    });
                }
            }
        }
        Ok(())
    }
}

impl ColumnLocator for ColumnStrategy {
    fn locate(&self, left: i32) -> Option<usize> {
        match self {
            ColumnStrategy::Anchored(cols) => cols.locate(left),
            ColumnStrategy::Ranges(cols) => cols.locate(left),
        }
    }

    fn len(&self) -> usize {
        match self {
            ColumnStrategy::Anchored(cols) => cols.len(),
            ColumnStrategy::Ranges(cols) => cols.len(),
        }
    }
}

impl From<AnchoredColumns> for ColumnStrategy {
    fn from(cols: AnchoredColumns) -> Self {
        ColumnStrategy::Anchored(cols)
    }
}

impl From<ColumnRanges> for ColumnStrategy {
    fn from(cols: ColumnRanges) -> Self {
        ColumnStrategy::Ranges(cols)
    }
}
