//! Single-pass row sweep over sorted fragments.
//!
//! The sweep is a two-state machine: a [`RowAccumulator`] collects fragments
//! until one lands more than the row tolerance below the row's first
//! fragment, at which point the row is closed into the output and a new
//! accumulator starts from that fragment.

use tracing::{debug, trace};

use super::columns::ColumnLocator;
use super::geometry::{same_row, sorted_in_range};
use super::types::{PositionedText, TableEntry, TableExtractionConfig};

/// Row being collected. The anchor is the `top` of its first fragment.
#[derive(Debug, Clone)]
pub(crate) struct RowAccumulator {
    anchor_top: i32,
    entry: TableEntry,
}

impl RowAccumulator {
    pub(crate) fn open(anchor_top: i32, column_count: usize) -> Self {
        Self {
            anchor_top,
            entry: TableEntry::with_columns(column_count),
        }
    }

    pub(crate) fn accepts(&self, fragment: &PositionedText, tolerance: i32) -> bool {
        same_row(self.anchor_top, fragment.top, tolerance)
    }

    /// Place `fragment` in the first matching column. Returns the column, or
    /// `None` when the fragment was dropped.
    pub(crate) fn place<L: ColumnLocator + ?Sized>(
        &mut self,
        fragment: &PositionedText,
        columns: &L,
    ) -> Option<usize> {
        let column_count = self.entry.content.len();
        let column = columns.locate(fragment.left).filter(|&i| i < column_count)?;
        self.entry.assign(column, fragment);
        Some(column)
    }

    pub(crate) fn finish(self) -> TableEntry {
        self.entry
    }
}

/// Output of a sweep plus the counters it kept along the way.
#[derive(Debug, Default)]
pub(crate) struct SweepOutcome {
    pub rows: Vec<TableEntry>,
    pub rejected_rows: usize,
    pub dropped_fragments: usize,
}

struct TableSweep<'a> {
    config: &'a TableExtractionConfig,
    current: Option<RowAccumulator>,
    outcome: SweepOutcome,
}

impl<'a> TableSweep<'a> {
    fn new(config: &'a TableExtractionConfig) -> Self {
        Self {
            config,
            current: None,
            outcome: SweepOutcome::default(),
        }
    }

    fn feed(&mut self, fragment: &PositionedText) {
        let tolerance = self.config.row_height_tolerance;
        let mut row = match self.current.take() {
            Some(row) if row.accepts(fragment, tolerance) => row,
            previous => {
                if let Some(previous) = previous {
                    self.close(previous);
                }
                RowAccumulator::open(fragment.top, self.config.column_count)
            }
        };

        match row.place(fragment, &self.config.columns) {
            Some(column) => trace!(top = fragment.top, left = fragment.left, column, "placed"),
            None => {
                trace!(top = fragment.top, left = fragment.left, "no column");
                self.outcome.dropped_fragments += 1;
            }
        }
        self.current = Some(row);
    }

    /// Finalize a row. A rejected row never reaches the output, so the next
    /// row takes its slot.
    fn close(&mut self, row: RowAccumulator) {
        let entry = row.finish();
        let keep = self.config.row_filter.as_ref().is_none_or(|filter| filter(&entry));
        if keep {
            self.outcome.rows.push(entry);
        } else {
            trace!(bounds = ?entry.bounds, "row rejected by filter");
            self.outcome.rejected_rows += 1;
        }
    }

    fn finish(mut self) -> SweepOutcome {
        if let Some(row) = self.current.take() {
            self.close(row);
        }
        self.outcome
    }
}

pub(crate) fn sweep(texts: &[PositionedText], config: &TableExtractionConfig) -> SweepOutcome {
    assert!(
        config.columns.len() >= config.column_count,
        "table configured with {} columns but only {} column positions",
        config.column_count,
        config.columns.len()
    );

    let fragments = sorted_in_range(texts, config.vertical_range);
    let mut table = TableSweep::new(config);
    for fragment in &fragments {
        table.feed(fragment);
    }
    let outcome = table.finish();

    debug!(
        fragments = fragments.len(),
        rows = outcome.rows.len(),
        rejected_rows = outcome.rejected_rows,
        dropped_fragments = outcome.dropped_fragments,
        "table reconstructed"
    );
    outcome
}

/// Reconstruct table rows from a page's positioned fragments.
///
/// Fragments outside `config.vertical_range` are ignored. The rest are
/// grouped into rows by their distance below each row's first fragment and
/// assigned to the first column that accepts their `left` coordinate.
/// Fragments matching no column are dropped. When a row filter is set, rows
/// it rejects are left out of the result.
///
/// # Panics
///
/// Panics if the column strategy has fewer columns than
/// `config.column_count`. Use [`TableExtractionConfig::validate`] to check a
/// configuration up front.
pub fn extract_table(texts: &[PositionedText], config: &TableExtractionConfig) -> Vec<TableEntry> {
    sweep(texts, config).rows
}
