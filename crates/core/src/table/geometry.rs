//! Reading-order helpers for table reconstruction.
//!
//! Converter coordinates already use a top-left origin, so the only
//! preparation the sweep needs is windowing and ordering.

use super::types::{PositionedText, VerticalRange};

/// Fragments whose `top` lies inside `range`, in top-to-bottom,
/// left-to-right order.
pub(crate) fn sorted_in_range(texts: &[PositionedText], range: VerticalRange) -> Vec<&PositionedText> {
    let mut kept: Vec<&PositionedText> = texts.iter().filter(|t| range.contains(t.top)).collect();
    // Stable sort keeps converter order for identical positions.
    kept.sort_by_key(|t| (t.top, t.left));
    kept
}

/// Whether `top` still belongs to a row anchored at `anchor_top`.
///
/// Distances are taken in `i64` so coordinates spanning the whole `i32`
/// range cannot overflow.
pub(crate) fn same_row(anchor_top: i32, top: i32, tolerance: i32) -> bool {
    i64::from(top) - i64::from(anchor_top) <= i64::from(tolerance)
}
