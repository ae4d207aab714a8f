//! Column widths, cumulative offsets and visible-column lookup.
//!
//! [`accumulate_column_widths`] builds the offset table in one pass;
//! [`calculate_visible_columns_from_metrics`] locates the visible columns with two binary
//! searches. [`ColumnMetricsCache`] and [`VisibleColumnsPool`] keep both off the allocator on
//! the per-frame path.

use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::math::{clamp, finite_or, positive_or};

/// Width used when a column has no width of its own.
pub const DEFAULT_COLUMN_WIDTH: f64 = 120.0;

/// Number of slots in [`ColumnMetricsCache`] and [`VisibleColumnsPool`].
const POOL_SLOTS: usize = 2;

/// Width constraints of one column, before zoom.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnSpec {
    pub width: Option<f64>,
    pub min_width: Option<f64>,
    pub max_width: Option<f64>,
}

impl ColumnSpec {
    pub fn fixed(width: f64) -> Self {
        Self {
            width: Some(width),
            ..Self::default()
        }
    }

    pub fn with_min_width(mut self, min_width: f64) -> Self {
        self.min_width = Some(min_width);
        self
    }

    pub fn with_max_width(mut self, max_width: f64) -> Self {
        self.max_width = Some(max_width);
        self
    }
}

/// Fallbacks used by [`resolve_column_width_with`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnSizingDefaults {
    /// Used when a column has no `width`.
    pub fallback_width: f64,
    /// Used when the resolved width is not finite.
    pub default_width: f64,
}

impl Default for ColumnSizingDefaults {
    fn default() -> Self {
        Self {
            fallback_width: DEFAULT_COLUMN_WIDTH,
            default_width: DEFAULT_COLUMN_WIDTH,
        }
    }
}

/// Resolves the effective width of a column at `zoom` with the default fallbacks.
pub fn resolve_column_width(column: &ColumnSpec, zoom: f64) -> f64 {
    resolve_column_width_with(column, zoom, ColumnSizingDefaults::default())
}

/// Resolves `clamp(width, min_width, max_width) * zoom`.
///
/// A missing `min_width` means `0`, a missing `max_width` means unbounded, and `min_width` wins
/// over `max_width` when they conflict. Non-finite results fall back to
/// `defaults.default_width * zoom`.
pub fn resolve_column_width_with(
    column: &ColumnSpec,
    zoom: f64,
    defaults: ColumnSizingDefaults,
) -> f64 {
    let zoom = positive_or(zoom, 1.0);
    let width = column.width.unwrap_or(defaults.fallback_width);
    let min = finite_or(column.min_width.unwrap_or(0.0), 0.0).max(0.0);
    let max = column.max_width.map_or(f64::INFINITY, |m| finite_or(m, f64::INFINITY));
    let resolved = width.min(max).max(min) * zoom;
    if resolved.is_finite() && resolved >= 0.0 {
        resolved
    } else {
        positive_or(defaults.default_width, DEFAULT_COLUMN_WIDTH) * zoom
    }
}

/// Resolved widths, start offsets and total width of a column list.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnMetrics {
    pub widths: Vec<f64>,
    pub offsets: Vec<f64>,
    pub total_width: f64,
}

impl ColumnMetrics {
    pub fn len(&self) -> usize {
        self.widths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }

    /// End offset of column `index`, or the total width past the last column.
    pub fn end_of(&self, index: usize) -> f64 {
        match (self.offsets.get(index), self.widths.get(index)) {
            (Some(offset), Some(width)) => offset + width,
            _ => self.total_width,
        }
    }

    /// Start offset of column `index`, or the total width past the last column.
    pub fn start_of(&self, index: usize) -> f64 {
        self.offsets.get(index).copied().unwrap_or(self.total_width)
    }
}

/// Builds the cumulative offset table for `columns` at `zoom`.
pub fn accumulate_column_widths(columns: &[ColumnSpec], zoom: f64) -> ColumnMetrics {
    accumulate_column_widths_with(columns, zoom, ColumnSizingDefaults::default())
}

pub fn accumulate_column_widths_with(
    columns: &[ColumnSpec],
    zoom: f64,
    defaults: ColumnSizingDefaults,
) -> ColumnMetrics {
    let mut widths = Vec::with_capacity(columns.len());
    let mut offsets = Vec::with_capacity(columns.len());
    let mut total_width = 0.0;
    for column in columns {
        let width = resolve_column_width_with(column, zoom, defaults);
        offsets.push(total_width);
        widths.push(width);
        total_width += width;
    }
    ColumnMetrics {
        widths,
        offsets,
        total_width,
    }
}

#[derive(Clone, Debug)]
struct MetricsSlot {
    columns: Arc<[ColumnSpec]>,
    zoom: f64,
    metrics: Arc<ColumnMetrics>,
}

/// A two-slot round-robin cache of [`ColumnMetrics`].
///
/// Entries are keyed by the *identity* of the column list (`Arc::ptr_eq`) and the zoom factor,
/// not by content: pass a new `Arc` when the columns change. A new key evicts the older slot.
#[derive(Clone, Debug, Default)]
pub struct ColumnMetricsCache {
    slots: [Option<MetricsSlot>; POOL_SLOTS],
    cursor: usize,
    defaults: ColumnSizingDefaults,
}

impl ColumnMetricsCache {
    pub fn new(defaults: ColumnSizingDefaults) -> Self {
        Self {
            defaults,
            ..Self::default()
        }
    }

    pub fn defaults(&self) -> ColumnSizingDefaults {
        self.defaults
    }

    /// Returns the metrics for `(columns, zoom)`, building them on a miss.
    pub fn accumulate(&mut self, columns: &Arc<[ColumnSpec]>, zoom: f64) -> Arc<ColumnMetrics> {
        let hit = self.slots.iter().flatten().find(|slot| {
            Arc::ptr_eq(&slot.columns, columns) && slot.zoom.to_bits() == zoom.to_bits()
        });
        if let Some(slot) = hit {
            return Arc::clone(&slot.metrics);
        }

        vdebug!(columns = columns.len(), zoom, "column metrics cache miss");
        let metrics = Arc::new(accumulate_column_widths_with(columns, zoom, self.defaults));
        self.slots[self.cursor] = Some(MetricsSlot {
            columns: Arc::clone(columns),
            zoom,
            metrics: Arc::clone(&metrics),
        });
        self.cursor = (self.cursor + 1) % POOL_SLOTS;
        metrics
    }

    pub fn clear(&mut self) {
        self.slots = Default::default();
        self.cursor = 0;
    }
}

/// Widths consumed by pinned columns on either side of the scrolling area.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PinnedWidths {
    pub left: f64,
    pub right: f64,
}

/// The visible slice of a column list.
///
/// `left_padding` / `right_padding` are the widths of the columns fully scrolled out on each
/// side.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VisibleColumnRange {
    pub start_index: usize,
    /// Exclusive.
    pub end_index: usize,
    pub left_padding: f64,
    pub right_padding: f64,
}

/// Locates the visible columns for a horizontal scroll position.
///
/// If everything fits in `container_width` minus the pinned widths, the whole list is visible.
/// Otherwise the first column is the first whose end is at or after `scroll_left`, and the last
/// is the last whose start is at or before the right edge of the viewport.
pub fn calculate_visible_columns_from_metrics(
    scroll_left: f64,
    container_width: f64,
    metrics: &ColumnMetrics,
    pinned: PinnedWidths,
) -> VisibleColumnRange {
    let n = metrics.widths.len().min(metrics.offsets.len());
    if n == 0 {
        return VisibleColumnRange::default();
    }

    let pinned_left = finite_or(pinned.left, 0.0).max(0.0);
    let pinned_right = finite_or(pinned.right, 0.0).max(0.0);
    let viewport = (finite_or(container_width, 0.0) - pinned_left - pinned_right).max(0.0);
    if metrics.total_width <= viewport {
        return VisibleColumnRange {
            start_index: 0,
            end_index: n,
            left_padding: 0.0,
            right_padding: 0.0,
        };
    }

    let max_scroll = (metrics.total_width - viewport).max(0.0);
    let view_start = clamp(finite_or(scroll_left, 0.0), 0.0, max_scroll);
    let view_end = view_start + viewport;

    let start_index = first_ending_at_or_after(metrics, n, view_start);
    let end_index = metrics.offsets[..n]
        .partition_point(|&offset| offset <= view_end)
        .clamp(start_index, n);

    let left_padding = metrics.start_of(start_index);
    let right_padding = if end_index == 0 {
        metrics.total_width
    } else {
        (metrics.total_width - metrics.end_of(end_index - 1)).max(0.0)
    };

    VisibleColumnRange {
        start_index,
        end_index,
        left_padding,
        right_padding,
    }
}

/// Lower-bound search for the first column whose end is `>= position`.
fn first_ending_at_or_after(metrics: &ColumnMetrics, n: usize, position: f64) -> usize {
    let mut lo = 0usize;
    let mut hi = n;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if metrics.offsets[mid] + metrics.widths[mid] < position {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

/// A [`VisibleColumnRange`] together with the metrics it was computed from.
#[derive(Clone, Debug, Default)]
pub struct VisibleColumns {
    pub range: VisibleColumnRange,
    pub metrics: Arc<ColumnMetrics>,
}

impl VisibleColumns {
    pub fn widths(&self) -> &[f64] {
        &self.metrics.widths
    }

    pub fn offsets(&self) -> &[f64] {
        &self.metrics.offsets
    }

    pub fn total_width(&self) -> f64 {
        self.metrics.total_width
    }
}

/// A two-slot pool of [`VisibleColumns`] results, reused round-robin.
///
/// The returned reference is valid until the next call; copy fields out to keep them.
#[derive(Clone, Debug, Default)]
pub struct VisibleColumnsPool {
    slots: [VisibleColumns; POOL_SLOTS],
    cursor: usize,
}

impl VisibleColumnsPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calculate(
        &mut self,
        scroll_left: f64,
        container_width: f64,
        metrics: &Arc<ColumnMetrics>,
        pinned: PinnedWidths,
    ) -> &VisibleColumns {
        let slot = self.cursor;
        self.cursor = (self.cursor + 1) % POOL_SLOTS;

        let out = &mut self.slots[slot];
        out.range =
            calculate_visible_columns_from_metrics(scroll_left, container_width, metrics, pinned);
        if !Arc::ptr_eq(&out.metrics, metrics) {
            out.metrics = Arc::clone(metrics);
        }
        out
    }
}
