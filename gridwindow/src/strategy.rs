//! Built-in [`AxisStrategy`] implementations, one per sizing mode.

use alloc::sync::Arc;

use crate::columns::{
    ColumnMetrics, ColumnMetricsCache, ColumnSizingDefaults, ColumnSpec, PinnedWidths,
    VisibleColumnsPool, calculate_visible_columns_from_metrics,
};
use crate::fenwick::ExtentIndex;
use crate::math::{ceil, clamp, finite_or, floor, positive_or, to_index};
use crate::row_height::{RowHeightCache, RowMeasurement};
use crate::{
    AxisContext, AxisRange, AxisStrategy, ColumnMeta, RowMeta, SpacerPayload, StrategyContext,
};

/// Places the pooled window so that `trailing` items precede the first visible one, and keeps
/// it inside `[0, count)`.
fn place_window(
    first_visible: usize,
    count: usize,
    frame_pool: usize,
    trailing: usize,
) -> AxisRange {
    let pool = frame_pool.min(count);
    let start = first_visible
        .saturating_sub(trailing)
        .min(count.saturating_sub(pool));
    AxisRange {
        start,
        end: start + pool,
    }
}

fn viewport_of<M>(context: &AxisContext<M>) -> f64 {
    finite_or(context.viewport_size, 0.0).max(0.0)
}

/// Every item has the same size: `AxisContext::estimated_item_size`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedSizeStrategy;

impl FixedSizeStrategy {
    pub fn new() -> Self {
        Self
    }

    fn item_size(context: &AxisContext<RowMeta>) -> f64 {
        positive_or(context.estimated_item_size, 1.0)
    }
}

impl AxisStrategy for FixedSizeStrategy {
    type Meta = RowMeta;
    type Payload = SpacerPayload;

    fn compute_visible_count(&mut self, context: &AxisContext<RowMeta>) -> usize {
        let viewport = viewport_of(context);
        if viewport == 0.0 {
            return 1;
        }
        // +1: a misaligned offset shows a partial item at both edges.
        let fit = to_index(ceil(viewport / Self::item_size(context)));
        fit.saturating_add(1).min(context.total_count)
    }

    fn clamp_scroll(&mut self, offset: f64, frame: &StrategyContext<'_, RowMeta>) -> f64 {
        let context = frame.context;
        let total_size = context.total_count as f64 * Self::item_size(context);
        clamp(offset, 0.0, (total_size - viewport_of(context)).max(0.0))
    }

    fn compute_range(
        &mut self,
        offset: f64,
        frame: &StrategyContext<'_, RowMeta>,
        range: &mut AxisRange,
        payload: &mut SpacerPayload,
    ) {
        let context = frame.context;
        let count = context.total_count;
        let size = Self::item_size(context);
        let first = to_index(floor(offset / size)).min(count.saturating_sub(1));
        *range = place_window(first, count, frame.pool_size, frame.overscan_trailing);

        payload.total_size = count as f64 * size;
        payload.before = range.start as f64 * size;
        payload.after = (count - range.end) as f64 * size;
    }

    fn offset_for_index(
        &mut self,
        index: usize,
        frame: &StrategyContext<'_, RowMeta>,
    ) -> Option<f64> {
        let context = frame.context;
        let last = context.total_count.checked_sub(1)?;
        Some(index.min(last) as f64 * Self::item_size(context))
    }

    fn average_item_size(&mut self, context: &AxisContext<RowMeta>) -> f64 {
        Self::item_size(context)
    }
}

/// Rows sized from measurements ("auto" mode).
///
/// Rows with a cached height in the [`RowHeightCache`] use it; every other row uses the cache's
/// running average, or `AxisContext::estimated_item_size` while nothing has been measured.
/// Offsets come from an extent index that is updated in place as measurements arrive; only a
/// change of the row count rebuilds it.
#[derive(Clone, Debug, Default)]
pub struct MeasuredSizeStrategy {
    heights: RowHeightCache,
    extents: ExtentIndex,
    estimate: f64,
}

impl MeasuredSizeStrategy {
    pub fn new(heights: RowHeightCache) -> Self {
        Self {
            heights,
            ..Self::default()
        }
    }

    pub fn heights(&self) -> &RowHeightCache {
        &self.heights
    }

    /// Records measured rows. Returns `true` if any cached height changed.
    pub fn ingest<I>(&mut self, measurements: I) -> bool
    where
        I: IntoIterator,
        I::Item: Into<RowMeasurement>,
    {
        let extents = &mut self.extents;
        self.heights
            .ingest_with(measurements, |index, previous, current| {
                extents.apply(index, previous, current);
            })
    }

    pub fn delete_range(&mut self, start: usize, end: usize) {
        let extents = &mut self.extents;
        self.heights
            .delete_range_with(start, end, |index, previous, current| {
                extents.apply(index, previous, current);
            });
    }

    pub fn clear(&mut self) {
        self.heights.clear();
        let len = self.extents.len();
        self.extents.reset(len);
    }

    /// The height assumed for rows that are not in the cache.
    pub fn estimated_height(&self, fallback: f64) -> f64 {
        self.heights.resolve_estimated_height(fallback)
    }

    /// Size assumed for `index` after the last sync. `None` past the end.
    pub fn item_size(&self, index: usize) -> Option<f64> {
        (index < self.extents.len()).then(|| self.heights.get(index).unwrap_or(self.estimate))
    }

    fn sync(&mut self, context: &AxisContext<RowMeta>) {
        self.estimate = self
            .heights
            .resolve_estimated_height(context.estimated_item_size);
        let count = context.total_count;
        if self.extents.len() == count {
            return;
        }
        vdebug!(count, cached = self.heights.len(), "rebuilding row extent index");
        self.extents.reset(count);
        for (index, height) in self.heights.iter() {
            self.extents.apply(index, None, Some(height));
        }
    }

    fn index_at(&self, offset: f64) -> usize {
        self.extents
            .lower_bound(offset, self.estimate)
            .min(self.extents.len().saturating_sub(1))
    }

    fn total_size(&self) -> f64 {
        self.extents.total(self.estimate)
    }

    fn max_scroll(&self, viewport: f64) -> f64 {
        (self.total_size() - viewport).max(0.0)
    }
}

impl AxisStrategy for MeasuredSizeStrategy {
    type Meta = RowMeta;
    type Payload = SpacerPayload;

    fn compute_visible_count(&mut self, context: &AxisContext<RowMeta>) -> usize {
        self.sync(context);
        let viewport = viewport_of(context);
        if viewport == 0.0 || self.extents.len() == 0 {
            return 1;
        }
        let offset = clamp(finite_or(context.scroll_offset, 0.0), 0.0, self.max_scroll(viewport));
        let first = self.index_at(offset);
        let last = self.index_at(offset + viewport);
        last + 1 - first
    }

    fn clamp_scroll(&mut self, offset: f64, frame: &StrategyContext<'_, RowMeta>) -> f64 {
        self.sync(frame.context);
        clamp(offset, 0.0, self.max_scroll(viewport_of(frame.context)))
    }

    fn compute_range(
        &mut self,
        offset: f64,
        frame: &StrategyContext<'_, RowMeta>,
        range: &mut AxisRange,
        payload: &mut SpacerPayload,
    ) {
        self.sync(frame.context);
        let count = self.extents.len();
        let first = self.index_at(offset);
        *range = place_window(first, count, frame.pool_size, frame.overscan_trailing);

        let total = self.total_size();
        payload.total_size = total;
        payload.before = self.extents.prefix_sum(range.start, self.estimate);
        payload.after = (total - self.extents.prefix_sum(range.end, self.estimate)).max(0.0);
    }

    fn offset_for_index(
        &mut self,
        index: usize,
        frame: &StrategyContext<'_, RowMeta>,
    ) -> Option<f64> {
        self.sync(frame.context);
        let last = self.extents.len().checked_sub(1)?;
        Some(self.extents.prefix_sum(index.min(last), self.estimate))
    }

    fn average_item_size(&mut self, context: &AxisContext<RowMeta>) -> f64 {
        self.sync(context);
        match self.extents.len() {
            0 => self.estimate,
            n => self.total_size() / n as f64,
        }
    }
}

/// Columns with individual widths, located through the column sizing index.
///
/// The column list is keyed by identity: replace it with [`ColumnStrategy::set_columns`] and a
/// new `Arc` when it changes. Pinned widths come from [`ColumnMeta`].
#[derive(Clone, Debug)]
pub struct ColumnStrategy {
    columns: Arc<[ColumnSpec]>,
    zoom: f64,
    cache: ColumnMetricsCache,
    metrics: Arc<ColumnMetrics>,
    visible: VisibleColumnsPool,
}

impl ColumnStrategy {
    pub fn new(columns: Arc<[ColumnSpec]>, zoom: f64) -> Self {
        Self::with_defaults(columns, zoom, ColumnSizingDefaults::default())
    }

    pub fn with_defaults(
        columns: Arc<[ColumnSpec]>,
        zoom: f64,
        defaults: ColumnSizingDefaults,
    ) -> Self {
        let mut cache = ColumnMetricsCache::new(defaults);
        let metrics = cache.accumulate(&columns, zoom);
        Self {
            columns,
            zoom,
            cache,
            metrics,
            visible: VisibleColumnsPool::new(),
        }
    }

    pub fn columns(&self) -> &Arc<[ColumnSpec]> {
        &self.columns
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn metrics(&self) -> &Arc<ColumnMetrics> {
        &self.metrics
    }

    pub fn set_columns(&mut self, columns: Arc<[ColumnSpec]>) {
        self.columns = columns;
        self.metrics = self.cache.accumulate(&self.columns, self.zoom);
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
        self.metrics = self.cache.accumulate(&self.columns, self.zoom);
    }

    fn pinned(meta: &ColumnMeta) -> PinnedWidths {
        PinnedWidths {
            left: meta.pinned_left_width,
            right: meta.pinned_right_width,
        }
    }

    fn scroll_viewport(context: &AxisContext<ColumnMeta>) -> f64 {
        let pinned = Self::pinned(&context.meta);
        let left = finite_or(pinned.left, 0.0).max(0.0);
        let right = finite_or(pinned.right, 0.0).max(0.0);
        (viewport_of(context) - left - right).max(0.0)
    }

    fn count(&self, context: &AxisContext<ColumnMeta>) -> usize {
        self.metrics.len().min(context.total_count)
    }
}

impl AxisStrategy for ColumnStrategy {
    type Meta = ColumnMeta;
    type Payload = SpacerPayload;

    fn compute_visible_count(&mut self, context: &AxisContext<ColumnMeta>) -> usize {
        let visible = self.visible.calculate(
            finite_or(context.scroll_offset, 0.0),
            viewport_of(context),
            &self.metrics,
            Self::pinned(&context.meta),
        );
        let count = visible.range.end_index - visible.range.start_index;
        count.min(self.count(context))
    }

    fn clamp_scroll(&mut self, offset: f64, frame: &StrategyContext<'_, ColumnMeta>) -> f64 {
        let viewport = Self::scroll_viewport(frame.context);
        clamp(offset, 0.0, (self.metrics.total_width - viewport).max(0.0))
    }

    fn compute_range(
        &mut self,
        offset: f64,
        frame: &StrategyContext<'_, ColumnMeta>,
        range: &mut AxisRange,
        payload: &mut SpacerPayload,
    ) {
        let context = frame.context;
        let count = self.count(context);
        let visible = calculate_visible_columns_from_metrics(
            offset,
            viewport_of(context),
            &self.metrics,
            Self::pinned(&context.meta),
        );
        let first = visible.start_index.min(count.saturating_sub(1));
        *range = place_window(first, count, frame.pool_size, frame.overscan_trailing);

        let total = self.metrics.total_width;
        payload.total_size = total;
        payload.before = self.metrics.start_of(range.start).min(total);
        payload.after = if range.end == 0 {
            total
        } else {
            (total - self.metrics.end_of(range.end - 1)).max(0.0)
        };
    }

    fn offset_for_index(
        &mut self,
        index: usize,
        frame: &StrategyContext<'_, ColumnMeta>,
    ) -> Option<f64> {
        let last = self.count(frame.context).checked_sub(1)?;
        Some(self.metrics.start_of(index.min(last)))
    }

    fn average_item_size(&mut self, context: &AxisContext<ColumnMeta>) -> f64 {
        if self.metrics.is_empty() {
            return context.estimated_item_size;
        }
        self.metrics.total_width / self.metrics.len() as f64
    }
}
