use crate::buckets::{OverscanBuckets, resolve_overscan_buckets};
use crate::diagnostics::{self, Diagnostic, DiagnosticsHook};
use crate::math::{clamp, finite_or, round};
use crate::{Axis, AxisMeta};

/// Per-frame input of an [`AxisVirtualizer`]. Built fresh by the caller on every update.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisContext<M> {
    pub axis: Axis,
    pub viewport_size: f64,
    pub scroll_offset: f64,
    pub virtualization_enabled: bool,
    pub estimated_item_size: f64,
    pub total_count: usize,
    /// Overscan budget in items, usually produced by a dynamic overscan controller.
    pub overscan: f64,
    pub meta: M,
}

/// What a strategy sees while the virtualizer is computing a window.
#[derive(Debug)]
pub struct StrategyContext<'a, M> {
    pub context: &'a AxisContext<M>,
    /// `false` when the whole count is the window.
    pub virtualizing: bool,
    pub visible_count: usize,
    pub pool_size: usize,
    pub overscan_leading: usize,
    pub overscan_trailing: usize,
}

/// A raw `[start, end)` index range written by a strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisRange {
    pub start: usize,
    pub end: usize,
}

/// Axis-specific sizing and offset math plugged into an [`AxisVirtualizer`].
///
/// Strategies may cache derived data (prefix sums, column metrics), hence `&mut self`.
pub trait AxisStrategy {
    type Meta: AxisMeta;
    /// Extra per-update output, written in place to avoid allocation.
    type Payload: Default;

    /// Number of items needed to cover the viewport. Only called while virtualizing.
    fn compute_visible_count(&mut self, context: &AxisContext<Self::Meta>) -> usize;

    /// Clamps a scroll offset into the scrollable range.
    fn clamp_scroll(&mut self, offset: f64, frame: &StrategyContext<'_, Self::Meta>) -> f64;

    /// Writes the pooled window for `offset` into `range`.
    ///
    /// `range.end - range.start` should equal `frame.pool_size`, with `frame.overscan_trailing`
    /// items before the first visible one.
    fn compute_range(
        &mut self,
        offset: f64,
        frame: &StrategyContext<'_, Self::Meta>,
        range: &mut AxisRange,
        payload: &mut Self::Payload,
    );

    /// Start offset of `index`. `None` lets the virtualizer fall back to
    /// `index * estimated_item_size`.
    fn offset_for_index(
        &mut self,
        index: usize,
        frame: &StrategyContext<'_, Self::Meta>,
    ) -> Option<f64> {
        let _ = (index, frame);
        None
    }

    /// Typical item size for `context`, used to express scroll distances in items.
    fn average_item_size(&mut self, context: &AxisContext<Self::Meta>) -> f64 {
        context.estimated_item_size
    }
}

/// The window computed by the last [`AxisVirtualizer::update`].
///
/// Invariants: `start_index <= end_index <= total_count` and
/// `pool_size == end_index - start_index`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisVirtualizerState<P> {
    pub offset: f64,
    pub viewport_size: f64,
    pub total_count: usize,
    pub start_index: usize,
    pub end_index: usize,
    pub visible_count: usize,
    pub pool_size: usize,
    pub overscan_leading: usize,
    pub overscan_trailing: usize,
    pub payload: P,
}

impl<P> AxisVirtualizerState<P> {
    pub fn contains(&self, index: usize) -> bool {
        (self.start_index..self.end_index).contains(&index)
    }
}

#[derive(Clone, Copy, Debug)]
struct BucketMemo {
    available: usize,
    direction: u64,
    buckets: OverscanBuckets,
}

/// A generic windowing engine for one scroll axis.
///
/// The virtualizer owns a single state record that is rewritten in place on every
/// [`update`](Self::update); the returned reference is valid until the next call. Copy fields
/// out if you need a stable snapshot.
pub struct AxisVirtualizer<S: AxisStrategy> {
    strategy: S,
    state: AxisVirtualizerState<S::Payload>,
    range: AxisRange,
    estimated_item_size: f64,
    bucket_memo: Option<BucketMemo>,
    virtualizing: bool,
    diagnostics: Option<DiagnosticsHook>,
}

impl<S: AxisStrategy> AxisVirtualizer<S> {
    pub fn new(strategy: S) -> Self {
        Self {
            strategy,
            state: AxisVirtualizerState::default(),
            range: AxisRange::default(),
            estimated_item_size: 0.0,
            bucket_memo: None,
            virtualizing: false,
            diagnostics: None,
        }
    }

    pub fn with_diagnostics(mut self, hook: Option<DiagnosticsHook>) -> Self {
        self.diagnostics = hook;
        self
    }

    pub fn set_diagnostics(&mut self, hook: Option<DiagnosticsHook>) {
        self.diagnostics = hook;
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Mutable access to the strategy (e.g. to ingest measurements).
    ///
    /// The state is not recomputed until the next [`update`](Self::update).
    pub fn strategy_mut(&mut self) -> &mut S {
        &mut self.strategy
    }

    pub fn into_strategy(self) -> S {
        self.strategy
    }

    pub fn state(&self) -> &AxisVirtualizerState<S::Payload> {
        &self.state
    }

    /// Recomputes the window for `context`.
    pub fn update(&mut self, context: &AxisContext<S::Meta>) -> &AxisVirtualizerState<S::Payload> {
        let total = context.total_count;
        let virtualizing = context.virtualization_enabled && total > 0;
        if virtualizing != self.virtualizing {
            vdebug!(axis = ?context.axis, virtualizing, "virtualization toggled");
            self.virtualizing = virtualizing;
        }

        let visible_count = if virtualizing {
            self.strategy.compute_visible_count(context).max(1)
        } else {
            total
        };
        let overscan_base = if virtualizing {
            round(finite_or(context.overscan, 0.0).max(0.0)) as usize
        } else {
            0
        };
        let pool_size = if virtualizing {
            total.min(visible_count.saturating_add(overscan_base).max(visible_count))
        } else {
            total
        };

        let available = pool_size.saturating_sub(visible_count);
        let buckets = if virtualizing && available > 0 {
            self.buckets_for(available, context.meta.scroll_direction())
        } else {
            OverscanBuckets::default()
        };

        let frame = StrategyContext {
            context,
            virtualizing,
            visible_count,
            pool_size,
            overscan_leading: buckets.leading,
            overscan_trailing: buckets.trailing,
        };
        let offset = self
            .strategy
            .clamp_scroll(finite_or(context.scroll_offset, 0.0), &frame);
        self.range = AxisRange::default();
        self.strategy
            .compute_range(offset, &frame, &mut self.range, &mut self.state.payload);

        let (raw_start, raw_end) = if virtualizing {
            (self.range.start, self.range.end)
        } else {
            (0, total)
        };
        debug_assert!(
            raw_start <= raw_end,
            "strategy produced an inverted range ({raw_start}..{raw_end})"
        );
        let max_pool_start = total.saturating_sub(pool_size);
        let start_index = raw_start.min(max_pool_start);
        let end_index = total.min(raw_end.max(start_index));

        let state = &mut self.state;
        state.offset = offset;
        state.viewport_size = finite_or(context.viewport_size, 0.0).max(0.0);
        state.total_count = total;
        state.start_index = start_index;
        state.end_index = end_index;
        state.visible_count = visible_count;
        state.pool_size = end_index - start_index;
        state.overscan_leading = buckets.leading;
        state.overscan_trailing = buckets.trailing;
        self.estimated_item_size = finite_or(context.estimated_item_size, 0.0).max(0.0);

        vtrace!(
            axis = ?context.axis,
            offset,
            start_index,
            end_index,
            visible_count,
            "axis update"
        );
        diagnostics::emit(
            self.diagnostics.as_ref(),
            Diagnostic::AxisUpdated {
                axis: context.axis,
                start_index,
                end_index,
                pool_size: self.state.pool_size,
                overscan_leading: buckets.leading,
                overscan_trailing: buckets.trailing,
            },
        );
        &self.state
    }

    /// Start offset of `index` along the axis, for `context`.
    ///
    /// Delegates to the strategy; falls back to `clamp(index, 0, total - 1) *
    /// estimated_item_size`.
    pub fn offset_for_index(&mut self, index: usize, context: &AxisContext<S::Meta>) -> f64 {
        let frame = StrategyContext {
            context,
            virtualizing: self.virtualizing,
            visible_count: self.state.visible_count,
            pool_size: self.state.pool_size,
            overscan_leading: self.state.overscan_leading,
            overscan_trailing: self.state.overscan_trailing,
        };
        if let Some(offset) = self.strategy.offset_for_index(index, &frame) {
            return offset;
        }
        let total = context.total_count;
        if total == 0 {
            return 0.0;
        }
        let size = finite_or(context.estimated_item_size, self.estimated_item_size).max(0.0);
        clamp(index as f64, 0.0, (total - 1) as f64) * size
    }

    /// Typical item size as seen by the strategy (measured average, mean column width).
    pub fn average_item_size(&mut self, context: &AxisContext<S::Meta>) -> f64 {
        self.strategy.average_item_size(context)
    }

    /// Whether `index` is inside the window of the last update.
    pub fn is_index_visible(&self, index: usize) -> bool {
        self.state.contains(index)
    }

    fn buckets_for(&mut self, available: usize, direction: f64) -> OverscanBuckets {
        let direction = clamp(finite_or(direction, 0.0), -1.0, 1.0).to_bits();
        if let Some(memo) = self.bucket_memo {
            if memo.available == available && memo.direction == direction {
                return memo.buckets;
            }
        }
        let buckets = resolve_overscan_buckets(available as f64, f64::from_bits(direction));
        self.bucket_memo = Some(BucketMemo {
            available,
            direction,
            buckets,
        });
        buckets
    }
}

impl<S> core::fmt::Debug for AxisVirtualizer<S>
where
    S: AxisStrategy + core::fmt::Debug,
    S::Payload: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AxisVirtualizer")
            .field("strategy", &self.strategy)
            .field("state", &self.state)
            .field("virtualizing", &self.virtualizing)
            .finish_non_exhaustive()
    }
}

impl<S> Clone for AxisVirtualizer<S>
where
    S: AxisStrategy + Clone,
    S::Payload: Clone,
{
    fn clone(&self) -> Self {
        Self {
            strategy: self.strategy.clone(),
            state: self.state.clone(),
            range: self.range,
            estimated_item_size: self.estimated_item_size,
            bucket_memo: self.bucket_memo,
            virtualizing: self.virtualizing,
            diagnostics: self.diagnostics.clone(),
        }
    }
}
