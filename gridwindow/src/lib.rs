//! A headless windowing engine for large virtualized grids.
//!
//! For the per-frame driver that wires overscan controllers to virtualizers, see the
//! `gridwindow-adapter` crate.
//!
//! This crate decides, every scroll frame, which rows and columns must be materialized:
//! - [`AxisVirtualizer`]: the visible window on one axis, with a pluggable [`AxisStrategy`]
//!   per sizing mode ([`FixedSizeStrategy`], [`MeasuredSizeStrategy`], [`ColumnStrategy`]).
//! - [`resolve_overscan_buckets`]: direction-biased split of an overscan budget.
//! - [`VerticalOverscanController`] / [`HorizontalOverscanController`]: velocity-predictive
//!   overscan budgets with teleport detection and decay.
//! - [`accumulate_column_widths`] / [`calculate_visible_columns_from_metrics`]: column offset
//!   tables and binary-search lookup.
//! - [`RowHeightCache`]: bounded cache of measured row heights.
//!
//! It is UI-agnostic and does no I/O. A host layer is expected to provide:
//! - viewport sizes and scroll offsets
//! - item counts and size estimates
//! - row measurements (for auto-sized rows)
//!
//! Results are written into reused buffers: a returned reference is valid until the next call
//! on the same instance.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod buckets;
mod columns;
mod diagnostics;
mod fenwick;
mod math;
mod overscan;
mod row_height;
mod strategy;
mod types;
mod virtualizer;

#[cfg(test)]
mod tests;

pub use buckets::{OverscanBuckets, resolve_overscan_buckets};
pub use columns::{
    ColumnMetrics, ColumnMetricsCache, ColumnSizingDefaults, ColumnSpec, DEFAULT_COLUMN_WIDTH,
    PinnedWidths, VisibleColumnRange, VisibleColumns, VisibleColumnsPool,
    accumulate_column_widths, accumulate_column_widths_with,
    calculate_visible_columns_from_metrics, resolve_column_width, resolve_column_width_with,
};
pub use diagnostics::{Diagnostic, DiagnosticsHook};
pub use math::{clamp, finite_or, positive_or, split_lead_trail};
pub use overscan::{
    DEFAULT_TELEPORT_MULTIPLIER, HorizontalOverscanController, OverscanOutput, OverscanProfile,
    OverscanSample, OverscanState, VerticalOverscanController,
};
pub use row_height::{
    DEFAULT_ROW_HEIGHT, DEFAULT_ROW_HEIGHT_LIMIT, MAX_ROW_HEIGHT, MIN_ROW_HEIGHT, RowHeightCache,
    RowHeightSnapshot, RowMeasurement,
};
pub use strategy::{ColumnStrategy, FixedSizeStrategy, MeasuredSizeStrategy};
pub use types::{Axis, AxisMeta, ColumnMeta, RowMeta, ScrollDirection, SpacerPayload};
pub use virtualizer::{
    AxisContext, AxisRange, AxisStrategy, AxisVirtualizer, AxisVirtualizerState, StrategyContext,
};
