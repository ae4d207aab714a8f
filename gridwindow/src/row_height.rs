//! A bounded cache of measured row heights.
//!
//! Rows in "auto" sizing mode are measured by the host as they are rendered. The cache keeps the
//! last measured height per row index so later layout passes can reuse it, and exposes a
//! running average used as the estimate for rows that were never measured.

use alloc::collections::{BTreeMap, VecDeque};

use crate::math::{abs, clamp, finite_or, trunc};

pub const MIN_ROW_HEIGHT: f64 = 8.0;
pub const MAX_ROW_HEIGHT: f64 = 640.0;
pub const DEFAULT_ROW_HEIGHT: f64 = 32.0;
pub const DEFAULT_ROW_HEIGHT_LIMIT: usize = 512;

/// Measurements closer than this to the cached value are ignored.
const HEIGHT_EPSILON: f64 = 0.01;

/// One measured row.
///
/// `index` is a float so hosts can forward raw layout numbers; it is truncated and the
/// measurement dropped if it is negative or not finite.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RowMeasurement {
    pub index: f64,
    pub height: f64,
}

impl RowMeasurement {
    pub fn new(index: usize, height: f64) -> Self {
        Self {
            index: index as f64,
            height,
        }
    }
}

impl From<(usize, f64)> for RowMeasurement {
    fn from((index, height): (usize, f64)) -> Self {
        Self::new(index, height)
    }
}

/// Summary statistics of a [`RowHeightCache`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RowHeightSnapshot {
    pub size: usize,
    pub limit: usize,
    /// `0` when the cache is empty.
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

/// Row index → last measured height, bounded to `limit` entries.
///
/// Eviction is FIFO by first insertion: once the cache grows past `limit`, the earliest inserted
/// index is dropped regardless of how recently it was read or re-measured. Updating the height
/// of a cached row keeps its position.
#[derive(Clone, Debug)]
pub struct RowHeightCache {
    heights: BTreeMap<usize, f64>,
    order: VecDeque<usize>,
    sum: f64,
    limit: usize,
}

impl RowHeightCache {
    pub fn new(limit: usize) -> Self {
        Self {
            heights: BTreeMap::new(),
            order: VecDeque::new(),
            sum: 0.0,
            limit,
        }
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Changes the bound, evicting the oldest entries if the cache is now over it.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
        self.evict_overflow(&mut |_: usize, _: Option<f64>, _: Option<f64>| {});
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.heights.get(&index).copied()
    }

    /// Cached `(index, height)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.heights.iter().map(|(&index, &height)| (index, height))
    }

    /// Clamps a height into `[MIN_ROW_HEIGHT, MAX_ROW_HEIGHT]`.
    pub fn normalize_height(height: f64) -> f64 {
        clamp(
            finite_or(height, DEFAULT_ROW_HEIGHT),
            MIN_ROW_HEIGHT,
            MAX_ROW_HEIGHT,
        )
    }

    /// Stores a batch of measurements.
    ///
    /// Returns `true` if at least one cached height was added or changed.
    pub fn ingest<I>(&mut self, measurements: I) -> bool
    where
        I: IntoIterator,
        I::Item: Into<RowMeasurement>,
    {
        self.ingest_with(measurements, |_, _, _| {})
    }

    /// [`ingest`](Self::ingest), reporting every cached height that changed as
    /// `(index, previous, current)`, evictions included.
    pub(crate) fn ingest_with<I, F>(&mut self, measurements: I, mut on_change: F) -> bool
    where
        I: IntoIterator,
        I::Item: Into<RowMeasurement>,
        F: FnMut(usize, Option<f64>, Option<f64>),
    {
        let mut changed = false;
        for m in measurements {
            let m = m.into();
            if !m.index.is_finite() || m.index < 0.0 || !m.height.is_finite() {
                vwarn!(index = m.index, height = m.height, "dropping invalid row measurement");
                continue;
            }
            let index = trunc(m.index) as usize;
            let height = Self::normalize_height(m.height);

            match self.heights.get_mut(&index) {
                Some(cached) => {
                    if abs(*cached - height) <= HEIGHT_EPSILON {
                        continue;
                    }
                    let previous = *cached;
                    self.sum += height - previous;
                    *cached = height;
                    on_change(index, Some(previous), Some(height));
                }
                None => {
                    // Nothing survives a zero limit.
                    if self.limit == 0 {
                        continue;
                    }
                    self.heights.insert(index, height);
                    self.order.push_back(index);
                    self.sum += height;
                    on_change(index, None, Some(height));
                    self.evict_overflow(&mut on_change);
                }
            }
            changed = true;
        }
        changed
    }

    /// Returns the average cached height, or the normalized `fallback` when empty.
    pub fn resolve_estimated_height(&self, fallback: f64) -> f64 {
        if self.heights.is_empty() {
            return Self::normalize_height(fallback);
        }
        self.sum / self.heights.len() as f64
    }

    /// Removes every cached index in `start..end`.
    pub fn delete_range(&mut self, start: usize, end: usize) {
        self.delete_range_with(start, end, |_, _, _| {});
    }

    /// [`delete_range`](Self::delete_range), reporting each removed row as
    /// `(index, Some(height), None)`.
    pub(crate) fn delete_range_with<F>(&mut self, start: usize, end: usize, mut on_change: F)
    where
        F: FnMut(usize, Option<f64>, Option<f64>),
    {
        if start >= end || self.heights.is_empty() {
            return;
        }
        let heights = &mut self.heights;
        let mut removed = 0.0;
        self.order.retain(|&index| {
            if !(start..end).contains(&index) {
                return true;
            }
            if let Some(h) = heights.remove(&index) {
                removed += h;
                on_change(index, Some(h), None);
            }
            false
        });
        self.sum -= removed;
        if self.heights.is_empty() {
            self.sum = 0.0;
        }
    }

    pub fn snapshot(&self) -> RowHeightSnapshot {
        if self.heights.is_empty() {
            return RowHeightSnapshot {
                limit: self.limit,
                ..RowHeightSnapshot::default()
            };
        }
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &h in self.heights.values() {
            min = min.min(h);
            max = max.max(h);
        }
        RowHeightSnapshot {
            size: self.heights.len(),
            limit: self.limit,
            average: self.sum / self.heights.len() as f64,
            min,
            max,
        }
    }

    pub fn clear(&mut self) {
        self.heights.clear();
        self.order.clear();
        self.sum = 0.0;
    }

    fn evict_overflow<F>(&mut self, on_change: &mut F)
    where
        F: FnMut(usize, Option<f64>, Option<f64>),
    {
        while self.heights.len() > self.limit {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if let Some(h) = self.heights.remove(&oldest) {
                vdebug!(index = oldest, "evicting cached row height");
                self.sum -= h;
                on_change(oldest, Some(h), None);
            }
        }
        if self.heights.is_empty() {
            self.sum = 0.0;
        }
    }
}

impl Default for RowHeightCache {
    fn default() -> Self {
        Self::new(DEFAULT_ROW_HEIGHT_LIMIT)
    }
}
