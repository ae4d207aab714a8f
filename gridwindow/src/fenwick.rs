use alloc::vec::Vec;

/// Prefix sums over `f64` values with `O(log n)` point updates.
#[derive(Clone, Debug, Default)]
pub(crate) struct Fenwick {
    tree: Vec<f64>, // 1-indexed
    max_bit: usize,
}

impl Fenwick {
    /// Resizes to `n` zeroed values, reusing the allocation.
    pub(crate) fn reset(&mut self, n: usize) {
        self.tree.clear();
        self.tree.resize(n + 1, 0.0);
        self.max_bit = if n == 0 {
            0
        } else {
            highest_power_of_two_leq(n)
        };
    }

    pub(crate) fn len(&self) -> usize {
        self.tree.len().saturating_sub(1)
    }

    pub(crate) fn add(&mut self, index: usize, delta: f64) {
        let n = self.len();
        if index >= n {
            return;
        }
        let mut i = index + 1;
        while i <= n {
            self.tree[i] += delta;
            i += lsb(i);
        }
    }

    /// Sum of the first `count` values.
    pub(crate) fn prefix_sum(&self, count: usize) -> f64 {
        let mut i = count.min(self.len());
        let mut sum = 0.0;
        while i > 0 {
            sum += self.tree[i];
            i &= i - 1;
        }
        sum
    }
}

/// Prefix sums over item extents where measured items carry their own extent and every other
/// item uses a shared estimate.
///
/// One tree holds the measured extents, the other the number of measured items, so any node
/// covering `len` items is worth `sum + (len - count) * estimate`. Changing the estimate is
/// `O(1)` and a measurement is `O(log n)`.
#[derive(Clone, Debug, Default)]
pub(crate) struct ExtentIndex {
    sums: Fenwick,
    counts: Fenwick,
    measured_sum: f64,
    measured_count: usize,
}

impl ExtentIndex {
    /// Resizes to `n` unmeasured items, reusing the allocations.
    pub(crate) fn reset(&mut self, n: usize) {
        self.sums.reset(n);
        self.counts.reset(n);
        self.measured_sum = 0.0;
        self.measured_count = 0;
    }

    pub(crate) fn len(&self) -> usize {
        self.sums.len()
    }

    /// Applies a change of the measured extent of `index` (`None` = unmeasured).
    ///
    /// Indexes past the end are ignored.
    pub(crate) fn apply(&mut self, index: usize, previous: Option<f64>, current: Option<f64>) {
        if index >= self.len() {
            return;
        }
        let delta = current.unwrap_or(0.0) - previous.unwrap_or(0.0);
        self.sums.add(index, delta);
        self.measured_sum += delta;
        match (previous.is_some(), current.is_some()) {
            (false, true) => {
                self.counts.add(index, 1.0);
                self.measured_count += 1;
            }
            (true, false) => {
                self.counts.add(index, -1.0);
                self.measured_count -= 1;
            }
            _ => {}
        }
    }

    /// Extent of the first `count` items, i.e. the start offset of item `count`.
    pub(crate) fn prefix_sum(&self, count: usize, estimate: f64) -> f64 {
        let count = count.min(self.len());
        let measured = self.counts.prefix_sum(count);
        self.sums.prefix_sum(count) + (count as f64 - measured) * estimate
    }

    pub(crate) fn total(&self, estimate: f64) -> f64 {
        let unmeasured = self.len() - self.measured_count;
        self.measured_sum + unmeasured as f64 * estimate
    }

    /// Returns the number of items whose end offset is <= `target`.
    ///
    /// `lower_bound(offset, estimate)` is the index of the item covering `offset` (unclamped).
    pub(crate) fn lower_bound(&self, mut target: f64, estimate: f64) -> usize {
        let n = self.len();
        if n == 0 {
            return 0;
        }

        let mut idx = 0usize;
        let mut bit = self.sums.max_bit;
        while bit != 0 {
            let next = idx + bit;
            if next <= n {
                // `next` is a multiple of `bit`, so its node covers exactly `bit` items.
                let extent =
                    self.sums.tree[next] + (bit as f64 - self.counts.tree[next]) * estimate;
                if extent <= target {
                    target -= extent;
                    idx = next;
                }
            }
            bit >>= 1;
        }
        idx
    }
}

fn lsb(i: usize) -> usize {
    i & i.wrapping_neg()
}

fn highest_power_of_two_leq(n: usize) -> usize {
    let mut p = 1usize;
    while p <= n / 2 {
        p <<= 1;
    }
    p
}
