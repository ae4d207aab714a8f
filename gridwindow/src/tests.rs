use crate::*;

use alloc::sync::Arc;
use alloc::vec::Vec;
use std::sync::Mutex;

#[derive(Clone, Copy, Debug)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        // Deterministic, dependency-free PRNG for tests.
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn gen_range_usize(&mut self, start: usize, end_exclusive: usize) -> usize {
        debug_assert!(start < end_exclusive);
        start + (self.next_u64() % (end_exclusive - start) as u64) as usize
    }

    fn gen_f64(&mut self, start: f64, end: f64) -> f64 {
        let unit = (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
        start + (end - start) * unit
    }

    fn gen_bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

fn rows(total_count: usize, item_size: f64, viewport: f64, scroll: f64) -> AxisContext<RowMeta> {
    AxisContext {
        axis: Axis::Vertical,
        viewport_size: viewport,
        scroll_offset: scroll,
        virtualization_enabled: true,
        estimated_item_size: item_size,
        total_count,
        overscan: 0.0,
        meta: RowMeta::default(),
    }
}

fn uniform_columns(count: usize, width: f64) -> Arc<[ColumnSpec]> {
    (0..count).map(|_| ColumnSpec::fixed(width)).collect()
}

const FORWARD_RESERVE: usize = 2;

fn sample(timestamp: f64, delta: f64) -> OverscanSample {
    OverscanSample {
        timestamp,
        delta,
        viewport_size: 400.0,
        item_size: 20.0,
        virtualization_enabled: true,
        total_items: 1_000,
    }
}

/// Asserts that every item overlapping `[offset, offset + viewport)` is inside the window.
fn assert_covers_viewport<P>(s: &AxisVirtualizerState<P>, sizes: &[f64], viewport: f64) {
    let mut start = 0.0;
    for (i, &size) in sizes.iter().enumerate() {
        let end = start + size;
        if start < s.offset + viewport - 1e-6 && end > s.offset + 1e-6 {
            assert!(
                s.contains(i),
                "item {i} [{start}, {end}) is in view at {} but the window is {}..{}",
                s.offset,
                s.start_index,
                s.end_index
            );
        }
        start = end;
    }
}

fn assert_window_bounds<P>(s: &AxisVirtualizerState<P>, total: usize) {
    assert!(s.start_index <= s.end_index);
    assert!(s.end_index <= total);
    assert_eq!(s.pool_size, s.end_index - s.start_index);
    if total > 0 {
        assert!(s.start_index <= total - s.pool_size);
    }
}

// --- overscan buckets ---

#[test]
fn buckets_lean_toward_direction_of_travel() {
    let b = resolve_overscan_buckets(5.0, 1.0);
    assert_eq!(b.total(), 5);
    assert!(b.leading > b.trailing, "{b:?}");
    assert_eq!(b, OverscanBuckets { leading: 3, trailing: 2 });

    let b = resolve_overscan_buckets(5.0, -1.0);
    assert_eq!(b, OverscanBuckets { leading: 0, trailing: 5 });
}

#[test]
fn buckets_split_evenly_at_rest_with_remainder_to_leading() {
    assert_eq!(
        resolve_overscan_buckets(4.0, 0.0),
        OverscanBuckets { leading: 2, trailing: 2 }
    );
    assert_eq!(
        resolve_overscan_buckets(5.0, 0.0),
        OverscanBuckets { leading: 3, trailing: 2 }
    );
    assert_eq!(
        resolve_overscan_buckets(1.0, 0.0),
        OverscanBuckets { leading: 1, trailing: 0 }
    );
}

#[test]
fn buckets_keep_a_forward_trailing_reserve() {
    assert_eq!(
        resolve_overscan_buckets(2.0, 1.0),
        OverscanBuckets { leading: 0, trailing: 2 }
    );
    assert_eq!(
        resolve_overscan_buckets(3.0, 0.2),
        OverscanBuckets { leading: 1, trailing: 2 }
    );
}

#[test]
fn buckets_normalize_malformed_inputs() {
    assert_eq!(resolve_overscan_buckets(-3.0, 1.0), OverscanBuckets::default());
    assert_eq!(resolve_overscan_buckets(f64::NAN, 1.0), OverscanBuckets::default());
    assert_eq!(resolve_overscan_buckets(4.9, 0.0).total(), 4);
    assert_eq!(
        resolve_overscan_buckets(6.0, f64::NAN),
        resolve_overscan_buckets(6.0, 0.0)
    );
    assert_eq!(
        resolve_overscan_buckets(6.0, 7.0),
        resolve_overscan_buckets(6.0, 1.0)
    );
}

#[test]
fn property_buckets_always_sum_to_floored_budget() {
    for seed in [1u64, 2, 3, 42, 777] {
        let mut rng = Lcg::new(seed);
        for _ in 0..500 {
            let available = rng.gen_f64(0.0, 64.0);
            let direction = rng.gen_f64(-1.0, 1.0);
            let b = resolve_overscan_buckets(available, direction);
            assert_eq!(b.total(), available.floor() as usize, "{available} {direction}");
        }
    }
}

#[test]
fn property_buckets_never_starve_the_side_of_travel() {
    for seed in [5u64, 6, 7, 31, 2024] {
        let mut rng = Lcg::new(seed);
        for _ in 0..500 {
            let available = rng.gen_f64(2.0, 64.0);
            let direction = rng.gen_f64(-1.0, 1.0);
            let b = resolve_overscan_buckets(available, direction);
            if direction < 0.0 {
                assert!(b.trailing > 0, "{available} {direction} {b:?}");
            }
            // Two slots going forward are both taken by the trailing reserve.
            if direction > 0.0 && b.total() > FORWARD_RESERVE {
                assert!(b.leading > 0, "{available} {direction} {b:?}");
            }
        }
    }

    assert_eq!(
        resolve_overscan_buckets(2.0, -1e-9),
        OverscanBuckets { leading: 1, trailing: 1 }
    );
    assert_eq!(
        resolve_overscan_buckets(3.0, 1e-9),
        OverscanBuckets { leading: 1, trailing: 2 }
    );
}

// --- dynamic overscan ---

#[test]
fn vertical_overscan_grows_with_velocity_then_decays_to_floor() {
    let mut c = VerticalOverscanController::default();
    let floor = c.profile().min_overscan;

    let mut t = 0.0;
    let mut peak = 0;
    for _ in 0..12 {
        t += 16.0;
        peak = peak.max(c.update(&sample(t, 200.0)).overscan);
    }
    assert!(peak as f64 > floor, "peak={peak}");
    assert!(peak <= 40, "bounded by viewport ratio: {peak}");

    let mut prev = c.state().smoothed_overscan;
    for _ in 0..100 {
        t += 16.0;
        let out = c.update(&sample(t, 0.0));
        assert!(out.state.smoothed_overscan <= prev);
        prev = out.state.smoothed_overscan;
    }
    assert_eq!(prev, floor);
    assert_eq!(c.state().last_overscan, floor as usize);
}

#[test]
fn teleport_does_not_inflate_overscan() {
    let mut c = VerticalOverscanController::default();
    c.update(&sample(0.0, 0.0));
    let out = c.update(&sample(16.0, 5_000.0));
    assert_eq!(out.overscan, 2);
    assert_eq!(out.state.smoothed_velocity, 0.0);

    // A scroll just under the threshold is a real scroll.
    let out = c.update(&sample(32.0, 999.0));
    assert!(out.overscan > 2);
}

#[test]
fn disabled_virtualization_resets_controllers() {
    let mut v = VerticalOverscanController::default();
    let mut h = HorizontalOverscanController::default();
    for i in 1..5 {
        v.update(&sample(i as f64 * 16.0, 150.0));
        h.update(&sample(i as f64 * 16.0, 150.0));
    }

    let mut off = sample(100.0, 150.0);
    off.virtualization_enabled = false;
    off.total_items = 37;
    assert_eq!(v.update(&off).overscan, 0);
    assert_eq!(v.state().smoothed_velocity, 0.0);
    assert_eq!(h.update(&off).overscan, 37);
    assert_eq!(h.state().smoothed_overscan, 37.0);
}

#[test]
fn horizontal_overscan_is_capped_by_item_count() {
    let mut h = HorizontalOverscanController::default();
    let mut t = 0.0;
    for _ in 0..20 {
        t += 16.0;
        let mut s = sample(t, 600.0);
        s.total_items = 3;
        assert!(h.update(&s).overscan <= 3);
    }
}

#[test]
fn horizontal_overscan_settles_on_viewport_fallback() {
    let mut h = HorizontalOverscanController::default();
    h.reset(0.0, Some(30.0));
    assert_eq!(h.state().smoothed_overscan, 30.0);

    // 400 / 20 = 20 columns in view, half of them as fallback.
    let mut prev = h.state().smoothed_overscan;
    let mut t = 0.0;
    for _ in 0..100 {
        t += 16.0;
        let out = h.update(&sample(t, 0.0));
        assert!(out.state.smoothed_overscan <= prev);
        prev = out.state.smoothed_overscan;
    }
    assert_eq!(prev, 10.0);
}

#[test]
fn out_of_order_timestamps_are_floored() {
    let mut c = VerticalOverscanController::default();
    c.update(&sample(100.0, 10.0));
    let out = c.update(&sample(50.0, 10.0));
    assert!(out.state.smoothed_velocity.is_finite());
    assert!(out.state.smoothed_overscan.is_finite());
    assert_eq!(out.state.last_timestamp, Some(100.0));

    let out = c.update(&sample(100.0, 10.0));
    assert!(out.state.smoothed_velocity.is_finite());
}

#[test]
fn non_finite_samples_degrade_to_floor() {
    let mut c = VerticalOverscanController::default();
    let out = c.update(&OverscanSample {
        timestamp: f64::NAN,
        delta: f64::INFINITY,
        viewport_size: f64::NAN,
        item_size: -1.0,
        virtualization_enabled: true,
        total_items: 10,
    });
    assert_eq!(out.overscan, 2);
    assert!(out.state.smoothed_overscan.is_finite());
    assert!(out.state.smoothed_velocity.is_finite());
}

#[test]
fn overscan_replay_is_deterministic() {
    let run = || {
        let mut c = VerticalOverscanController::default();
        let mut rng = Lcg::new(9);
        let mut t = 0.0;
        let mut out = Vec::new();
        for _ in 0..200 {
            t += rng.gen_f64(0.0, 40.0);
            let delta = rng.gen_f64(-1_500.0, 1_500.0);
            out.push(c.update(&sample(t, delta)));
        }
        out
    };
    assert_eq!(run(), run());
}

#[test]
fn diagnostics_hook_sees_teleports() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let hook: DiagnosticsHook = Arc::new(move |e: &Diagnostic| {
        if let Ok(mut events) = sink.lock() {
            events.push(*e);
        }
    });
    let mut c = VerticalOverscanController::default().with_diagnostics(Some(hook));
    c.update(&sample(0.0, 0.0));
    c.update(&sample(16.0, 10_000.0));

    let events = events.lock().unwrap();
    assert!(events.iter().any(|e| matches!(
        e,
        Diagnostic::TeleportDetected { axis: Axis::Vertical, delta, threshold }
            if *delta == 10_000.0 && *threshold == 1_000.0
    )));
    let updates = events
        .iter()
        .filter(|e| matches!(e, Diagnostic::OverscanUpdated { .. }))
        .count();
    assert_eq!(updates, 2);
}

// --- axis virtualizer ---

#[test]
fn fixed_rows_window_with_directional_overscan() {
    let mut v = AxisVirtualizer::new(FixedSizeStrategy::new());
    let mut ctx = rows(100, 10.0, 100.0, 0.0);
    ctx.overscan = 4.0;
    ctx.meta.scroll_direction = 1.0;

    let s = *v.update(&ctx);
    assert_eq!(s.visible_count, 11);
    assert_eq!((s.start_index, s.end_index, s.pool_size), (0, 15, 15));
    assert_eq!((s.overscan_leading, s.overscan_trailing), (2, 2));

    ctx.scroll_offset = 500.0;
    let s = *v.update(&ctx);
    assert_eq!((s.start_index, s.end_index), (48, 63));
    assert_eq!(s.payload.before, 480.0);
    assert_eq!(s.payload.after, 370.0);
    assert_eq!(s.payload.total_size, 1_000.0);

    ctx.meta.scroll_direction = -1.0;
    let s = *v.update(&ctx);
    assert_eq!((s.overscan_leading, s.overscan_trailing), (0, 4));
    assert_eq!((s.start_index, s.end_index), (46, 61));
}

#[test]
fn scroll_offset_is_clamped_and_window_stays_in_bounds() {
    let mut v = AxisVirtualizer::new(FixedSizeStrategy::new());
    let mut ctx = rows(100, 10.0, 100.0, 5_000.0);
    ctx.overscan = 4.0;
    let s = *v.update(&ctx);
    assert_eq!(s.offset, 900.0);
    assert_eq!((s.start_index, s.end_index, s.pool_size), (85, 100, 15));

    ctx.scroll_offset = -50.0;
    let s = *v.update(&ctx);
    assert_eq!(s.offset, 0.0);
    assert_eq!(s.start_index, 0);
}

#[test]
fn empty_axis_has_empty_pool() {
    let mut v = AxisVirtualizer::new(FixedSizeStrategy::new());
    for (overscan, viewport) in [(0.0, 0.0), (10.0, 500.0), (f64::NAN, f64::INFINITY)] {
        let mut ctx = rows(0, 10.0, viewport, 40.0);
        ctx.overscan = overscan;
        let s = v.update(&ctx);
        assert_eq!(s.pool_size, 0);
        assert_eq!((s.start_index, s.end_index), (0, 0));
    }
}

#[test]
fn disabling_virtualization_renders_everything() {
    let mut v = AxisVirtualizer::new(FixedSizeStrategy::new());
    let mut ctx = rows(250, 10.0, 100.0, 700.0);
    ctx.overscan = 3.0;
    assert!(v.update(&ctx).pool_size < 250);

    ctx.virtualization_enabled = false;
    let s = *v.update(&ctx);
    assert_eq!(s.pool_size, 250);
    assert_eq!((s.start_index, s.end_index), (0, 250));
    assert_eq!(s.visible_count, 250);
    assert!(v.is_index_visible(0));
    assert!(v.is_index_visible(249));
    assert!(!v.is_index_visible(250));
}

#[test]
fn zero_viewport_still_yields_one_visible_item() {
    let mut v = AxisVirtualizer::new(FixedSizeStrategy::new());
    let s = v.update(&rows(10, 10.0, 0.0, 30.0));
    assert_eq!(s.visible_count, 1);
    assert_eq!((s.start_index, s.end_index), (3, 4));
}

#[test]
fn update_is_idempotent() {
    let mut v = AxisVirtualizer::new(FixedSizeStrategy::new());
    let mut ctx = rows(1_000, 24.0, 480.0, 3_333.0);
    ctx.overscan = 7.0;
    ctx.meta.scroll_direction = 0.4;
    let first = *v.update(&ctx);
    let second = *v.update(&ctx);
    assert_eq!(first, second);
}

#[test]
fn offset_for_index_uses_strategy() {
    let mut v = AxisVirtualizer::new(FixedSizeStrategy::new());
    let ctx = rows(10, 12.0, 50.0, 0.0);
    v.update(&ctx);
    assert_eq!(v.offset_for_index(7, &ctx), 84.0);
    assert_eq!(v.offset_for_index(1_000, &ctx), 108.0);
    assert_eq!(v.offset_for_index(3, &rows(0, 12.0, 50.0, 0.0)), 0.0);
}

/// A deliberately sloppy strategy: runs past the end and has no offset mapping.
#[derive(Debug, Default)]
struct Overshoot;

impl AxisStrategy for Overshoot {
    type Meta = RowMeta;
    type Payload = ();

    fn compute_visible_count(&mut self, _context: &AxisContext<RowMeta>) -> usize {
        0
    }

    fn clamp_scroll(&mut self, offset: f64, _frame: &StrategyContext<'_, RowMeta>) -> f64 {
        offset
    }

    fn compute_range(
        &mut self,
        _offset: f64,
        frame: &StrategyContext<'_, RowMeta>,
        range: &mut AxisRange,
        _payload: &mut (),
    ) {
        let total = frame.context.total_count;
        range.start = total + 5;
        range.end = total + 20;
    }
}

#[test]
fn overshooting_strategy_is_clamped() {
    let mut v = AxisVirtualizer::new(Overshoot);
    let mut ctx = rows(10, 12.0, 50.0, 0.0);
    ctx.overscan = 2.0;
    let s = *v.update(&ctx);
    // visible_count is floored at 1, pool = 1 + 2.
    assert_eq!(s.visible_count, 1);
    assert_eq!((s.start_index, s.end_index, s.pool_size), (7, 10, 3));

    assert_eq!(v.offset_for_index(4, &ctx), 48.0);
    assert_eq!(v.offset_for_index(99, &ctx), 108.0);
}

#[test]
fn diagnostics_hook_sees_axis_updates() {
    let seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);
    let hook: DiagnosticsHook = Arc::new(move |e: &Diagnostic| {
        if let Diagnostic::AxisUpdated { pool_size, .. } = e {
            if let Ok(mut seen) = sink.lock() {
                *seen = Some(*pool_size);
            }
        }
    });
    let mut v = AxisVirtualizer::new(FixedSizeStrategy::new()).with_diagnostics(Some(hook));
    v.update(&rows(100, 10.0, 100.0, 0.0));
    assert_eq!(*seen.lock().unwrap(), Some(11));
}

#[test]
fn property_fixed_window_invariants() {
    for seed in [1u64, 2, 3, 4, 5, 123, 999] {
        let mut rng = Lcg::new(seed);
        let mut v = AxisVirtualizer::new(FixedSizeStrategy::new());
        for _ in 0..300 {
            let total = rng.gen_range_usize(0, 200);
            let mut ctx = rows(
                total,
                rng.gen_f64(1.0, 50.0),
                rng.gen_f64(0.0, 500.0),
                rng.gen_f64(-100.0, 20_000.0),
            );
            ctx.overscan = rng.gen_f64(0.0, 30.0);
            ctx.meta.scroll_direction = rng.gen_f64(-1.0, 1.0);
            ctx.virtualization_enabled = rng.gen_bool() || rng.gen_bool();

            let s = *v.update(&ctx);
            assert!(s.start_index <= s.end_index);
            assert!(s.end_index <= total);
            assert_eq!(s.pool_size, s.end_index - s.start_index);
            if total > 0 {
                assert!(s.start_index <= total - s.pool_size);
            }
            if !ctx.virtualization_enabled {
                assert_eq!(s.pool_size, total);
            }
            assert_eq!(
                s.overscan_leading + s.overscan_trailing,
                s.pool_size - s.visible_count.min(s.pool_size)
            );
        }
    }
}

// --- measured rows ---

#[test]
fn measured_rows_use_cached_heights_and_average_estimate() {
    let mut strategy = MeasuredSizeStrategy::new(RowHeightCache::new(512));
    assert!(strategy.ingest([(0usize, 100.0), (1, 50.0)]));
    assert_eq!(strategy.estimated_height(20.0), 75.0);

    let mut v = AxisVirtualizer::new(strategy);
    let ctx = rows(10, 20.0, 100.0, 0.0);
    let s = *v.update(&ctx);
    assert_eq!(s.start_index, 0);
    assert_eq!(s.payload.total_size, 750.0);
    assert_eq!(v.offset_for_index(2, &ctx), 150.0);
    assert_eq!(v.offset_for_index(3, &ctx), 225.0);
    assert_eq!(v.strategy().item_size(5), Some(75.0));

    let s = *v.update(&rows(10, 20.0, 100.0, 160.0));
    assert_eq!((s.start_index, s.end_index), (2, 4));
    assert_eq!(s.payload.before, 150.0);
    assert_eq!(s.payload.after, 450.0);
}

#[test]
fn measured_rows_fall_back_to_context_estimate() {
    let mut v = AxisVirtualizer::new(MeasuredSizeStrategy::default());
    let ctx = rows(50, 20.0, 100.0, 0.0);
    let s = *v.update(&ctx);
    assert_eq!(s.payload.total_size, 1_000.0);
    assert_eq!(s.visible_count, 6);

    // New measurements shift everything after the next update.
    v.strategy_mut().ingest([(0usize, 40.0)]);
    let s = *v.update(&ctx);
    assert_eq!(s.payload.total_size, 2_000.0);
    assert_eq!(v.offset_for_index(1, &ctx), 40.0);

    v.strategy_mut().clear();
    assert_eq!(v.update(&ctx).payload.total_size, 1_000.0);
}

#[test]
fn property_measured_window_invariants() {
    for seed in [1u64, 2, 3, 17, 4242] {
        let mut rng = Lcg::new(seed);
        let limit = rng.gen_range_usize(1, 96);
        let mut v = AxisVirtualizer::new(MeasuredSizeStrategy::new(RowHeightCache::new(limit)));
        let mut total = rng.gen_range_usize(0, 150);
        for _ in 0..300 {
            // Keep the count for a few frames so measurements land on a live index.
            if rng.gen_range_usize(0, 4) == 0 {
                total = rng.gen_range_usize(0, 150);
            }
            match rng.gen_range_usize(0, 10) {
                0 => {
                    let start = rng.gen_range_usize(0, 160);
                    let end = rng.gen_range_usize(start, 170);
                    v.strategy_mut().delete_range(start, end);
                }
                1 => v.strategy_mut().clear(),
                _ => {
                    let batch: Vec<(usize, f64)> = (0..rng.gen_range_usize(0, 12))
                        .map(|_| (rng.gen_range_usize(0, 170), rng.gen_f64(4.0, 700.0)))
                        .collect();
                    v.strategy_mut().ingest(batch);
                }
            }

            let mut ctx = rows(
                total,
                rng.gen_f64(1.0, 60.0),
                rng.gen_f64(0.0, 600.0),
                rng.gen_f64(-100.0, 40_000.0),
            );
            ctx.overscan = rng.gen_f64(0.0, 20.0);
            ctx.meta.scroll_direction = rng.gen_f64(-1.0, 1.0);
            ctx.virtualization_enabled = rng.gen_bool() || rng.gen_bool();

            let s = *v.update(&ctx);
            assert_window_bounds(&s, total);

            let sizes: Vec<f64> = (0..total)
                .map(|i| v.strategy().item_size(i).unwrap())
                .collect();
            assert_eq!(v.strategy().item_size(total), None);
            let prefix = |n: usize| sizes[..n].iter().sum::<f64>();
            let total_size = prefix(total);
            assert!((s.payload.total_size - total_size).abs() < 1e-6);
            assert!((s.payload.before - prefix(s.start_index)).abs() < 1e-6);
            assert!((s.payload.after - (total_size - prefix(s.end_index))).abs() < 1e-6);
            assert!(s.offset >= 0.0);
            assert!(s.offset <= (total_size - s.viewport_size).max(0.0) + 1e-6);

            if ctx.virtualization_enabled {
                assert_covers_viewport(&s, &sizes, s.viewport_size);
            } else {
                assert_eq!(s.pool_size, total);
            }

            if total > 0 {
                let index = rng.gen_range_usize(0, total);
                assert!((v.offset_for_index(index, &ctx) - prefix(index)).abs() < 1e-6);
            }
        }
    }
}

#[test]
fn measured_rows_track_measurements_at_scale() {
    const COUNT: usize = 200_000;
    let mut rng = Lcg::new(11);
    let mut v = AxisVirtualizer::new(MeasuredSizeStrategy::new(RowHeightCache::new(4_096)));
    let mut ctx = rows(COUNT, 24.0, 800.0, 0.0);

    for _ in 0..200 {
        let base = rng.gen_range_usize(0, COUNT - 64);
        let batch: Vec<(usize, f64)> = (base..base + 40)
            .map(|i| (i, rng.gen_f64(16.0, 96.0)))
            .collect();
        assert!(v.strategy_mut().ingest(batch));
        ctx.scroll_offset = rng.gen_f64(0.0, 6_000_000.0);
        let s = *v.update(&ctx);
        let start_offset = v.offset_for_index(s.start_index, &ctx);

        let heights = v.strategy().heights();
        let estimate = heights.resolve_estimated_height(ctx.estimated_item_size);
        let offset_of = |index: usize| {
            let (sum, measured) = heights
                .iter()
                .take_while(|&(i, _)| i < index)
                .fold((0.0, 0usize), |(sum, n), (_, h)| (sum + h, n + 1));
            sum + (index - measured) as f64 * estimate
        };

        let expected_total = offset_of(COUNT);
        assert!(
            (s.payload.total_size - expected_total).abs() < 1e-4,
            "{} vs {expected_total}",
            s.payload.total_size
        );
        let start = offset_of(s.start_index);
        assert!((start_offset - start).abs() < 1e-4);
        assert!(start <= s.offset + 1e-4);
        if s.end_index < COUNT {
            assert!(offset_of(s.end_index) + 1e-4 >= s.offset + s.viewport_size);
        }
    }

    // Dropping every measurement falls back to the context estimate without a count change.
    v.strategy_mut().delete_range(0, COUNT);
    let s = *v.update(&ctx);
    assert!(v.strategy().heights().is_empty());
    assert!((s.payload.total_size - COUNT as f64 * 24.0).abs() < 1e-4);
}

#[test]
fn zero_limit_cache_keeps_nothing() {
    let mut cache = RowHeightCache::new(0);
    assert!(!cache.ingest([(0usize, 30.0), (1, 40.0)]));
    assert!(cache.is_empty());
    assert_eq!(cache.resolve_estimated_height(20.0), 20.0);

    let mut cache = RowHeightCache::new(4);
    assert!(cache.ingest([(0usize, 30.0)]));
    cache.set_limit(0);
    assert!(cache.is_empty());
    assert!(!cache.ingest([(1usize, 30.0)]));

    let mut strategy = MeasuredSizeStrategy::new(RowHeightCache::new(0));
    assert!(!strategy.ingest([(3usize, 50.0)]));
    let mut v = AxisVirtualizer::new(strategy);
    assert_eq!(v.update(&rows(10, 20.0, 100.0, 0.0)).payload.total_size, 200.0);
}

#[test]
fn average_item_size_follows_the_strategy() {
    let ctx = rows(10, 20.0, 100.0, 0.0);
    let mut fixed = AxisVirtualizer::new(FixedSizeStrategy::new());
    assert_eq!(fixed.average_item_size(&ctx), 20.0);

    let mut strategy = MeasuredSizeStrategy::default();
    strategy.ingest([(0usize, 100.0), (1, 50.0)]);
    let mut measured = AxisVirtualizer::new(strategy);
    assert_eq!(measured.average_item_size(&ctx), 75.0);
    assert_eq!(measured.average_item_size(&rows(0, 20.0, 100.0, 0.0)), 75.0);
}

// --- columns ---

#[test]
fn accumulate_builds_offset_table() {
    let columns = [ColumnSpec::fixed(100.0), ColumnSpec::fixed(100.0), ColumnSpec::fixed(100.0)];
    let m = accumulate_column_widths(&columns, 1.0);
    assert_eq!(m.widths, vec![100.0, 100.0, 100.0]);
    assert_eq!(m.offsets, vec![0.0, 100.0, 200.0]);
    assert_eq!(m.total_width, 300.0);

    let r = calculate_visible_columns_from_metrics(150.0, 120.0, &m, PinnedWidths::default());
    assert_eq!((r.start_index, r.end_index), (1, 3));
    assert_eq!(r.left_padding, 100.0);
    assert_eq!(r.right_padding, 0.0);
}

#[test]
fn visible_columns_cover_everything_when_content_fits() {
    let m = accumulate_column_widths(&[ColumnSpec::fixed(100.0); 3], 1.0);
    let r = calculate_visible_columns_from_metrics(50.0, 400.0, &m, PinnedWidths::default());
    assert_eq!(
        r,
        VisibleColumnRange {
            start_index: 0,
            end_index: 3,
            left_padding: 0.0,
            right_padding: 0.0,
        }
    );
}

#[test]
fn pinned_widths_shrink_the_scrolling_viewport() {
    let m = accumulate_column_widths(&[ColumnSpec::fixed(100.0); 3], 1.0);
    let pinned = PinnedWidths {
        left: 50.0,
        right: 50.0,
    };
    let r = calculate_visible_columns_from_metrics(0.0, 220.0, &m, pinned);
    assert_eq!((r.start_index, r.end_index), (0, 2));
    assert_eq!(r.right_padding, 100.0);
}

#[test]
fn empty_column_list_is_empty() {
    let m = accumulate_column_widths(&[], 1.0);
    assert_eq!(m.total_width, 0.0);
    assert_eq!(
        calculate_visible_columns_from_metrics(10.0, 100.0, &m, PinnedWidths::default()),
        VisibleColumnRange::default()
    );
}

#[test]
fn property_visible_columns_match_linear_scan() {
    for seed in [3u64, 17, 51] {
        let mut rng = Lcg::new(seed);
        let columns: Vec<ColumnSpec> = (0..rng.gen_range_usize(1, 80))
            .map(|_| ColumnSpec::fixed(rng.gen_f64(10.0, 200.0).round()))
            .collect();
        let m = accumulate_column_widths(&columns, 1.0);
        for _ in 0..100 {
            let width = rng.gen_f64(50.0, 600.0).round();
            let scroll = rng.gen_f64(0.0, (m.total_width - width).max(0.0)).round();
            let r =
                calculate_visible_columns_from_metrics(scroll, width, &m, PinnedWidths::default());
            if m.total_width <= width {
                assert_eq!((r.start_index, r.end_index), (0, columns.len()));
                continue;
            }
            let start = (0..columns.len())
                .find(|&i| m.offsets[i] + m.widths[i] >= scroll)
                .unwrap_or(columns.len());
            let end = (0..columns.len())
                .filter(|&i| m.offsets[i] <= scroll + width)
                .count();
            assert_eq!((r.start_index, r.end_index), (start, end.max(start)));
            assert_eq!(r.left_padding, m.offsets[start]);
        }
    }
}

#[test]
fn column_width_resolution() {
    let zoomed = ColumnSpec::fixed(50.0).with_min_width(80.0);
    assert_eq!(resolve_column_width(&zoomed, 2.0), 160.0);
    assert_eq!(resolve_column_width(&ColumnSpec::fixed(500.0).with_max_width(200.0), 1.0), 200.0);
    assert_eq!(resolve_column_width(&ColumnSpec::default(), 1.0), DEFAULT_COLUMN_WIDTH);
    assert_eq!(resolve_column_width(&ColumnSpec::fixed(f64::NAN), 1.0), DEFAULT_COLUMN_WIDTH);
    assert_eq!(resolve_column_width(&ColumnSpec::fixed(90.0), 0.0), 90.0);
    // min wins over max.
    let conflicting = ColumnSpec::fixed(10.0).with_min_width(60.0).with_max_width(40.0);
    assert_eq!(resolve_column_width(&conflicting, 1.0), 60.0);
}

#[test]
fn metrics_cache_is_keyed_by_identity_and_zoom() {
    let a = uniform_columns(4, 100.0);
    let b = uniform_columns(4, 100.0);
    let mut cache = ColumnMetricsCache::default();

    let a1 = cache.accumulate(&a, 1.0);
    assert!(Arc::ptr_eq(&a1, &cache.accumulate(&a, 1.0)));
    let a2 = cache.accumulate(&a, 2.0);
    assert_eq!(a2.total_width, 800.0);

    // Same content, new identity: a miss that evicts `(a, 1.0)`.
    let b1 = cache.accumulate(&b, 1.0);
    assert_eq!(*b1, *a1);
    assert!(!Arc::ptr_eq(&a1, &b1));

    assert!(Arc::ptr_eq(&a2, &cache.accumulate(&a, 2.0)));
    assert!(!Arc::ptr_eq(&a1, &cache.accumulate(&a, 1.0)));
}

#[test]
fn visible_columns_pool_alternates_slots() {
    let metrics = Arc::new(accumulate_column_widths(&[ColumnSpec::fixed(100.0); 10], 1.0));
    let mut pool = VisibleColumnsPool::new();
    let pinned = PinnedWidths::default();
    let first = pool.calculate(0.0, 250.0, &metrics, pinned) as *const VisibleColumns;
    let second = pool.calculate(420.0, 250.0, &metrics, pinned);
    assert_eq!((second.range.start_index, second.range.end_index), (4, 7));
    assert_eq!(second.total_width(), 1_000.0);
    assert_eq!(second.widths().len(), 10);
    let second = second as *const VisibleColumns;
    let third = pool.calculate(0.0, 250.0, &metrics, pinned) as *const VisibleColumns;
    assert_ne!(first, second);
    assert_eq!(first, third);
}

#[test]
fn column_strategy_windows_columns() {
    let mut v = AxisVirtualizer::new(ColumnStrategy::new(uniform_columns(10, 100.0), 1.0));
    let mut ctx = AxisContext {
        axis: Axis::Horizontal,
        viewport_size: 250.0,
        scroll_offset: 0.0,
        virtualization_enabled: true,
        estimated_item_size: 100.0,
        total_count: 10,
        overscan: 0.0,
        meta: ColumnMeta::default(),
    };
    let s = *v.update(&ctx);
    assert_eq!((s.start_index, s.end_index), (0, 3));

    ctx.scroll_offset = 420.0;
    let s = *v.update(&ctx);
    assert_eq!((s.start_index, s.end_index), (4, 7));
    assert_eq!(s.payload.before, 400.0);
    assert_eq!(s.payload.after, 300.0);
    assert_eq!(v.offset_for_index(6, &ctx), 600.0);

    ctx.meta.pinned_left_width = 100.0;
    ctx.scroll_offset = 10_000.0;
    let s = *v.update(&ctx);
    assert_eq!(s.offset, 850.0);
    assert_eq!(s.end_index, 10);

    v.strategy_mut().set_zoom(2.0);
    assert_eq!(v.strategy().metrics().total_width, 2_000.0);
}

#[test]
fn property_column_window_invariants() {
    for seed in [1u64, 9, 77, 512, 8080] {
        let mut rng = Lcg::new(seed);
        let mut v = AxisVirtualizer::new(ColumnStrategy::new(uniform_columns(0, 100.0), 1.0));
        for _ in 0..300 {
            if rng.gen_range_usize(0, 5) == 0 {
                let count = rng.gen_range_usize(0, 60);
                let columns: Arc<[ColumnSpec]> = (0..count)
                    .map(|_| ColumnSpec::fixed(rng.gen_f64(10.0, 300.0)))
                    .collect();
                v.strategy_mut().set_columns(columns);
            }
            let metrics = Arc::clone(v.strategy().metrics());
            let total = metrics.len();

            let mut ctx = AxisContext {
                axis: Axis::Horizontal,
                viewport_size: rng.gen_f64(0.0, 1_200.0),
                scroll_offset: rng.gen_f64(-100.0, 20_000.0),
                virtualization_enabled: rng.gen_bool() || rng.gen_bool(),
                estimated_item_size: 100.0,
                total_count: total,
                overscan: rng.gen_f64(0.0, 12.0),
                meta: ColumnMeta::default(),
            };
            ctx.meta.scroll_direction = rng.gen_f64(-1.0, 1.0);
            if rng.gen_bool() {
                ctx.meta.pinned_left_width = rng.gen_f64(0.0, 300.0);
            }
            if rng.gen_bool() {
                ctx.meta.pinned_right_width = rng.gen_f64(0.0, 300.0);
            }

            let s = *v.update(&ctx);
            assert_window_bounds(&s, total);
            assert_eq!(s.payload.total_size, metrics.total_width);

            let scrolling =
                (s.viewport_size - ctx.meta.pinned_left_width - ctx.meta.pinned_right_width)
                    .max(0.0);
            assert!(s.offset >= 0.0);
            assert!(s.offset <= (metrics.total_width - scrolling).max(0.0) + 1e-6);

            if ctx.virtualization_enabled {
                assert_covers_viewport(&s, &metrics.widths, scrolling);
            } else {
                assert_eq!((s.start_index, s.end_index), (0, total));
            }

            if total > 0 {
                let index = rng.gen_range_usize(0, total);
                assert_eq!(v.offset_for_index(index, &ctx), metrics.offsets[index]);
            }
        }
    }
}

#[test]
fn column_average_item_size_uses_resolved_widths() {
    let ctx = AxisContext {
        axis: Axis::Horizontal,
        viewport_size: 400.0,
        scroll_offset: 0.0,
        virtualization_enabled: true,
        estimated_item_size: 50.0,
        total_count: 4,
        overscan: 0.0,
        meta: ColumnMeta::default(),
    };
    let columns: Arc<[ColumnSpec]> =
        [100.0, 200.0, 300.0, 400.0].into_iter().map(ColumnSpec::fixed).collect();
    let mut v = AxisVirtualizer::new(ColumnStrategy::new(columns, 1.0));
    assert_eq!(v.average_item_size(&ctx), 250.0);

    v.strategy_mut().set_columns(uniform_columns(0, 100.0));
    assert_eq!(v.average_item_size(&ctx), 50.0);
}

// --- row height cache ---

#[test]
fn row_cache_evicts_by_insertion_order() {
    let mut cache = RowHeightCache::new(2);
    assert!(cache.ingest([(0usize, 30.0), (1, 40.0), (2, 50.0)]));
    assert_eq!(cache.get(0), None);
    assert_eq!(cache.get(1), Some(40.0));
    assert_eq!(cache.get(2), Some(50.0));
    assert_eq!(cache.len(), 2);
}

#[test]
fn row_cache_updates_do_not_refresh_position() {
    let mut cache = RowHeightCache::new(2);
    cache.ingest([(0usize, 30.0), (1, 40.0)]);
    assert!(cache.ingest([(0usize, 35.0)]));
    cache.ingest([(2usize, 50.0)]);
    assert_eq!(cache.get(0), None);
    assert_eq!(cache.get(1), Some(40.0));
}

#[test]
fn row_cache_ignores_jitter_and_normalizes() {
    let mut cache = RowHeightCache::default();
    assert!(cache.ingest([(0usize, 30.0)]));
    assert!(!cache.ingest([(0usize, 30.005)]));
    assert_eq!(cache.get(0), Some(30.0));

    cache.ingest([(1usize, 1.0), (2, 10_000.0)]);
    assert_eq!(cache.get(1), Some(MIN_ROW_HEIGHT));
    assert_eq!(cache.get(2), Some(MAX_ROW_HEIGHT));

    assert!(!cache.ingest([
        RowMeasurement { index: -1.0, height: 20.0 },
        RowMeasurement { index: f64::NAN, height: 20.0 },
        RowMeasurement { index: 4.0, height: f64::NAN },
    ]));
    assert_eq!(cache.len(), 3);

    cache.ingest([RowMeasurement { index: 3.7, height: 20.0 }]);
    assert_eq!(cache.get(3), Some(20.0));
}

#[test]
fn row_cache_is_bounded() {
    let mut cache = RowHeightCache::new(16);
    cache.ingest((0..100usize).map(|i| (i, 20.0 + i as f64)));
    assert_eq!(cache.snapshot().size, 16);
    assert_eq!(cache.get(83), None);
    assert_eq!(cache.get(84), Some(104.0));

    cache.set_limit(4);
    assert_eq!(cache.len(), 4);
    assert_eq!(cache.get(95), None);
    assert_eq!(cache.get(96), Some(116.0));
}

#[test]
fn row_cache_estimate_and_snapshot() {
    let mut cache = RowHeightCache::default();
    assert_eq!(cache.resolve_estimated_height(1_000.0), MAX_ROW_HEIGHT);
    assert_eq!(cache.resolve_estimated_height(f64::NAN), DEFAULT_ROW_HEIGHT);
    assert_eq!(
        cache.snapshot(),
        RowHeightSnapshot {
            size: 0,
            limit: DEFAULT_ROW_HEIGHT_LIMIT,
            average: 0.0,
            min: 0.0,
            max: 0.0,
        }
    );

    cache.ingest([(0usize, 30.0), (1, 50.0)]);
    assert_eq!(cache.resolve_estimated_height(20.0), 40.0);
    let snap = cache.snapshot();
    assert_eq!((snap.size, snap.average, snap.min, snap.max), (2, 40.0, 30.0, 50.0));

    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.resolve_estimated_height(20.0), 20.0);
}

#[test]
fn row_cache_delete_range() {
    let mut cache = RowHeightCache::default();
    cache.ingest((0..10usize).map(|i| (i, 20.0)));
    cache.delete_range(2, 5);
    assert_eq!(cache.len(), 7);
    assert_eq!(cache.get(3), None);
    assert_eq!(cache.get(5), Some(20.0));
    assert_eq!(cache.snapshot().average, 20.0);

    // Deleted slots do not count against the limit.
    cache.set_limit(7);
    cache.ingest([(3usize, 30.0)]);
    assert_eq!(cache.len(), 7);
    assert_eq!(cache.get(0), None);
}
