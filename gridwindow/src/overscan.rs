//! Velocity-predictive overscan controllers.
//!
//! A controller turns a stream of scroll samples into an overscan item count. Fast scrolling
//! grows the budget, idle frames let it decay back, and jumps (scrollbar drags, programmatic
//! scrolls) are treated as discontinuities instead of velocity spikes.
//!
//! The controllers are not called by [`crate::AxisVirtualizer`]; the caller runs one per axis
//! before each frame and forwards the result as `AxisContext::overscan`.

use crate::diagnostics::{self, Diagnostic, DiagnosticsHook};
use crate::math::{abs, ceil, clamp, finite_or, positive_or, round};
use crate::Axis;

/// Default teleport threshold, as a multiple of the viewport size.
pub const DEFAULT_TELEPORT_MULTIPLIER: f64 = 2.5;

/// Below this distance a settling budget snaps onto its target.
const SETTLE_EPSILON: f64 = 0.01;

/// Tuning for a dynamic overscan controller.
///
/// Use [`OverscanProfile::VERTICAL`] / [`OverscanProfile::HORIZONTAL`] as starting points and
/// adjust with the `with_*` builders.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OverscanProfile {
    /// Lower bound of the budget, in items.
    pub min_overscan: f64,
    /// Upper bound of the budget as a multiple of the items that fit in the viewport.
    pub max_multiplier: f64,
    /// Weight of the velocity term in the instantaneous target.
    pub velocity_weight: f64,
    /// Weight of the viewport-proportional term in the instantaneous target.
    pub viewport_weight: f64,
    /// How many frames of travel the velocity term looks ahead.
    pub lookahead_frames: f64,
    /// Nominal frame duration used to express velocity per frame.
    pub frame_ms: f64,
    /// Fraction of the previous smoothed budget kept on each update (`0..1`).
    pub decay: f64,
    /// Floor applied to the time between two samples.
    pub min_sample_ms: f64,
    /// Window over which a new velocity sample fully replaces the estimate.
    pub blend_window_ms: f64,
    /// A delta larger than `viewport_size * teleport_multiplier` is a jump.
    pub teleport_multiplier: f64,
    /// Idle target of the horizontal controller, as a fraction of the items in view.
    pub fallback_ratio: f64,
}

impl OverscanProfile {
    /// Defaults for row axes.
    pub const VERTICAL: Self = Self {
        min_overscan: 2.0,
        max_multiplier: 2.0,
        velocity_weight: 0.75,
        viewport_weight: 0.25,
        lookahead_frames: 6.0,
        frame_ms: 16.0,
        decay: 0.65,
        min_sample_ms: 4.0,
        blend_window_ms: 100.0,
        teleport_multiplier: DEFAULT_TELEPORT_MULTIPLIER,
        fallback_ratio: 0.0,
    };

    /// Defaults for column axes.
    pub const HORIZONTAL: Self = Self {
        min_overscan: 1.0,
        max_multiplier: 1.5,
        velocity_weight: 0.6,
        viewport_weight: 0.4,
        lookahead_frames: 4.0,
        frame_ms: 16.0,
        decay: 0.7,
        min_sample_ms: 4.0,
        blend_window_ms: 120.0,
        teleport_multiplier: DEFAULT_TELEPORT_MULTIPLIER,
        fallback_ratio: 0.5,
    };

    pub fn vertical() -> Self {
        Self::VERTICAL
    }

    pub fn horizontal() -> Self {
        Self::HORIZONTAL
    }

    pub fn with_min_overscan(mut self, min_overscan: f64) -> Self {
        self.min_overscan = min_overscan;
        self
    }

    pub fn with_max_multiplier(mut self, max_multiplier: f64) -> Self {
        self.max_multiplier = max_multiplier;
        self
    }

    pub fn with_weights(mut self, velocity_weight: f64, viewport_weight: f64) -> Self {
        self.velocity_weight = velocity_weight;
        self.viewport_weight = viewport_weight;
        self
    }

    pub fn with_lookahead_frames(mut self, lookahead_frames: f64) -> Self {
        self.lookahead_frames = lookahead_frames;
        self
    }

    pub fn with_decay(mut self, decay: f64) -> Self {
        self.decay = decay;
        self
    }

    pub fn with_min_sample_ms(mut self, min_sample_ms: f64) -> Self {
        self.min_sample_ms = min_sample_ms;
        self
    }

    pub fn with_blend_window_ms(mut self, blend_window_ms: f64) -> Self {
        self.blend_window_ms = blend_window_ms;
        self
    }

    pub fn with_teleport_multiplier(mut self, teleport_multiplier: f64) -> Self {
        self.teleport_multiplier = teleport_multiplier;
        self
    }

    pub fn with_fallback_ratio(mut self, fallback_ratio: f64) -> Self {
        self.fallback_ratio = fallback_ratio;
        self
    }

    fn min(&self) -> f64 {
        finite_or(self.min_overscan, 0.0).max(0.0)
    }

    fn decay(&self) -> f64 {
        clamp(finite_or(self.decay, 0.0), 0.0, 1.0)
    }

    fn min_sample_ms(&self) -> f64 {
        positive_or(self.min_sample_ms, 1.0)
    }
}

impl Default for OverscanProfile {
    fn default() -> Self {
        Self::VERTICAL
    }
}

/// One scroll sample fed into a controller.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OverscanSample {
    /// Monotonic time in milliseconds.
    pub timestamp: f64,
    /// Signed scroll distance since the previous sample.
    pub delta: f64,
    pub viewport_size: f64,
    pub item_size: f64,
    pub virtualization_enabled: bool,
    /// Total item count. Only the horizontal controller reads it.
    pub total_items: usize,
}

/// Smoothing state of a controller.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OverscanState {
    pub smoothed_overscan: f64,
    /// Smoothed velocity in items per millisecond (signed).
    pub smoothed_velocity: f64,
    pub last_timestamp: Option<f64>,
    pub last_overscan: usize,
}

/// The result of a controller update.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OverscanOutput {
    pub overscan: usize,
    pub state: OverscanState,
}

#[derive(Clone, Copy, Debug)]
struct Bounds {
    min: f64,
    max: f64,
}

/// The model shared by both controllers; they differ in bounds and settling target only.
#[derive(Clone)]
struct Smoother {
    axis: Axis,
    profile: OverscanProfile,
    state: OverscanState,
    diagnostics: Option<DiagnosticsHook>,
}

impl Smoother {
    fn new(axis: Axis, profile: OverscanProfile, smoothed_overscan: f64) -> Self {
        Self {
            axis,
            profile,
            state: OverscanState {
                smoothed_overscan,
                ..OverscanState::default()
            },
            diagnostics: None,
        }
    }

    fn reset(&mut self, timestamp: f64, smoothed_overscan: f64) {
        self.state = OverscanState {
            smoothed_overscan,
            smoothed_velocity: 0.0,
            last_timestamp: timestamp.is_finite().then_some(timestamp),
            last_overscan: round(smoothed_overscan) as usize,
        };
    }

    fn viewport_items(viewport_size: f64, item_size: f64) -> f64 {
        let viewport_size = finite_or(viewport_size, 0.0).max(0.0);
        let item_size = positive_or(item_size, 0.0);
        if item_size > 0.0 {
            viewport_size / item_size
        } else {
            0.0
        }
    }

    fn bounds(&self, viewport_items: f64, cap: Option<usize>) -> Bounds {
        let mut min = self.profile.min();
        let multiplier = finite_or(self.profile.max_multiplier, 0.0).max(0.0);
        let mut max = ceil(viewport_items * multiplier).max(min);
        if let Some(cap) = cap {
            let cap = cap as f64;
            min = min.min(cap);
            max = max.min(cap);
        }
        Bounds { min, max }
    }

    /// Returns the time since the previous sample, floored at `min_sample_ms`.
    fn advance_clock(&mut self, timestamp: f64) -> f64 {
        let floor = self.profile.min_sample_ms();
        let Some(previous) = self.state.last_timestamp else {
            self.state.last_timestamp = timestamp.is_finite().then_some(timestamp);
            return floor;
        };
        let timestamp = finite_or(timestamp, previous);
        if timestamp < previous {
            vwarn!(previous, timestamp, "overscan sample timestamp went backwards");
            diagnostics::emit(
                self.diagnostics.as_ref(),
                Diagnostic::TimestampRegressed {
                    axis: self.axis,
                    previous,
                    timestamp,
                },
            );
        }
        self.state.last_timestamp = Some(previous.max(timestamp));
        (timestamp - previous).max(floor)
    }

    fn settle(&mut self, target: f64) {
        let decay = self.profile.decay();
        let next = target + (self.state.smoothed_overscan - target) * decay;
        self.state.smoothed_overscan = if abs(next - target) < SETTLE_EPSILON {
            target
        } else {
            next
        };
    }

    fn update(&mut self, sample: &OverscanSample, bounds: Bounds, settle_target: f64) -> usize {
        let delta_time = self.advance_clock(sample.timestamp);
        let delta = finite_or(sample.delta, 0.0);
        let viewport_size = finite_or(sample.viewport_size, 0.0).max(0.0);
        let item_size = positive_or(sample.item_size, 0.0);
        let viewport_items = Self::viewport_items(viewport_size, item_size);
        let decay = self.profile.decay();

        let threshold = viewport_size * finite_or(self.profile.teleport_multiplier, 0.0);
        let teleport = viewport_size > 0.0 && abs(delta) > threshold;

        if teleport {
            vdebug!(delta, threshold, "overscan teleport");
            diagnostics::emit(
                self.diagnostics.as_ref(),
                Diagnostic::TeleportDetected {
                    axis: self.axis,
                    delta,
                    threshold,
                },
            );
            self.state.smoothed_velocity = 0.0;
            self.settle(settle_target);
        } else if delta == 0.0 || item_size == 0.0 {
            self.state.smoothed_velocity *= decay;
            self.settle(settle_target);
        } else {
            let velocity = delta / item_size / delta_time;
            let blend_window = positive_or(self.profile.blend_window_ms, delta_time);
            let blend = (delta_time / blend_window).min(1.0);
            self.state.smoothed_velocity += (velocity - self.state.smoothed_velocity) * blend;

            let per_frame =
                abs(self.state.smoothed_velocity) * positive_or(self.profile.frame_ms, 16.0);
            let velocity_term = per_frame
                * finite_or(self.profile.lookahead_frames, 0.0).max(0.0)
                * finite_or(self.profile.velocity_weight, 0.0).max(0.0);
            let viewport_term =
                viewport_items * finite_or(self.profile.viewport_weight, 0.0).max(0.0);
            let target = clamp(velocity_term + viewport_term, bounds.min, bounds.max);

            self.state.smoothed_overscan =
                target + (self.state.smoothed_overscan - target) * decay;
        }

        let overscan = round(clamp(self.state.smoothed_overscan, bounds.min, bounds.max)) as usize;
        self.state.last_overscan = overscan;

        vtrace!(
            overscan,
            smoothed = self.state.smoothed_overscan,
            velocity = self.state.smoothed_velocity,
            "overscan update"
        );
        diagnostics::emit(
            self.diagnostics.as_ref(),
            Diagnostic::OverscanUpdated {
                axis: self.axis,
                overscan,
                smoothed_overscan: self.state.smoothed_overscan,
                smoothed_velocity: self.state.smoothed_velocity,
            },
        );
        overscan
    }

    fn output(&self, overscan: usize) -> OverscanOutput {
        OverscanOutput {
            overscan,
            state: self.state,
        }
    }
}

impl core::fmt::Debug for Smoother {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Smoother")
            .field("axis", &self.axis)
            .field("profile", &self.profile)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Dynamic overscan for row axes. The budget is not bounded by the item count.
///
/// Idle frames and jumps decay the budget toward `min_overscan`.
#[derive(Clone, Debug)]
pub struct VerticalOverscanController {
    inner: Smoother,
}

impl VerticalOverscanController {
    pub fn new(profile: OverscanProfile) -> Self {
        let floor = profile.min();
        Self {
            inner: Smoother::new(Axis::Vertical, profile, floor),
        }
    }

    pub fn with_diagnostics(mut self, hook: Option<DiagnosticsHook>) -> Self {
        self.inner.diagnostics = hook;
        self
    }

    pub fn set_diagnostics(&mut self, hook: Option<DiagnosticsHook>) {
        self.inner.diagnostics = hook;
    }

    pub fn profile(&self) -> &OverscanProfile {
        &self.inner.profile
    }

    pub fn state(&self) -> &OverscanState {
        &self.inner.state
    }

    pub fn reset(&mut self, timestamp: f64) {
        vdebug!(timestamp, "vertical overscan reset");
        let floor = self.inner.profile.min();
        self.inner.reset(timestamp, floor);
    }

    /// Feeds one sample and returns the new overscan budget.
    ///
    /// When virtualization is disabled the state is reset and the budget is `0`.
    pub fn update(&mut self, sample: &OverscanSample) -> OverscanOutput {
        if !sample.virtualization_enabled {
            self.inner.reset(sample.timestamp, 0.0);
            return self.inner.output(0);
        }
        let viewport_items = Smoother::viewport_items(sample.viewport_size, sample.item_size);
        let bounds = self.inner.bounds(viewport_items, None);
        let overscan = self.inner.update(sample, bounds, bounds.min);
        self.inner.output(overscan)
    }
}

impl Default for VerticalOverscanController {
    fn default() -> Self {
        Self::new(OverscanProfile::VERTICAL)
    }
}

/// Dynamic overscan for column axes. The budget never exceeds the item count.
///
/// Idle frames and jumps decay the budget toward a viewport-proportional fallback
/// (`fallback_ratio` of the items in view) instead of the floor.
#[derive(Clone, Debug)]
pub struct HorizontalOverscanController {
    inner: Smoother,
}

impl HorizontalOverscanController {
    pub fn new(profile: OverscanProfile) -> Self {
        let floor = profile.min();
        Self {
            inner: Smoother::new(Axis::Horizontal, profile, floor),
        }
    }

    pub fn with_diagnostics(mut self, hook: Option<DiagnosticsHook>) -> Self {
        self.inner.diagnostics = hook;
        self
    }

    pub fn set_diagnostics(&mut self, hook: Option<DiagnosticsHook>) {
        self.inner.diagnostics = hook;
    }

    pub fn profile(&self) -> &OverscanProfile {
        &self.inner.profile
    }

    pub fn state(&self) -> &OverscanState {
        &self.inner.state
    }

    /// Reinitializes the state, optionally starting from an explicit budget.
    pub fn reset(&mut self, timestamp: f64, overscan: Option<f64>) {
        let floor = self.inner.profile.min();
        let start = overscan.map_or(floor, |v| finite_or(v, floor).max(0.0));
        vdebug!(timestamp, start, "horizontal overscan reset");
        self.inner.reset(timestamp, start);
    }

    /// Feeds one sample and returns the new overscan budget.
    ///
    /// When virtualization is disabled the budget is `total_items` (render everything).
    pub fn update(&mut self, sample: &OverscanSample) -> OverscanOutput {
        let total = sample.total_items;
        if !sample.virtualization_enabled {
            self.inner.reset(sample.timestamp, total as f64);
            return self.inner.output(total);
        }
        let viewport_items = Smoother::viewport_items(sample.viewport_size, sample.item_size);
        let bounds = self.inner.bounds(viewport_items, Some(total));
        let ratio = finite_or(self.inner.profile.fallback_ratio, 0.0).max(0.0);
        let fallback = clamp(ceil(viewport_items * ratio), bounds.min, bounds.max);
        let overscan = self.inner.update(sample, bounds, fallback);
        self.inner.output(overscan)
    }
}

impl Default for HorizontalOverscanController {
    fn default() -> Self {
        Self::new(OverscanProfile::HORIZONTAL)
    }
}
