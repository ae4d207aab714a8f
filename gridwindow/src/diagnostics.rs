use alloc::sync::Arc;

use crate::Axis;

/// A plain-data event reported through a [`DiagnosticsHook`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Diagnostic {
    /// An axis virtualizer finished an update.
    AxisUpdated {
        axis: Axis,
        start_index: usize,
        end_index: usize,
        pool_size: usize,
        overscan_leading: usize,
        overscan_trailing: usize,
    },
    /// A dynamic overscan controller produced a new budget.
    OverscanUpdated {
        axis: Axis,
        overscan: usize,
        smoothed_overscan: f64,
        smoothed_velocity: f64,
    },
    /// A scroll delta was large enough to be treated as a jump rather than a scroll.
    TeleportDetected { axis: Axis, delta: f64, threshold: f64 },
    /// A sample arrived with a timestamp older than the previous one.
    TimestampRegressed {
        axis: Axis,
        previous: f64,
        timestamp: f64,
    },
}

/// An optional callback receiving [`Diagnostic`] events.
///
/// Hooks are injected per instance; nothing in this crate reads process-wide debug state.
pub type DiagnosticsHook = Arc<dyn Fn(&Diagnostic) + Send + Sync>;

pub(crate) fn emit(hook: Option<&DiagnosticsHook>, event: Diagnostic) {
    if let Some(hook) = hook {
        hook(&event);
    }
}
