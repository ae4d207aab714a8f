use std::sync::Arc;

use gridwindow::{Axis, ColumnSpec, ColumnStrategy, FixedSizeStrategy};
use gridwindow_adapter::{AxisDriver, FrameInput, OverscanModel};

fn main() {
    // Example: a host frame loop driving both axes of a grid.
    //
    // The host would:
    // - read scroll offsets and viewport sizes from its scroll container
    // - call on_frame for each axis
    // - render rows/columns in the returned ranges, sizing spacers from the payload
    let mut rows = AxisDriver::new(
        FixedSizeStrategy::new(),
        OverscanModel::for_axis(Axis::Vertical),
    );
    let columns: Arc<[ColumnSpec]> = (0..60).map(|_| ColumnSpec::fixed(140.0)).collect();
    let mut cols = AxisDriver::new(
        ColumnStrategy::new(columns, 1.0),
        OverscanModel::for_axis(Axis::Horizontal),
    );

    let mut now_ms = 0.0;
    let mut scroll_top = 0.0;
    let mut scroll_left = 0.0;
    for frame in 0..40 {
        now_ms += 16.0;
        if frame < 20 {
            scroll_top += 120.0;
        }
        if frame == 25 {
            // Scrollbar drag: a jump, not a velocity spike.
            scroll_top = 150_000.0;
        }
        if (10..15).contains(&frame) {
            scroll_left += 60.0;
        }

        let r = *rows.on_frame(FrameInput {
            timestamp_ms: now_ms,
            scroll_offset: scroll_top,
            viewport_size: 720.0,
            total_count: 100_000,
            estimated_item_size: 28.0,
            virtualization_enabled: true,
        });
        let c = *cols.on_frame(FrameInput {
            timestamp_ms: now_ms,
            scroll_offset: scroll_left,
            viewport_size: 1_024.0,
            total_count: 60,
            estimated_item_size: 140.0,
            virtualization_enabled: true,
        });

        if frame % 5 == 0 || frame == 25 {
            println!(
                "t={now_ms} rows={}..{} (overscan {}) cols={}..{} (overscan {})",
                r.start_index,
                r.end_index,
                rows.last_overscan().overscan,
                c.start_index,
                c.end_index,
                cols.last_overscan().overscan
            );
        }
    }
}
