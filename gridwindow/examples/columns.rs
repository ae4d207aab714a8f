// Example: variable-width columns with pinned edges and zoom.
use std::sync::Arc;

use gridwindow::{
    Axis, AxisContext, AxisVirtualizer, ColumnMeta, ColumnSpec, ColumnStrategy, PinnedWidths,
    VisibleColumnsPool,
};

fn main() {
    let columns: Arc<[ColumnSpec]> = (0..200)
        .map(|i| match i % 3 {
            0 => ColumnSpec::fixed(80.0),
            1 => ColumnSpec::fixed(260.0).with_max_width(200.0),
            _ => ColumnSpec::default().with_min_width(140.0),
        })
        .collect();

    let mut strategy = ColumnStrategy::new(Arc::clone(&columns), 1.0);
    let metrics = Arc::clone(strategy.metrics());
    println!("columns={} total_width={}", metrics.len(), metrics.total_width);

    let mut pool = VisibleColumnsPool::new();
    let pinned = PinnedWidths {
        left: 120.0,
        right: 0.0,
    };
    let visible = pool.calculate(5_000.0, 1_280.0, &metrics, pinned);
    println!("visible at 5000: {:?}", visible.range);

    strategy.set_zoom(1.25);
    let mut cols = AxisVirtualizer::new(strategy);
    let ctx = AxisContext {
        axis: Axis::Horizontal,
        viewport_size: 1_280.0,
        scroll_offset: 5_000.0,
        virtualization_enabled: true,
        estimated_item_size: 150.0,
        total_count: columns.len(),
        overscan: 3.0,
        meta: ColumnMeta {
            scroll_direction: -1.0,
            pinned_left_width: pinned.left,
            pinned_right_width: pinned.right,
        },
    };
    let s = cols.update(&ctx);
    println!(
        "zoomed window {}..{} (trail={}) before={} after={}",
        s.start_index, s.end_index, s.overscan_trailing, s.payload.before, s.payload.after
    );
}
