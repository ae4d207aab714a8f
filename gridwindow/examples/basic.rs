// Example: fixed-height rows with a dynamic overscan budget.
use gridwindow::{
    Axis, AxisContext, AxisVirtualizer, FixedSizeStrategy, OverscanSample, RowMeta,
    VerticalOverscanController,
};

fn main() {
    let mut overscan = VerticalOverscanController::default();
    let mut rows = AxisVirtualizer::new(FixedSizeStrategy::new());

    let mut ctx = AxisContext {
        axis: Axis::Vertical,
        viewport_size: 600.0,
        scroll_offset: 0.0,
        virtualization_enabled: true,
        estimated_item_size: 24.0,
        total_count: 1_000_000,
        overscan: 0.0,
        meta: RowMeta::default(),
    };

    let mut now_ms = 0.0;
    for step in 0..8 {
        let delta = 180.0;
        now_ms += 16.0;
        ctx.scroll_offset += delta;
        ctx.meta.scroll_direction = 1.0;

        let out = overscan.update(&OverscanSample {
            timestamp: now_ms,
            delta,
            viewport_size: ctx.viewport_size,
            item_size: ctx.estimated_item_size,
            virtualization_enabled: true,
            total_items: ctx.total_count,
        });
        ctx.overscan = out.overscan as f64;

        let s = rows.update(&ctx);
        println!(
            "step={step} overscan={} range={}..{} lead={} trail={} before={}",
            out.overscan,
            s.start_index,
            s.end_index,
            s.overscan_leading,
            s.overscan_trailing,
            s.payload.before
        );
    }

    let target = rows.offset_for_index(999_999, &ctx);
    println!("offset of last row: {target}");
}
