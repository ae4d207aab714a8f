// Example: auto-sized rows measured as they render.
use gridwindow::{
    AxisContext, AxisVirtualizer, MeasuredSizeStrategy, RowHeightCache, RowMeasurement, RowMeta,
};

fn main() {
    let mut rows = AxisVirtualizer::new(MeasuredSizeStrategy::new(RowHeightCache::new(256)));
    let mut ctx = AxisContext {
        viewport_size: 400.0,
        virtualization_enabled: true,
        estimated_item_size: 32.0,
        total_count: 10_000,
        overscan: 4.0,
        meta: RowMeta::default(),
        ..AxisContext::default()
    };

    for pass in 0..3 {
        let s = *rows.update(&ctx);
        println!(
            "pass={pass} range={}..{} total_size={:.1}",
            s.start_index, s.end_index, s.payload.total_size
        );

        // Pretend the host measured every rendered row.
        let measured: Vec<RowMeasurement> = (s.start_index..s.end_index)
            .map(|i| RowMeasurement::new(i, 24.0 + (i % 5) as f64 * 12.0))
            .collect();
        rows.strategy_mut().ingest(measured);
        ctx.scroll_offset += 900.0;
    }

    let snapshot = rows.strategy().heights().snapshot();
    println!("{snapshot:?}");
}
