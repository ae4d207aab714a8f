use gridwindow::{
    Axis, AxisContext, AxisMeta, AxisStrategy, AxisVirtualizer, AxisVirtualizerState,
    DiagnosticsHook, HorizontalOverscanController, OverscanOutput, OverscanProfile,
    OverscanSample, OverscanState, ScrollDirection, VerticalOverscanController, finite_or,
};

/// The dynamic overscan controller of one axis.
#[derive(Clone, Debug)]
pub enum OverscanModel {
    Vertical(VerticalOverscanController),
    Horizontal(HorizontalOverscanController),
}

impl OverscanModel {
    pub fn vertical(profile: OverscanProfile) -> Self {
        Self::Vertical(VerticalOverscanController::new(profile))
    }

    pub fn horizontal(profile: OverscanProfile) -> Self {
        Self::Horizontal(HorizontalOverscanController::new(profile))
    }

    /// The default model for `axis`.
    pub fn for_axis(axis: Axis) -> Self {
        match axis {
            Axis::Vertical => Self::vertical(OverscanProfile::vertical()),
            Axis::Horizontal => Self::horizontal(OverscanProfile::horizontal()),
        }
    }

    pub fn axis(&self) -> Axis {
        match self {
            Self::Vertical(_) => Axis::Vertical,
            Self::Horizontal(_) => Axis::Horizontal,
        }
    }

    pub fn state(&self) -> &OverscanState {
        match self {
            Self::Vertical(c) => c.state(),
            Self::Horizontal(c) => c.state(),
        }
    }

    pub fn set_diagnostics(&mut self, hook: Option<DiagnosticsHook>) {
        match self {
            Self::Vertical(c) => c.set_diagnostics(hook),
            Self::Horizontal(c) => c.set_diagnostics(hook),
        }
    }

    pub fn update(&mut self, sample: &OverscanSample) -> OverscanOutput {
        match self {
            Self::Vertical(c) => c.update(sample),
            Self::Horizontal(c) => c.update(sample),
        }
    }

    /// Reinitializes the controller. `overscan` is only honoured by the horizontal model.
    pub fn reset(&mut self, timestamp: f64, overscan: Option<f64>) {
        match self {
            Self::Vertical(c) => c.reset(timestamp),
            Self::Horizontal(c) => c.reset(timestamp, overscan),
        }
    }
}

/// What the host reports for one axis on each frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameInput {
    /// Monotonic frame time in milliseconds.
    pub timestamp_ms: f64,
    pub scroll_offset: f64,
    pub viewport_size: f64,
    pub total_count: usize,
    pub estimated_item_size: f64,
    pub virtualization_enabled: bool,
}

/// Drives one [`AxisVirtualizer`] and its overscan controller from raw frame input.
///
/// Per frame:
/// - `delta = scroll_offset - previous scroll_offset` (`0` on the first frame)
/// - the direction hint follows the sign of `delta` and is kept across idle frames
/// - the overscan model turns the sample into a budget, with item distances measured in the
///   strategy's average item size
/// - the virtualizer computes the window with that budget
pub struct AxisDriver<S: AxisStrategy> {
    virtualizer: AxisVirtualizer<S>,
    overscan: OverscanModel,
    context: AxisContext<S::Meta>,
    last_scroll: Option<f64>,
    direction: Option<ScrollDirection>,
    enabled: Option<bool>,
    last_output: OverscanOutput,
}

impl<S> AxisDriver<S>
where
    S: AxisStrategy,
    S::Meta: Default,
{
    /// Creates a driver with default axis meta.
    pub fn new(strategy: S, overscan: OverscanModel) -> Self {
        Self::with_meta(strategy, overscan, S::Meta::default())
    }
}

impl<S: AxisStrategy> AxisDriver<S> {
    pub fn with_meta(strategy: S, overscan: OverscanModel, meta: S::Meta) -> Self {
        let context = AxisContext {
            axis: overscan.axis(),
            viewport_size: 0.0,
            scroll_offset: 0.0,
            virtualization_enabled: true,
            estimated_item_size: 0.0,
            total_count: 0,
            overscan: 0.0,
            meta,
        };
        Self {
            virtualizer: AxisVirtualizer::new(strategy),
            overscan,
            context,
            last_scroll: None,
            direction: None,
            enabled: None,
            last_output: OverscanOutput::default(),
        }
    }

    /// Installs `hook` on both the virtualizer and the overscan controller.
    pub fn set_diagnostics(&mut self, hook: Option<DiagnosticsHook>) {
        self.overscan.set_diagnostics(hook.clone());
        self.virtualizer.set_diagnostics(hook);
    }

    pub fn virtualizer(&self) -> &AxisVirtualizer<S> {
        &self.virtualizer
    }

    pub fn virtualizer_mut(&mut self) -> &mut AxisVirtualizer<S> {
        &mut self.virtualizer
    }

    pub fn into_virtualizer(self) -> AxisVirtualizer<S> {
        self.virtualizer
    }

    pub fn overscan_model(&self) -> &OverscanModel {
        &self.overscan
    }

    /// The budget produced on the last frame.
    pub fn last_overscan(&self) -> &OverscanOutput {
        &self.last_output
    }

    pub fn direction(&self) -> Option<ScrollDirection> {
        self.direction
    }

    /// The context passed to the virtualizer on the last frame.
    pub fn context(&self) -> &AxisContext<S::Meta> {
        &self.context
    }

    /// Axis meta (e.g. pinned column widths). The scroll direction in it is overwritten on
    /// every frame.
    pub fn meta_mut(&mut self) -> &mut S::Meta {
        &mut self.context.meta
    }

    pub fn state(&self) -> &AxisVirtualizerState<S::Payload> {
        self.virtualizer.state()
    }

    /// Computes the window for one frame.
    pub fn on_frame(&mut self, input: FrameInput) -> &AxisVirtualizerState<S::Payload> {
        let scroll = finite_or(input.scroll_offset, 0.0);
        let delta = self.last_scroll.map_or(0.0, |previous| scroll - previous);
        self.last_scroll = Some(scroll);
        if let Some(direction) = ScrollDirection::from_delta(delta) {
            self.direction = Some(direction);
        }

        let enabled = input.virtualization_enabled;
        if self.enabled.is_some_and(|previous| previous != enabled) {
            adebug!(axis = ?self.context.axis, enabled, "virtualization toggled");
            // Start from everything that was rendered so the window shrinks gradually.
            let start = enabled.then_some(input.total_count as f64);
            self.overscan.reset(input.timestamp_ms, start);
        }
        self.enabled = Some(enabled);

        let context = &mut self.context;
        context.viewport_size = input.viewport_size;
        context.scroll_offset = scroll;
        context.virtualization_enabled = enabled;
        context.estimated_item_size = input.estimated_item_size;
        context.total_count = input.total_count;
        context
            .meta
            .set_scroll_direction(self.direction.map_or(0.0, ScrollDirection::hint));

        let item_size = self.virtualizer.average_item_size(&self.context);
        let output = self.overscan.update(&OverscanSample {
            timestamp: input.timestamp_ms,
            delta,
            viewport_size: input.viewport_size,
            item_size,
            virtualization_enabled: enabled,
            total_items: input.total_count,
        });
        self.last_output = output;
        self.context.overscan = output.overscan as f64;

        self.virtualizer.update(&self.context)
    }

    /// Start offset of `index` for the last frame's input.
    pub fn offset_for_index(&mut self, index: usize) -> f64 {
        self.virtualizer.offset_for_index(index, &self.context)
    }

    pub fn is_index_visible(&self, index: usize) -> bool {
        self.virtualizer.is_index_visible(index)
    }

    /// Forgets scroll history: the next frame has `delta == 0` and no direction hint.
    pub fn reset(&mut self, timestamp_ms: f64) {
        adebug!(axis = ?self.context.axis, timestamp_ms, "axis driver reset");
        self.last_scroll = None;
        self.direction = None;
        self.overscan.reset(timestamp_ms, None);
        self.last_output = OverscanOutput {
            overscan: self.overscan.state().last_overscan,
            state: *self.overscan.state(),
        };
    }
}

impl<S> core::fmt::Debug for AxisDriver<S>
where
    S: AxisStrategy + core::fmt::Debug,
    S::Meta: core::fmt::Debug,
    S::Payload: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AxisDriver")
            .field("virtualizer", &self.virtualizer)
            .field("overscan", &self.overscan)
            .field("context", &self.context)
            .field("direction", &self.direction)
            .finish_non_exhaustive()
    }
}
