/// A scrolling dimension. Each axis owns its own virtualizer and overscan controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    /// Rows.
    #[default]
    Vertical,
    /// Columns.
    Horizontal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScrollDirection {
    Forward,
    Backward,
}

impl ScrollDirection {
    /// Returns the direction as a hint in `[-1, 1]`.
    pub fn hint(self) -> f64 {
        match self {
            Self::Forward => 1.0,
            Self::Backward => -1.0,
        }
    }

    /// Derives a direction from a signed scroll delta. Returns `None` for `0` and non-finite
    /// deltas.
    pub fn from_delta(delta: f64) -> Option<Self> {
        if !delta.is_finite() {
            return None;
        }
        if delta > 0.0 {
            Some(Self::Forward)
        } else if delta < 0.0 {
            Some(Self::Backward)
        } else {
            None
        }
    }
}

/// Axis-specific data carried by an [`crate::AxisContext`].
///
/// The virtualizer only needs the scroll-direction hint; strategies may read the rest.
pub trait AxisMeta {
    /// Scroll-direction hint in `[-1, 1]`. Positive means offsets are increasing.
    fn scroll_direction(&self) -> f64;

    fn set_scroll_direction(&mut self, direction: f64);
}

/// Meta for row axes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RowMeta {
    pub scroll_direction: f64,
}

impl AxisMeta for RowMeta {
    fn scroll_direction(&self) -> f64 {
        self.scroll_direction
    }

    fn set_scroll_direction(&mut self, direction: f64) {
        self.scroll_direction = direction;
    }
}

/// Meta for column axes.
///
/// Pinned widths are subtracted from the container width before locating visible columns.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnMeta {
    pub scroll_direction: f64,
    pub pinned_left_width: f64,
    pub pinned_right_width: f64,
}

impl AxisMeta for ColumnMeta {
    fn scroll_direction(&self) -> f64 {
        self.scroll_direction
    }

    fn set_scroll_direction(&mut self, direction: f64) {
        self.scroll_direction = direction;
    }
}

/// Spacer sizes written by the built-in strategies on every update.
///
/// `before` is the extent of items scrolled out before the window, `after` the extent of items
/// after it. Adapters size spacer elements with these instead of rendering off-screen items.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpacerPayload {
    pub before: f64,
    pub after: f64,
    pub total_size: f64,
}
