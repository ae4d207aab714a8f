//! Numeric helpers shared by every component.
//!
//! All inputs on the per-frame path are coerced instead of rejected: a NaN never leaves these
//! helpers.

/// Clamps `value` into `[min, max]`.
///
/// Unlike [`f64::clamp`] this never panics: a NaN `value` yields `min`, and when `min > max`
/// the upper bound wins.
#[inline]
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Returns `value` if it is finite, otherwise `fallback`.
#[inline]
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

/// Returns `value` if it is finite and strictly positive, otherwise `fallback`.
#[inline]
pub fn positive_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

/// Converts a non-negative float to an index, saturating at `usize::MAX`.
///
/// Non-finite and negative values map to `0`.
#[inline]
pub(crate) fn to_index(value: f64) -> usize {
    if value.is_finite() && value > 0.0 {
        value as usize
    } else {
        0
    }
}

/// Splits `available` into continuous `(lead, trail)` shares for a direction in `[-1, 1]`.
///
/// A direction of `0` splits evenly, `1` assigns everything to `lead` and `-1` everything to
/// `trail`. The shares always sum to `available`.
pub fn split_lead_trail(available: f64, direction: f64) -> (f64, f64) {
    let direction = clamp(finite_or(direction, 0.0), -1.0, 1.0);
    let lead = available * (1.0 + direction) * 0.5;
    (lead, available - lead)
}

#[cfg(feature = "std")]
mod float {
    #[inline]
    pub(crate) fn floor(x: f64) -> f64 {
        x.floor()
    }

    #[inline]
    pub(crate) fn ceil(x: f64) -> f64 {
        x.ceil()
    }

    #[inline]
    pub(crate) fn round(x: f64) -> f64 {
        x.round()
    }

    #[inline]
    pub(crate) fn trunc(x: f64) -> f64 {
        x.trunc()
    }

    #[inline]
    pub(crate) fn abs(x: f64) -> f64 {
        x.abs()
    }
}

#[cfg(not(feature = "std"))]
mod float {
    pub(crate) use libm::{ceil, floor, round, trunc};

    #[inline]
    pub(crate) fn abs(x: f64) -> f64 {
        libm::fabs(x)
    }
}

pub(crate) use float::{abs, ceil, floor, round, trunc};
