use crate::math::{clamp, finite_or, floor, split_lead_trail};

/// How an overscan budget is distributed around the visible window.
///
/// `leading` items are placed past the end of the window (the side of forward travel),
/// `trailing` items before its start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OverscanBuckets {
    pub leading: usize,
    pub trailing: usize,
}

impl OverscanBuckets {
    pub fn total(&self) -> usize {
        self.leading + self.trailing
    }
}

/// Minimum trailing reserve kept while scrolling forward.
const FORWARD_TRAILING_FLOOR: usize = 2;

/// Splits `available` overscan slots into leading/trailing shares biased by `direction`.
///
/// - `available` is floored; negative and non-finite values mean `0`.
/// - `direction` is clamped into `[-1, 1]`; non-finite means `0`.
///
/// The result always satisfies `leading + trailing == floor(available)`.
pub fn resolve_overscan_buckets(available: f64, direction: f64) -> OverscanBuckets {
    let available = floor(finite_or(available, 0.0).max(0.0));
    let total = available as usize;
    if total == 0 {
        return OverscanBuckets::default();
    }
    let direction = clamp(finite_or(direction, 0.0), -1.0, 1.0);

    let (lead_raw, trail_raw) = split_lead_trail(total as f64, direction);
    let mut leading = (floor(lead_raw) as usize).min(total);
    let mut trailing = (floor(trail_raw) as usize).min(total - leading);

    let remainder = total - leading - trailing;
    if remainder > 0 {
        let lead_frac = lead_raw - floor(lead_raw);
        let trail_frac = trail_raw - floor(trail_raw);
        let to_leading = if lead_frac == trail_frac {
            direction >= 0.0
        } else {
            lead_frac > trail_frac
        };
        if to_leading {
            leading += remainder;
        } else {
            trailing += remainder;
        }
    }

    // The side of travel already holds at least half of `total`.
    debug_assert!(total < 2 || direction <= 0.0 || leading > 0);
    debug_assert!(total < 2 || direction >= 0.0 || trailing > 0);

    if direction >= 0.0 && total >= FORWARD_TRAILING_FLOOR && trailing < FORWARD_TRAILING_FLOOR {
        trailing = FORWARD_TRAILING_FLOOR;
        leading = total - FORWARD_TRAILING_FLOOR;
    }

    debug_assert_eq!(leading + trailing, total);
    OverscanBuckets { leading, trailing }
}
