//! Empirical hitting-time estimators over a series of model values.

use sde_core::{Real, Size};

/// Fraction of the first `horizon` values that are at or above `target`.
///
/// The horizon is truncated to the series length. Returns `0.0` when no
/// values are inspected.
pub fn fraction_at_or_above(values: &[Real], target: Real, horizon: Size) -> Real {
    let window = &values[..horizon.min(values.len())];
    if window.is_empty() {
        return 0.0;
    }
    let hits = window.iter().filter(|&&v| v >= target).count();
    hits as Real / window.len() as Real
}

/// Index of the first value at or above `target` among the first
/// `max_periods` values, or `None` if the target is never reached.
pub fn first_hitting_index(values: &[Real], target: Real, max_periods: Size) -> Option<Size> {
    values
        .iter()
        .take(max_periods)
        .position(|&v| v >= target)
}
