// Nearest-sample lookup over distance-ordered sequences

use super::Sample;
use crate::errors::LookupError;

/// Absolute distance delta, treating NaN as infinitely far so it never wins.
fn delta(distance: f64, target: f64) -> f64 {
    let d = (distance - target).abs();
    if d.is_nan() { f64::INFINITY } else { d }
}

/// Linear scan for the item closest to `target`.
///
/// Only a strictly smaller delta replaces the current best, so ties resolve to
/// the first occurrence in iteration order. This is the ground truth every
/// faster lookup is checked against.
pub fn nearest_by<T>(items: &[T], target: f64, distance: impl Fn(&T) -> f64) -> Option<&T> {
    let mut iter = items.iter();
    let mut best = iter.next()?;
    let mut best_delta = delta(distance(best), target);
    for item in iter {
        let d = delta(distance(item), target);
        if d < best_delta {
            best = item;
            best_delta = d;
        }
    }
    Some(best)
}

/// Binary search variant of [`nearest_by`] for sequences sorted by distance.
///
/// Returns exactly what [`nearest_by`] would, including first-occurrence tie
/// breaking across runs of equal distances.
pub fn nearest_sorted_by<T>(
    items: &[T],
    target: f64,
    distance: impl Fn(&T) -> f64,
) -> Option<&T> {
    let first = items.first()?;
    if target.is_nan() {
        return Some(first);
    }

    // first index of the run holding the same distance as items[idx]
    let run_start = |idx: usize| {
        let run_distance = distance(&items[idx]);
        items.partition_point(|i| distance(i) < run_distance)
    };

    let hi = items.partition_point(|i| distance(i) < target);
    if hi == 0 {
        return Some(first);
    }
    let lo = run_start(hi - 1);
    if hi == items.len() {
        return Some(&items[lo]);
    }

    let delta_lo = delta(distance(&items[lo]), target);
    let delta_hi = delta(distance(&items[hi]), target);
    if delta_hi < delta_lo {
        Some(&items[hi])
    } else {
        Some(&items[lo])
    }
}

pub fn nearest(samples: &[Sample], target: f64) -> Result<&Sample, LookupError> {
    nearest_by(samples, target, |s| s.distance).ok_or(LookupError::EmptyChannel)
}

/// Same result as [`nearest`] for non-decreasing sequences, in O(log n).
pub fn nearest_sorted(samples: &[Sample], target: f64) -> Result<&Sample, LookupError> {
    nearest_sorted_by(samples, target, |s| s.distance).ok_or(LookupError::EmptyChannel)
}
