// Rounded-distance index over a lap's track path

use std::collections::HashMap;

use log::debug;

use crate::telemetry::{TrackPathPoint, nearest::nearest_by};

/// Default index granularity in meters
pub const DEFAULT_GRANULARITY_M: f64 = 1.0;

/// Precomputed mapping from rounded distance to the track path point nearest
/// that rounded distance.
///
/// The index stores positions into the point slice it was built from and must
/// be rebuilt whenever that slice is replaced.
#[derive(Clone, Debug)]
pub struct DistanceIndex {
    granularity: f64,
    buckets: HashMap<i64, usize>,
    len: usize,
}

impl DistanceIndex {
    pub fn build(points: &[TrackPathPoint], granularity: f64) -> Self {
        let granularity = if granularity.is_finite() && granularity > 0.0 {
            granularity
        } else {
            DEFAULT_GRANULARITY_M
        };
        let mut buckets: HashMap<i64, usize> = HashMap::with_capacity(points.len());
        for (i, point) in points.iter().enumerate() {
            let Some(key) = round_key(point.distance, granularity) else {
                continue;
            };
            let key_distance = key as f64 * granularity;
            buckets
                .entry(key)
                .and_modify(|held| {
                    // nearest to the key rather than last-wins: on-grid lookups
                    // must equal the linear scan. Earlier point wins ties.
                    let held_delta = (points[*held].distance - key_distance).abs();
                    if (point.distance - key_distance).abs() < held_delta {
                        *held = i;
                    }
                })
                .or_insert(i);
        }
        debug!(
            "Built distance index with {} buckets from {} track path points",
            buckets.len(),
            points.len()
        );
        Self {
            granularity,
            buckets,
            len: points.len(),
        }
    }

    fn bucket<'p>(&self, points: &'p [TrackPathPoint], key: i64) -> Option<&'p TrackPathPoint> {
        if points.len() != self.len {
            return None;
        }
        self.buckets.get(&key).and_then(|i| points.get(*i))
    }

    /// Exact lookup: served from the index only when `target` sits on a key,
    /// otherwise answered by a linear nearest scan. Always agrees with the scan.
    pub fn lookup<'p>(
        &self,
        points: &'p [TrackPathPoint],
        target: f64,
    ) -> Option<&'p TrackPathPoint> {
        if let Some(key) = round_key(target, self.granularity) {
            if key as f64 * self.granularity == target {
                if let Some(point) = self.bucket(points, key) {
                    return Some(point);
                }
            }
        }
        nearest_by(points, target, |p| p.distance)
    }

    /// Interactive lookup: snaps `target` to the nearest key first, falling back
    /// to a linear scan only when that bucket is empty.
    pub fn lookup_rounded<'p>(
        &self,
        points: &'p [TrackPathPoint],
        target: f64,
    ) -> Option<&'p TrackPathPoint> {
        round_key(target, self.granularity)
            .and_then(|key| self.bucket(points, key))
            .or_else(|| nearest_by(points, target, |p| p.distance))
    }
}

/// Half-up rounding to the index grid, `None` for non-finite distances.
fn round_key(distance: f64, granularity: f64) -> Option<i64> {
    let scaled = distance / granularity;
    if scaled.is_finite() {
        Some((scaled + 0.5).floor() as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn path(distances: &[f64]) -> Vec<TrackPathPoint> {
        distances
            .iter()
            .enumerate()
            .map(|(i, d)| TrackPathPoint::new(*d, i as f64, -(i as f64)))
            .collect()
    }

    #[test]
    fn test_round_key_half_up() {
        assert_eq!(round_key(0.5, 1.0), Some(1));
        assert_eq!(round_key(0.49, 1.0), Some(0));
        assert_eq!(round_key(-0.5, 1.0), Some(0));
        assert_eq!(round_key(12.0, 5.0), Some(2));
        assert_eq!(round_key(f64::NAN, 1.0), None);
    }

    #[test]
    fn test_bucket_keeps_point_nearest_key() {
        let points = path(&[0.9, 1.4]);
        let index = DistanceIndex::build(&points, 1.0);
        assert_eq!(index.buckets.len(), 1);
        assert_eq!(index.lookup(&points, 1.0).unwrap().distance, 0.9);
    }

    #[test]
    fn test_coarse_granularity_serves_on_grid_targets() {
        let points = path(&[0.0, 3.0, 4.0, 6.0, 10.0]);
        let index = DistanceIndex::build(&points, 5.0);
        assert_eq!(index.buckets.len(), 3);
        // 4.0 and 6.0 share bucket 1, the earlier one wins the tie
        assert_eq!(index.lookup(&points, 5.0).unwrap().distance, 4.0);
        // off-grid targets are answered by the scan
        assert_eq!(index.lookup(&points, 5.6).unwrap().distance, 6.0);
        assert_eq!(index.lookup_rounded(&points, 5.6).unwrap().distance, 4.0);
    }

    #[test]
    fn test_lookup_exact_and_fallback() {
        let points = path(&[0.0, 10.0, 20.0]);
        let index = DistanceIndex::build(&points, 1.0);
        assert_eq!(index.lookup(&points, 10.0).unwrap().x, 1.0);
        // no bucket at 14, falls back to the scan
        assert_eq!(index.lookup(&points, 14.0).unwrap().x, 1.0);
        assert_eq!(index.lookup(&points, 16.2).unwrap().x, 2.0);
        assert!(index.lookup(&[], 5.0).is_none());
    }

    #[test]
    fn test_lookup_rounded_snaps_to_bucket() {
        let points = path(&[0.0, 10.4, 11.4]);
        let index = DistanceIndex::build(&points, 1.0);
        // 10.6 is nearer 10.4 but lands in bucket 11
        assert_eq!(index.lookup_rounded(&points, 10.6).unwrap().distance, 11.4);
        assert_eq!(index.lookup(&points, 10.6).unwrap().distance, 10.4);
        assert_eq!(index.lookup_rounded(&points, 9.6).unwrap().distance, 10.4);
        assert_eq!(index.lookup_rounded(&points, 500.0).unwrap().distance, 11.4);
    }

    #[test]
    fn test_stale_index_falls_back() {
        let points = path(&[0.0, 10.0, 20.0]);
        let index = DistanceIndex::build(&points, 1.0);
        let other = path(&[0.0, 5.0]);
        assert_eq!(index.lookup(&other, 10.0).unwrap().distance, 5.0);
    }

    fn sorted_path() -> impl Strategy<Value = Vec<TrackPathPoint>> {
        prop::collection::vec(0u32..4000, 1..120).prop_map(|mut raw| {
            raw.sort();
            // quarter-meter resolution gives shared buckets and half-way ties
            raw.into_iter()
                .enumerate()
                .map(|(i, d)| TrackPathPoint::new(d as f64 / 4.0, i as f64, 0.0))
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_index_agrees_with_scan_at_integers(points in sorted_path(), target in -5i32..1010) {
            let index = DistanceIndex::build(&points, 1.0);
            let target = target as f64;
            let indexed = index.lookup(&points, target).unwrap();
            let scanned = nearest_by(&points, target, |p| p.distance).unwrap();
            prop_assert!(std::ptr::eq(indexed, scanned));
        }

        #[test]
        fn prop_index_agrees_with_scan_off_grid(points in sorted_path(), target in -5.0f64..1010.0) {
            let index = DistanceIndex::build(&points, 1.0);
            let indexed = index.lookup(&points, target).unwrap();
            let scanned = nearest_by(&points, target, |p| p.distance).unwrap();
            prop_assert!(std::ptr::eq(indexed, scanned));
        }

        #[test]
        fn prop_index_agrees_with_scan_other_granularities(
            points in sorted_path(),
            granularity in prop_oneof![Just(0.5), Just(5.0)],
            step in -5i32..2020,
            offset in -1.0f64..1.0,
        ) {
            let index = DistanceIndex::build(&points, granularity);
            let on_grid = step as f64 * granularity;
            for target in [on_grid, on_grid + offset] {
                let indexed = index.lookup(&points, target).unwrap();
                let scanned = nearest_by(&points, target, |p| p.distance).unwrap();
                prop_assert!(std::ptr::eq(indexed, scanned));
            }
        }
    }
}
