//! Incremental distance accumulation over batched GPS fixes.
//!
//! Consumer GPS jitters by a meter or more while standing still, so a
//! per-segment floor decides what counts as movement. The session total is
//! maintained incrementally: each batch chains onto the previous batch's
//! final point, so chunking never changes the result.

use crate::models::location::LocationPoint;
use crate::utils::geo;

/// Minimum per-segment distance, in meters, that counts as movement.
/// Segments at or below this contribute nothing to the total.
pub const JITTER_THRESHOLD_METERS: f64 = 1.0;

/// Result of folding one batch of points into a session's running total.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchTotal {
    /// Distance covered by this batch, in meters.
    pub meters: f64,
    /// Final point of the walk; persisted as the session's
    /// `last_known_location` to seed the next batch.
    pub last_point: Option<LocationPoint>,
}

/// Walks `last_known` followed by `points` pairwise and sums the segments
/// longer than the jitter threshold.
///
/// The reference point advances on every segment whether or not it
/// counted, so noise-sized or re-sent fixes can never stall the walk. With
/// no `last_known` (first batch of a session) accumulation starts from the
/// second point, since there is no distance before the first fix. `points` must
/// already be sorted by timestamp; an empty batch returns zero and leaves
/// the reference unchanged.
pub fn accumulate(points: &[LocationPoint], last_known: Option<&LocationPoint>) -> BatchTotal {
    let mut meters = 0.0;
    let mut reference = last_known.cloned();

    for point in points {
        if let Some(prev) = &reference {
            let segment = geo::haversine_meters(
                prev.latitude,
                prev.longitude,
                point.latitude,
                point.longitude,
            );
            if segment > JITTER_THRESHOLD_METERS {
                meters += segment;
            }
        }
        reference = Some(point.clone());
    }

    BatchTotal {
        meters,
        last_point: reference,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn point(latitude: f64, longitude: f64, secs: i64) -> LocationPoint {
        LocationPoint {
            latitude,
            longitude,
            timestamp: DateTime::from_timestamp(secs, 0).unwrap(),
        }
    }

    // Roughly one meter of latitude in degrees.
    const ONE_METER_LAT: f64 = 1.0 / 111_195.0;

    #[test]
    fn empty_batch_is_a_no_op() {
        let last = point(44.9778, -93.2650, 0);
        let total = accumulate(&[], Some(&last));
        assert_eq!(total.meters, 0.0);
        assert_eq!(total.last_point, Some(last));

        let total = accumulate(&[], None);
        assert_eq!(total.meters, 0.0);
        assert_eq!(total.last_point, None);
    }

    #[test]
    fn first_batch_counts_nothing_before_the_first_fix() {
        let points = vec![point(44.9778, -93.2650, 0)];
        let total = accumulate(&points, None);
        assert_eq!(total.meters, 0.0);
        assert_eq!(total.last_point, Some(points[0].clone()));
    }

    #[test]
    fn sub_threshold_segment_contributes_zero() {
        let a = point(44.9778, -93.2650, 0);
        let b = point(44.9778 + 0.5 * ONE_METER_LAT, -93.2650, 5);
        // Sanity: the pair really is about half a meter apart.
        let segment = crate::utils::geo::haversine_meters(
            a.latitude,
            a.longitude,
            b.latitude,
            b.longitude,
        );
        assert!(segment < 1.0, "test points too far apart: {segment}");

        let total = accumulate(&[b], Some(&a));
        assert_eq!(total.meters, 0.0);
    }

    #[test]
    fn above_threshold_segment_counts_in_full() {
        let a = point(44.9778, -93.2650, 0);
        let b = point(44.9778 + 2.0 * ONE_METER_LAT, -93.2650, 5);
        let segment = crate::utils::geo::haversine_meters(
            a.latitude,
            a.longitude,
            b.latitude,
            b.longitude,
        );
        assert!(segment > 1.0 && segment < 3.0, "unexpected segment {segment}");

        let total = accumulate(&[b.clone()], Some(&a));
        assert_eq!(total.meters, segment);
        assert_eq!(total.last_point, Some(b));
    }

    #[test]
    fn reference_advances_even_for_filtered_segments() {
        // Three fixes, each ~0.6 m apart: every individual segment is
        // noise, and the walk must not fuse them into one 1.2 m segment.
        let a = point(44.9778, -93.2650, 0);
        let b = point(44.9778 + 0.6 * ONE_METER_LAT, -93.2650, 5);
        let c = point(44.9778 + 1.2 * ONE_METER_LAT, -93.2650, 10);

        let total = accumulate(&[b, c.clone()], Some(&a));
        assert_eq!(total.meters, 0.0);
        assert_eq!(total.last_point, Some(c));
    }

    #[test]
    fn splitting_a_batch_never_changes_the_outcome() {
        let points: Vec<LocationPoint> = (0..8)
            .map(|i| {
                // Mix of noise-sized and real segments.
                let step = if i % 3 == 0 { 0.4 } else { 5.0 };
                point(
                    44.9778 + (i as f64) * step * ONE_METER_LAT,
                    -93.2650 + (i as f64) * 2.0 * ONE_METER_LAT,
                    i * 5,
                )
            })
            .collect();
        let seed = point(44.9778, -93.2650, -5);

        let whole = accumulate(&points, Some(&seed));

        for split in 0..=points.len() {
            let (head, tail) = points.split_at(split);
            let first = accumulate(head, Some(&seed));
            let second = accumulate(tail, first.last_point.as_ref());
            let chained = first.meters + second.meters;
            assert!(
                (chained - whole.meters).abs() < 1e-9,
                "split at {split}: {chained} != {}",
                whole.meters
            );
            assert_eq!(second.last_point, whole.last_point, "split at {split}");
        }
    }

    #[test]
    fn resent_points_at_the_reference_add_nothing() {
        // A device re-sends the batch after a failed acknowledgement: the
        // duplicate of the committed reference point is filtered as noise.
        let a = point(44.9778, -93.2650, 0);
        let total = accumulate(&[a.clone()], Some(&a));
        assert_eq!(total.meters, 0.0);
        assert_eq!(total.last_point, Some(a));
    }
}
