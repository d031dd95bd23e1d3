//! Great-circle distance on a spherical Earth.

use geo::{Distance, Haversine, Point};

/// Haversine distance between two coordinates, in kilometers.
///
/// Inputs are degrees. The result is non-negative and symmetric; identical
/// points yield zero. NaN coordinates propagate to a NaN result, since
/// input validation happens at the request boundary, not here.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let from = Point::new(lon1, lat1);
    let to = Point::new(lon2, lat2);
    Haversine::distance(from, to) / 1000.0
}

/// Haversine distance in meters, the unit used on the wire and in
/// accumulated session totals.
pub fn haversine_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    haversine_km(lat1, lon1, lat2, lon2) * 1000.0
}
