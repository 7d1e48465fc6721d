//! Great-circle distance on a spherical Earth

use crate::models::Coordinate;

/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Convert degrees to radians
#[inline]
pub fn deg_to_rad(deg: f64) -> f64 {
    deg * (std::f64::consts::PI / 180.0)
}

/// Haversine distance between two coordinates, in kilometers
///
/// The result is never negative and is symmetric in its arguments.
pub fn distance_km(from: Coordinate, to: Coordinate) -> f64 {
    let d_lat = deg_to_rad(to.latitude - from.latitude);
    let d_lon = deg_to_rad(to.longitude - from.longitude);

    let a = (d_lat / 2.0).sin() * (d_lat / 2.0).sin()
        + deg_to_rad(from.latitude).cos()
            * deg_to_rad(to.latitude).cos()
            * (d_lon / 2.0).sin()
            * (d_lon / 2.0).sin();
    // Rounding can push `a` just past 1 for antipodal points.
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}
