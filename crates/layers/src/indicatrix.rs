//! Sampling for the distortion overlay: equal small circles on a regular grid.

use foundation::math::{GeoPoint, small_circle};

/// Angular radius of each indicator circle.
pub const RADIUS_DEG: f64 = 2.5;

/// Bearing step used to sample each circle.
pub const SAMPLE_STEP_DEG: f64 = 6.0;

const LON_RANGE: (i32, i32, usize) = (-150, 150, 30);
const LAT_RANGE: (i32, i32, usize) = (-60, 60, 15);

/// Grid centres, latitude-major. Poles are left out so no circle degenerates.
pub fn centers() -> Vec<GeoPoint> {
    let mut out = Vec::new();
    for lat in (LAT_RANGE.0..=LAT_RANGE.1).step_by(LAT_RANGE.2) {
        for lon in (LON_RANGE.0..=LON_RANGE.1).step_by(LON_RANGE.2) {
            out.push(GeoPoint::new(f64::from(lon), f64::from(lat)));
        }
    }
    out
}

/// One closed ring per grid centre.
pub fn circles() -> Vec<Vec<GeoPoint>> {
    centers()
        .into_iter()
        .map(|c| small_circle(c, RADIUS_DEG, SAMPLE_STEP_DEG))
        .collect()
}
