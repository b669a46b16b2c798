//! The 10° coordinate grid.
//!
//! Major meridians every 90° run pole to pole; minor meridians stop at ±80°
//! so the grid does not bunch up at the poles. Parallels run every 10°
//! between ±80°, plus the equator.

use foundation::math::GeoPoint;

const EPS_DEG: f64 = 1e-6;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Graticule {
    pub major_step: f64,
    pub minor_step: f64,
    /// Latitude limit of the major meridians.
    pub major_extent: f64,
    /// Latitude limit of the minor meridians and of the parallels.
    pub minor_extent: f64,
    /// Sampling interval along each line, in degrees.
    pub precision: f64,
}

impl Default for Graticule {
    fn default() -> Self {
        Self {
            major_step: 90.0,
            minor_step: 10.0,
            major_extent: 90.0 - EPS_DEG,
            minor_extent: 80.0 + EPS_DEG,
            precision: 2.5,
        }
    }
}

impl Graticule {
    pub fn lines(&self) -> Vec<Vec<GeoPoint>> {
        let mut lines = Vec::new();

        for lon in steps_from(-180.0, 180.0, self.major_step) {
            lines.push(self.meridian(lon, self.major_extent));
        }
        for lat in steps_from(-self.major_extent, self.major_extent, self.major_step) {
            lines.push(self.parallel(lat));
        }
        for lon in steps_from(-180.0, 180.0, self.minor_step) {
            if !is_multiple(lon, self.major_step) {
                lines.push(self.meridian(lon, self.minor_extent));
            }
        }
        for lat in steps_from(-self.minor_extent, self.minor_extent, self.minor_step) {
            if !is_multiple(lat, self.major_step) {
                lines.push(self.parallel(lat));
            }
        }
        lines
    }

    fn meridian(&self, lon: f64, extent: f64) -> Vec<GeoPoint> {
        samples(-extent, extent, self.precision)
            .map(|lat| GeoPoint::new(lon, lat))
            .collect()
    }

    fn parallel(&self, lat: f64) -> Vec<GeoPoint> {
        samples(-180.0, 180.0, self.precision)
            .map(|lon| GeoPoint::new(lon, lat))
            .collect()
    }
}

/// Multiples of `step` in `[start, end)`, starting from the first one at or after `start`.
fn steps_from(start: f64, end: f64, step: f64) -> impl Iterator<Item = f64> {
    let first = (start / step).ceil() * step;
    (0..)
        .map(move |i| first + step * i as f64)
        .take_while(move |v| *v < end)
}

/// `start, start + step, ...` below `end`, then `end` itself.
fn samples(start: f64, end: f64, step: f64) -> impl Iterator<Item = f64> {
    (0..)
        .map(move |i| start + step * i as f64)
        .take_while(move |v| *v < end - EPS_DEG)
        .chain(std::iter::once(end))
}

fn is_multiple(v: f64, step: f64) -> bool {
    (v % step).abs() <= EPS_DEG
}
