//! Spherical geodesy on the unit sphere.
//!
//! Everything here treats the Earth as a sphere: map projections in this
//! workspace are spherical, so ellipsoidal corrections would only add noise.

use super::Vec3;

/// Angular tolerance (radians) shared by the projection and clipping code.
pub const EPSILON: f64 = 1e-6;

/// A geographic position in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct GeoPoint {
    pub lon_deg: f64,
    pub lat_deg: f64,
}

impl GeoPoint {
    pub const fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self { lon_deg, lat_deg }
    }

    pub fn from_radians(lambda: f64, phi: f64) -> Self {
        Self::new(lambda.to_degrees(), phi.to_degrees())
    }

    /// `(lambda, phi)` in radians.
    pub fn to_radians(self) -> (f64, f64) {
        (self.lon_deg.to_radians(), self.lat_deg.to_radians())
    }

    pub fn unit_vector(self) -> Vec3 {
        let (lambda, phi) = self.to_radians();
        unit_vector(lambda, phi)
    }

    pub fn from_unit_vector(v: Vec3) -> Self {
        let (lambda, phi) = lambda_phi_from_unit(v);
        Self::from_radians(lambda, phi)
    }

    pub fn is_finite(self) -> bool {
        self.lon_deg.is_finite() && self.lat_deg.is_finite()
    }
}

pub fn unit_vector(lambda: f64, phi: f64) -> Vec3 {
    let cos_phi = phi.cos();
    Vec3::new(cos_phi * lambda.cos(), cos_phi * lambda.sin(), phi.sin())
}

pub fn lambda_phi_from_unit(v: Vec3) -> (f64, f64) {
    (v.y.atan2(v.x), v.z.clamp(-1.0, 1.0).asin())
}

/// Great-circle distance between two positions, in radians.
pub fn angular_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let (ua, ub) = (a.unit_vector(), b.unit_vector());
    ua.cross(ub).norm().atan2(ua.dot(ub))
}

/// Point at fraction `t` along the great-circle arc between unit vectors `a` and `b`.
pub fn great_circle_point(a: Vec3, b: Vec3, t: f64) -> Vec3 {
    let omega = a.cross(b).norm().atan2(a.dot(b));
    let sin_omega = omega.sin();
    if sin_omega.abs() < EPSILON {
        return (a * (1.0 - t) + b * t).normalized().unwrap_or(a);
    }
    a * (((1.0 - t) * omega).sin() / sin_omega) + b * ((t * omega).sin() / sin_omega)
}

/// Position reached by travelling `distance_deg` from `origin` on initial bearing `bearing_deg`.
pub fn destination(origin: GeoPoint, distance_deg: f64, bearing_deg: f64) -> GeoPoint {
    let (lambda1, phi1) = origin.to_radians();
    let delta = distance_deg.to_radians();
    let theta = bearing_deg.to_radians();

    let sin_phi2 = phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos();
    let phi2 = sin_phi2.clamp(-1.0, 1.0).asin();
    let lambda2 = lambda1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * sin_phi2);

    GeoPoint::new(wrap_lon_deg(lambda2.to_degrees()), phi2.to_degrees())
}

/// Closed ring approximating the small circle of angular radius `radius_deg`
/// around `center`, sampled every `step_deg` of bearing.
pub fn small_circle(center: GeoPoint, radius_deg: f64, step_deg: f64) -> Vec<GeoPoint> {
    let steps = ((360.0 / step_deg.max(1e-3)).ceil() as usize).max(3);
    let mut ring: Vec<GeoPoint> = (0..steps)
        .map(|i| destination(center, radius_deg, 360.0 * i as f64 / steps as f64))
        .collect();
    ring.push(ring[0]);
    ring
}

/// Wraps a longitude into [-180, 180] without moving either endpoint.
pub fn wrap_lon_deg(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        lon
    } else {
        (lon + 180.0).rem_euclid(360.0) - 180.0
    }
}

/// Area-weighted centroid of a set of rings on the sphere.
///
/// Ring orientation conventions differ between data sources, so the result
/// is flipped onto the hemisphere of the vertices when the winding points the
/// other way. Degenerate (zero-area) input falls back to the vertex mean.
pub fn spherical_centroid<'a, I>(rings: I) -> Option<GeoPoint>
where
    I: IntoIterator<Item = &'a [GeoPoint]>,
{
    let mut moment = Vec3::default();
    let mut mean = Vec3::default();

    for ring in rings {
        let pts = open_ring(ring);
        let n = pts.len();
        for i in 0..n {
            let a = pts[i].unit_vector();
            mean = mean + a;
            if n < 3 {
                continue;
            }
            let b = pts[(i + 1) % n].unit_vector();
            let c = a.cross(b);
            let m = c.norm();
            if m > 0.0 {
                let w = m.atan2(a.dot(b));
                moment = moment + c * (-w / m);
            }
        }
    }

    let mean_dir = mean.normalized();
    let dir = match (moment.normalized(), mean_dir) {
        (Some(d), Some(m)) if d.dot(m) < 0.0 => -d,
        (Some(d), _) => d,
        (None, m) => m?,
    };
    let p = GeoPoint::from_unit_vector(dir);
    p.is_finite().then_some(p)
}

/// Drops a closing duplicate vertex, if present.
pub fn open_ring(ring: &[GeoPoint]) -> &[GeoPoint] {
    match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() > 1 && first == last => &ring[..ring.len() - 1],
        _ => ring,
    }
}
