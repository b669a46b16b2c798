//! Spherical map projections.
//!
//! A [`RawProjection`] maps rotated `(lambda, phi)` radians to unitless planar
//! coordinates (y up). A [`Projection`] binds a raw projection to a rotation,
//! a clip region, a scale and a translation, and maps geographic degrees to
//! screen pixels (y down).

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI, SQRT_2};

use super::{EPSILON, GeoPoint, Rotation, SphericalRotation, Vec2};

/// Latitude limit for Mercator-style projections, `atan(sinh(π))`.
pub const MERCATOR_MAX_LAT_RAD: f64 = 1.484_422_229_745_332_4;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum RawProjection {
    Equirectangular,
    Mercator,
    /// Mercator on a sphere rolled by 90°; the roll belongs to the rotation
    /// (see [`Rotation::with_roll`]).
    TransverseMercator,
    NaturalEarth1,
    EqualEarth,
    Mollweide,
    Sinusoidal,
    Orthographic,
    Stereographic,
    Gnomonic,
    AzimuthalEqualArea,
    AzimuthalEquidistant,
    ConicEqualArea(ConicEqualArea),
    ConicConformal(ConicConformal),
    ConicEquidistant(ConicEquidistant),
}

impl RawProjection {
    pub fn forward(&self, lambda: f64, phi: f64) -> Vec2 {
        match self {
            RawProjection::Equirectangular => Vec2::new(lambda, phi),
            RawProjection::Mercator => Vec2::new(lambda, mercator_y(phi)),
            RawProjection::TransverseMercator => Vec2::new(mercator_y(phi), -lambda),
            RawProjection::NaturalEarth1 => natural_earth1(lambda, phi),
            RawProjection::EqualEarth => equal_earth(lambda, phi),
            RawProjection::Mollweide => mollweide(lambda, phi),
            RawProjection::Sinusoidal => Vec2::new(lambda * phi.cos(), phi),
            RawProjection::Orthographic => azimuthal(lambda, phi, |_| 1.0),
            RawProjection::Stereographic => {
                azimuthal(lambda, phi, |cos_c| 1.0 / (1.0 + cos_c).max(EPSILON))
            }
            RawProjection::Gnomonic => azimuthal(lambda, phi, |cos_c| 1.0 / cos_c.max(EPSILON)),
            RawProjection::AzimuthalEqualArea => {
                azimuthal(lambda, phi, |cos_c| (2.0 / (1.0 + cos_c).max(EPSILON)).sqrt())
            }
            RawProjection::AzimuthalEquidistant => azimuthal(lambda, phi, |cos_c| {
                let c = cos_c.clamp(-1.0, 1.0).acos();
                if c < EPSILON { 1.0 } else { c / c.sin().max(EPSILON) }
            }),
            RawProjection::ConicEqualArea(p) => p.forward(lambda, phi),
            RawProjection::ConicConformal(p) => p.forward(lambda, phi),
            RawProjection::ConicEquidistant(p) => p.forward(lambda, phi),
        }
    }
}

fn mercator_y(phi: f64) -> f64 {
    let phi = phi.clamp(-MERCATOR_MAX_LAT_RAD, MERCATOR_MAX_LAT_RAD);
    (FRAC_PI_4 + phi / 2.0).tan().ln()
}

/// Azimuthal projections differ only in their radial scale `k(cos c)`.
fn azimuthal(lambda: f64, phi: f64, k: impl Fn(f64) -> f64) -> Vec2 {
    let cos_phi = phi.cos();
    let cos_lambda = lambda.cos();
    let k = k(cos_lambda * cos_phi);
    Vec2::new(k * cos_phi * lambda.sin(), k * phi.sin())
}

fn natural_earth1(lambda: f64, phi: f64) -> Vec2 {
    let phi2 = phi * phi;
    let phi4 = phi2 * phi2;
    Vec2::new(
        lambda
            * (0.8707 - 0.131979 * phi2
                + phi4 * (-0.013791 + phi4 * (0.003971 * phi2 - 0.001529 * phi4))),
        phi * (1.007226
            + phi2 * (0.015085 + phi4 * (-0.044475 + 0.028874 * phi2 - 0.005916 * phi4))),
    )
}

fn equal_earth(lambda: f64, phi: f64) -> Vec2 {
    const A1: f64 = 1.340264;
    const A2: f64 = -0.081106;
    const A3: f64 = 0.000893;
    const A4: f64 = 0.003796;
    let m = 3f64.sqrt() / 2.0;

    let l = (m * phi.sin()).clamp(-1.0, 1.0).asin();
    let l2 = l * l;
    let l6 = l2 * l2 * l2;
    Vec2::new(
        lambda * l.cos() / (m * (A1 + 3.0 * A2 * l2 + l6 * (7.0 * A3 + 9.0 * A4 * l2))),
        l * (A1 + A2 * l2 + l6 * (A3 + A4 * l2)),
    )
}

fn mollweide(lambda: f64, phi: f64) -> Vec2 {
    let theta = mollweide_theta(phi);
    Vec2::new(2.0 * SQRT_2 / PI * lambda * theta.cos(), SQRT_2 * theta.sin())
}

/// Solves `2θ + sin 2θ = π sin φ` by Newton iteration.
fn mollweide_theta(phi: f64) -> f64 {
    if phi.abs() >= FRAC_PI_2 - EPSILON {
        return FRAC_PI_2.copysign(phi);
    }
    let target = PI * phi.sin();
    let mut x = phi;
    for _ in 0..30 {
        let delta = (x + x.sin() - target) / (1.0 + x.cos());
        if !delta.is_finite() {
            break;
        }
        x -= delta;
        if delta.abs() <= EPSILON {
            break;
        }
    }
    x / 2.0
}

fn conic_n_is_degenerate(n: f64) -> bool {
    n.abs() < EPSILON
}

/// Albers-style conic equal-area projection with two standard parallels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ConicEqualArea {
    n: f64,
    c: f64,
    r0: f64,
    cos_phi0: f64,
}

impl ConicEqualArea {
    pub fn new(phi0: f64, phi1: f64) -> Self {
        let sin_phi0 = phi0.sin();
        let n = (sin_phi0 + phi1.sin()) / 2.0;
        let c = 1.0 + sin_phi0 * (2.0 * n - sin_phi0);
        let r0 = if conic_n_is_degenerate(n) { 0.0 } else { c.sqrt() / n };
        Self {
            n,
            c,
            r0,
            cos_phi0: phi0.cos(),
        }
    }

    fn forward(&self, lambda: f64, phi: f64) -> Vec2 {
        if conic_n_is_degenerate(self.n) {
            // Cylindrical equal-area limit.
            return Vec2::new(lambda * self.cos_phi0, phi.sin() / self.cos_phi0);
        }
        let r = (self.c - 2.0 * self.n * phi.sin()).max(0.0).sqrt() / self.n;
        let nx = lambda * self.n;
        Vec2::new(r * nx.sin(), self.r0 - r * nx.cos())
    }
}

/// Lambert conformal conic projection with two standard parallels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ConicConformal {
    n: f64,
    f: f64,
}

impl ConicConformal {
    pub fn new(phi0: f64, phi1: f64) -> Self {
        let tany = |y: f64| (FRAC_PI_4 + y / 2.0).tan();
        let cos_phi0 = phi0.cos();
        let n = if phi0 == phi1 {
            phi0.sin()
        } else {
            (cos_phi0 / phi1.cos()).ln() / (tany(phi1) / tany(phi0)).ln()
        };
        let f = if conic_n_is_degenerate(n) {
            0.0
        } else {
            cos_phi0 * tany(phi0).powf(n) / n
        };
        Self { n, f }
    }

    fn forward(&self, lambda: f64, phi: f64) -> Vec2 {
        if conic_n_is_degenerate(self.n) {
            return Vec2::new(lambda, mercator_y(phi));
        }
        let phi = if self.f > 0.0 {
            phi.max(-FRAC_PI_2 + EPSILON)
        } else {
            phi.min(FRAC_PI_2 - EPSILON)
        };
        let r = self.f / (FRAC_PI_4 + phi / 2.0).tan().powf(self.n);
        let nx = self.n * lambda;
        Vec2::new(r * nx.sin(), self.f - r * nx.cos())
    }
}

/// Equidistant conic projection with two standard parallels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ConicEquidistant {
    n: f64,
    g: f64,
}

impl ConicEquidistant {
    pub fn new(phi0: f64, phi1: f64) -> Self {
        let cos_phi0 = phi0.cos();
        let n = if phi0 == phi1 {
            phi0.sin()
        } else {
            (cos_phi0 - phi1.cos()) / (phi1 - phi0)
        };
        let g = if conic_n_is_degenerate(n) {
            0.0
        } else {
            cos_phi0 / n + phi0
        };
        Self { n, g }
    }

    fn forward(&self, lambda: f64, phi: f64) -> Vec2 {
        if conic_n_is_degenerate(self.n) {
            return Vec2::new(lambda, phi);
        }
        let gy = self.g - phi;
        let nx = self.n * lambda;
        Vec2::new(gy * nx.sin(), self.g - gy * nx.cos())
    }
}

/// Region of the rotated sphere that survives clipping.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Clip {
    /// Cut along the antimeridian of the rotated sphere.
    Antimeridian,
    /// Keep the cap within `radius` radians of the rotated origin.
    Circle { radius: f64 },
}

impl Clip {
    pub fn circle_deg(radius_deg: f64) -> Self {
        Clip::Circle {
            radius: radius_deg.to_radians(),
        }
    }

    /// Whether a rotated point is inside the clip region.
    pub fn contains(&self, lambda: f64, phi: f64) -> bool {
        match *self {
            Clip::Antimeridian => true,
            Clip::Circle { radius } => phi.cos() * lambda.cos() > radius.cos(),
        }
    }
}

/// A fully configured projection: rotation, clip, scale and translation bound.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    raw: RawProjection,
    clip: Clip,
    rotation: Rotation,
    rotator: SphericalRotation,
    scale: f64,
    translate: Vec2,
    origin: Vec2,
}

impl Projection {
    pub fn new(raw: RawProjection, clip: Clip) -> Self {
        let rotation = Rotation::default();
        Self {
            raw,
            clip,
            rotation,
            rotator: SphericalRotation::new(rotation),
            scale: 150.0,
            translate: Vec2::new(480.0, 250.0),
            origin: raw.forward(0.0, 0.0),
        }
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self.rotator = SphericalRotation::new(rotation);
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_translate(mut self, translate: Vec2) -> Self {
        self.translate = translate;
        self
    }

    pub fn raw(&self) -> &RawProjection {
        &self.raw
    }

    pub fn clip(&self) -> Clip {
        self.clip
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn translate(&self) -> Vec2 {
        self.translate
    }

    /// Rotates a geographic point into the projection's frame (radians).
    pub fn rotate(&self, p: GeoPoint) -> (f64, f64) {
        let (lambda, phi) = p.to_radians();
        self.rotator.forward(lambda, phi)
    }

    /// Projects an already-rotated point to screen pixels, ignoring the clip.
    pub fn project_rotated(&self, lambda: f64, phi: f64) -> Vec2 {
        let p = self.raw.forward(lambda, phi);
        Vec2::new(
            self.translate.x + self.scale * (p.x - self.origin.x),
            self.translate.y - self.scale * (p.y - self.origin.y),
        )
    }

    /// Projects a geographic point, or `None` when the clip hides it.
    pub fn project(&self, p: GeoPoint) -> Option<Vec2> {
        let (lambda, phi) = self.rotate(p);
        if !self.clip.contains(lambda, phi) {
            return None;
        }
        let out = self.project_rotated(lambda, phi);
        out.is_finite().then_some(out)
    }
}
