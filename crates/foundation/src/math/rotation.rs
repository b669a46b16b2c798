use std::f64::consts::{PI, TAU};

/// Three-axis rotation of the globe in degrees: yaw (λ), pitch (φ), roll (γ).
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Rotation {
    pub lambda_deg: f64,
    pub phi_deg: f64,
    pub gamma_deg: f64,
}

impl Rotation {
    pub const fn new(lambda_deg: f64, phi_deg: f64, gamma_deg: f64) -> Self {
        Self {
            lambda_deg,
            phi_deg,
            gamma_deg,
        }
    }

    /// Rotation without roll.
    pub const fn yaw_pitch(lambda_deg: f64, phi_deg: f64) -> Self {
        Self::new(lambda_deg, phi_deg, 0.0)
    }

    pub fn with_roll(self, gamma_deg: f64) -> Self {
        Self { gamma_deg, ..self }
    }
}

/// Precomputed spherical rotation, applied to `(lambda, phi)` in radians.
///
/// The yaw is applied first as a longitude shift, then pitch and roll rotate
/// the sphere about the y and x axes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SphericalRotation {
    delta_lambda: f64,
    tilted: bool,
    cos_delta_phi: f64,
    sin_delta_phi: f64,
    cos_delta_gamma: f64,
    sin_delta_gamma: f64,
}

impl SphericalRotation {
    pub fn new(rotation: Rotation) -> Self {
        let delta_phi = rotation.phi_deg.to_radians();
        let delta_gamma = rotation.gamma_deg.to_radians();
        Self {
            delta_lambda: rotation.lambda_deg.to_radians() % TAU,
            tilted: delta_phi != 0.0 || delta_gamma != 0.0,
            cos_delta_phi: delta_phi.cos(),
            sin_delta_phi: delta_phi.sin(),
            cos_delta_gamma: delta_gamma.cos(),
            sin_delta_gamma: delta_gamma.sin(),
        }
    }

    pub fn forward(&self, lambda: f64, phi: f64) -> (f64, f64) {
        let lambda = wrap_lambda(lambda + self.delta_lambda);
        if !self.tilted {
            return (lambda, phi);
        }

        let cos_phi = phi.cos();
        let x = lambda.cos() * cos_phi;
        let y = lambda.sin() * cos_phi;
        let z = phi.sin();
        let k = z * self.cos_delta_phi + x * self.sin_delta_phi;

        (
            (y * self.cos_delta_gamma - k * self.sin_delta_gamma)
                .atan2(x * self.cos_delta_phi - z * self.sin_delta_phi),
            (k * self.cos_delta_gamma + y * self.sin_delta_gamma)
                .clamp(-1.0, 1.0)
                .asin(),
        )
    }
}

/// Wraps into [-π, π], leaving both endpoints where they are.
fn wrap_lambda(lambda: f64) -> f64 {
    if lambda > PI || lambda < -PI {
        lambda - TAU * (lambda / TAU).round()
    } else {
        lambda
    }
}
