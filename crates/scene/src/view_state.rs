use foundation::Viewport;
use foundation::math::Rotation;
use serde::{Deserialize, Serialize};

use crate::Feature;

/// Dataset quality tier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    #[default]
    Coarse,
    Fine,
}

impl Resolution {
    pub const ALL: [Resolution; 2] = [Resolution::Coarse, Resolution::Fine];

    pub fn as_str(self) -> &'static str {
        match self {
            Resolution::Coarse => "coarse",
            Resolution::Fine => "fine",
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "coarse" | "110m" => Ok(Resolution::Coarse),
            "fine" | "50m" => Ok(Resolution::Fine),
            other => Err(format!("unknown resolution: {other:?}")),
        }
    }
}

/// The whole mutable session state. Rendering reads nothing else.
///
/// Roll is never stored: every rotation written here has `gamma_deg == 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    projection_id: String,
    rotation: Rotation,
    show_distortion: bool,
    show_grid: bool,
    resolution: Resolution,
    focus: Option<Feature>,
    viewport: Viewport,
}

impl ViewState {
    pub fn new(projection_id: impl Into<String>) -> Self {
        Self {
            projection_id: projection_id.into(),
            rotation: Rotation::default(),
            show_distortion: true,
            show_grid: true,
            resolution: Resolution::Coarse,
            focus: None,
            viewport: Viewport::default(),
        }
    }

    pub fn projection_id(&self) -> &str {
        &self.projection_id
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn show_distortion(&self) -> bool {
        self.show_distortion
    }

    pub fn show_grid(&self) -> bool {
        self.show_grid
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn focus(&self) -> Option<&Feature> {
        self.focus.as_ref()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_projection_id(&mut self, id: impl Into<String>) {
        self.projection_id = id.into();
    }

    /// Stores yaw and pitch, clamped to [-180, 180] and [-90, 90]; roll is dropped.
    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = Rotation::yaw_pitch(
            clamp_deg(rotation.lambda_deg, 180.0),
            clamp_deg(rotation.phi_deg, 90.0),
        );
    }

    pub fn set_lambda(&mut self, lambda_deg: f64) {
        self.set_rotation(Rotation::yaw_pitch(lambda_deg, self.rotation.phi_deg));
    }

    pub fn set_phi(&mut self, phi_deg: f64) {
        self.set_rotation(Rotation::yaw_pitch(self.rotation.lambda_deg, phi_deg));
    }

    pub fn set_show_distortion(&mut self, on: bool) {
        self.show_distortion = on;
    }

    pub fn set_show_grid(&mut self, on: bool) {
        self.show_grid = on;
    }

    pub fn toggle_distortion(&mut self) {
        self.show_distortion = !self.show_distortion;
    }

    pub fn toggle_grid(&mut self) {
        self.show_grid = !self.show_grid;
    }

    pub fn set_resolution(&mut self, resolution: Resolution) {
        self.resolution = resolution;
    }

    pub fn set_focus(&mut self, feature: Feature) {
        self.focus = Some(feature);
    }

    pub fn clear_focus(&mut self) {
        self.focus = None;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new("equalEarth")
    }
}

fn clamp_deg(v: f64, limit: f64) -> f64 {
    if v.is_finite() { v.clamp(-limit, limit) } else { 0.0 }
}
