use foundation::math::Rotation;
use layers::Theme;
use scene::{Resolution, ViewState};
use serde::{Deserialize, Serialize};
use streaming::DatasetSources;

/// Start-up settings for a viewer session. Every field has a default, so an
/// empty JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerConfig {
    pub datasets: DatasetSources,
    pub projection: String,
    /// Initial slider positions `[lambda, phi]` in degrees; see
    /// [`InputEvent::SetRotationPhi`](crate::InputEvent::SetRotationPhi) for
    /// the sign of phi.
    pub rotation: [f64; 2],
    pub show_grid: bool,
    pub show_distortion: bool,
    pub resolution: Resolution,
    pub theme: Theme,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            datasets: DatasetSources::default(),
            projection: "equalEarth".to_string(),
            rotation: [0.0, 0.0],
            show_grid: true,
            show_distortion: true,
            resolution: Resolution::Coarse,
            theme: Theme::Dark,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(pub String);

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid viewer config: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

impl ViewerConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(|e| ConfigError(e.to_string()))
    }

    /// View state before any dataset is loaded. The resolution is applied
    /// once its dataset arrives.
    pub fn initial_view(&self) -> ViewState {
        let mut view = ViewState::new(self.projection.clone());
        view.set_rotation(Rotation::yaw_pitch(self.rotation[0], -self.rotation[1]));
        view.set_show_grid(self.show_grid);
        view.set_show_distortion(self.show_distortion);
        view
    }
}
