use scene::Resolution;
use serde::Deserialize;

/// Everything the user can do to the view.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputEvent {
    SelectProjection { id: String },
    ToggleDistortion,
    ToggleGrid,
    SetRotationLambda { deg: f64 },
    /// Latitude slider. A positive value brings that northern latitude to
    /// the centre, so the stored pitch is `-deg`.
    SetRotationPhi { deg: f64 },
    SetResolution { resolution: Resolution },
    Search { text: String },
    /// Focus a feature by its display name.
    Focus { name: String },
    /// Focus the `index`th hit of the current search.
    FocusSearchHit { index: usize },
    Reset,
    Resize { width: f64, height: f64 },
}

impl InputEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            InputEvent::SelectProjection { .. } => "selectProjection",
            InputEvent::ToggleDistortion => "toggleDistortion",
            InputEvent::ToggleGrid => "toggleGrid",
            InputEvent::SetRotationLambda { .. } => "setRotationLambda",
            InputEvent::SetRotationPhi { .. } => "setRotationPhi",
            InputEvent::SetResolution { .. } => "setResolution",
            InputEvent::Search { .. } => "search",
            InputEvent::Focus { .. } => "focus",
            InputEvent::FocusSearchHit { .. } => "focusSearchHit",
            InputEvent::Reset => "reset",
            InputEvent::Resize { .. } => "resize",
        }
    }
}
