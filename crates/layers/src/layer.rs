use serde::{Deserialize, Serialize};

/// The logical layers of a frame, in paint order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Sphere,
    Grid,
    Land,
    Focus,
    Distortion,
    Outline,
}

impl LayerKind {
    /// Paint order; later layers cover earlier ones.
    pub const ORDER: [LayerKind; 6] = [
        LayerKind::Sphere,
        LayerKind::Grid,
        LayerKind::Land,
        LayerKind::Focus,
        LayerKind::Distortion,
        LayerKind::Outline,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LayerKind::Sphere => "sphere",
            LayerKind::Grid => "grid",
            LayerKind::Land => "land",
            LayerKind::Focus => "focus",
            LayerKind::Distortion => "distortion",
            LayerKind::Outline => "outline",
        }
    }
}
