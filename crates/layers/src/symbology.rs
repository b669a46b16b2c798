use serde::{Deserialize, Serialize};

use crate::LayerKind;

/// Straight (non-premultiplied) RGBA, each channel in [0, 1].
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Color(pub [f32; 4]);

impl Color {
    pub fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self([
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            a,
        ])
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    pub fn to_css(self) -> String {
        let c = self.0;
        let r = (c[0].clamp(0.0, 1.0) * 255.0).round() as u32;
        let g = (c[1].clamp(0.0, 1.0) * 255.0).round() as u32;
        let b = (c[2].clamp(0.0, 1.0) * 255.0).round() as u32;
        let a = c[3].clamp(0.0, 1.0);
        format!("rgba({r},{g},{b},{a})")
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Paint {
    pub fill: Option<Color>,
    pub stroke: Option<Stroke>,
}

impl Paint {
    pub const fn new(fill: Option<Color>, stroke: Option<Stroke>) -> Self {
        Self { fill, stroke }
    }

    pub fn stroked(color: Color, width: f64) -> Self {
        Self::new(None, Some(Stroke { color, width }))
    }

    pub fn filled(fill: Color, stroke: Color, width: f64) -> Self {
        Self::new(
            Some(fill),
            Some(Stroke {
                color: stroke,
                width,
            }),
        )
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Palette {
    pub background: Color,
    pub sphere: Paint,
    pub grid: Paint,
    pub land: Paint,
    pub focus: Paint,
    pub distortion: Paint,
    pub outline: Paint,
}

impl Palette {
    pub fn paint(&self, layer: LayerKind) -> Paint {
        match layer {
            LayerKind::Sphere => self.sphere,
            LayerKind::Grid => self.grid,
            LayerKind::Land => self.land,
            LayerKind::Focus => self.focus,
            LayerKind::Distortion => self.distortion,
            LayerKind::Outline => self.outline,
        }
    }
}

pub fn palette_for(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => {
            let background = Color::rgb(8, 10, 20);
            let cyan = |a| Color::rgba(76, 201, 240, a);
            let pink = |a| Color::rgba(247, 37, 133, a);
            Palette {
                background,
                sphere: Paint::filled(background, cyan(0.3), 1.0),
                grid: Paint::stroked(cyan(0.08), 0.5),
                land: Paint::filled(cyan(0.15), cyan(0.5), 0.5),
                focus: Paint::filled(cyan(0.45), Color::rgba(255, 209, 102, 0.95), 1.25),
                distortion: Paint::filled(pink(0.1), pink(0.4), 0.8),
                outline: Paint::stroked(cyan(0.8), 1.5),
            }
        }
        Theme::Light => {
            let background = Color::rgb(244, 241, 234);
            let ink = |a| Color::rgba(30, 60, 90, a);
            let red = |a| Color::rgba(214, 40, 57, a);
            Palette {
                background,
                sphere: Paint::filled(background, ink(0.3), 1.0),
                grid: Paint::stroked(ink(0.12), 0.5),
                land: Paint::filled(ink(0.18), ink(0.55), 0.5),
                focus: Paint::filled(ink(0.5), red(0.95), 1.25),
                distortion: Paint::filled(red(0.12), red(0.45), 0.8),
                outline: Paint::stroked(ink(0.85), 1.5),
            }
        }
    }
}
