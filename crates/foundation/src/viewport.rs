use crate::math::Vec2;

/// Size of the drawable surface in logical pixels.
///
/// Dimensions are clamped to at least one pixel so that every scale derived
/// from a viewport stays positive.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    width: f64,
    height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: sanitize(width),
            height: sanitize(height),
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn min_side(&self) -> f64 {
        self.width.min(self.height)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(960.0, 600.0)
    }
}

fn sanitize(v: f64) -> f64 {
    if v.is_finite() { v.max(1.0) } else { 1.0 }
}
