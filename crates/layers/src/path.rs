use foundation::Aabb2;
use foundation::math::{GeoPoint, Projection, Vec2, open_ring};
use scene::{Feature, Geometry, Ring};

use crate::clip::{LonLat, clip_line, clip_outline, clip_ring};

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PathCommand {
    MoveTo(Vec2),
    LineTo(Vec2),
    ClosePath,
}

/// Screen-space path in logical pixels.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    commands: Vec<PathCommand>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn move_to(&mut self, p: Vec2) {
        self.commands.push(PathCommand::MoveTo(p));
    }

    pub fn line_to(&mut self, p: Vec2) {
        self.commands.push(PathCommand::LineTo(p));
    }

    pub fn close(&mut self) {
        self.commands.push(PathCommand::ClosePath);
    }

    /// Appends one subpath through `points`; closed subpaths need three points.
    pub fn push_points(&mut self, points: &[Vec2], closed: bool) {
        let min = if closed { 3 } else { 2 };
        if points.len() < min {
            return;
        }
        self.move_to(points[0]);
        for &p in &points[1..] {
            self.line_to(p);
        }
        if closed {
            self.close();
        }
    }

    pub fn subpath_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, PathCommand::MoveTo(_)))
            .count()
    }

    /// Screen box of every vertex, or `None` for an empty path.
    pub fn bounds(&self) -> Option<Aabb2> {
        let b: Aabb2 = self
            .commands
            .iter()
            .filter_map(|c| match c {
                PathCommand::MoveTo(p) | PathCommand::LineTo(p) => Some(*p),
                PathCommand::ClosePath => None,
            })
            .collect();
        (!b.is_empty()).then_some(b)
    }
}

/// Turns geographic geometry into screen paths: rotate, clip, project.
#[derive(Debug, Copy, Clone)]
pub struct GeoPath<'a> {
    projection: &'a Projection,
}

impl<'a> GeoPath<'a> {
    pub fn new(projection: &'a Projection) -> Self {
        Self { projection }
    }

    pub fn projection(&self) -> &'a Projection {
        self.projection
    }

    pub fn geometry(&self, geometry: &Geometry) -> Path {
        let mut path = Path::new();
        for rings in geometry.polygons() {
            self.add_polygon(&mut path, rings);
        }
        path
    }

    pub fn polygon(&self, rings: &[Ring]) -> Path {
        let mut path = Path::new();
        self.add_polygon(&mut path, rings);
        path
    }

    /// All features as one combined path.
    pub fn features<'f>(&self, features: impl IntoIterator<Item = &'f Feature>) -> Path {
        let mut path = Path::new();
        for feature in features {
            for rings in feature.geometry().polygons() {
                self.add_polygon(&mut path, rings);
            }
        }
        path
    }

    /// Open polylines, split wherever they leave the visible region.
    pub fn lines(&self, lines: &[Vec<GeoPoint>]) -> Path {
        let clip = self.projection.clip();
        let mut path = Path::new();
        for line in lines {
            let rotated = self.rotate_all(line);
            for run in clip_line(clip, &rotated) {
                path.push_points(&self.project_all(&run), false);
            }
        }
        path
    }

    /// Outline of the visible sphere.
    pub fn sphere(&self) -> Path {
        let outline = clip_outline(self.projection.clip());
        let mut path = Path::new();
        path.push_points(&self.project_all(&outline), true);
        path
    }

    fn add_polygon(&self, path: &mut Path, rings: &[Ring]) {
        let clip = self.projection.clip();
        for ring in rings {
            let rotated = self.rotate_all(open_ring(ring));
            for piece in clip_ring(clip, &rotated) {
                path.push_points(&self.project_all(&piece), true);
            }
        }
    }

    fn rotate_all(&self, points: &[GeoPoint]) -> Vec<LonLat> {
        points
            .iter()
            .filter(|p| p.is_finite())
            .map(|&p| self.projection.rotate(p))
            .collect()
    }

    fn project_all(&self, points: &[LonLat]) -> Vec<Vec2> {
        points
            .iter()
            .map(|&(lambda, phi)| self.projection.project_rotated(lambda, phi))
            .filter(|p| p.is_finite())
            .collect()
    }
}
