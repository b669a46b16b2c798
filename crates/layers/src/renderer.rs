use foundation::math::{GeoPoint, Projection};
use scene::{FeatureCollection, ViewState};
use tracing::debug;

use crate::graticule::Graticule;
use crate::indicatrix;
use crate::path::{GeoPath, Path};
use crate::symbology::{Paint, Palette, Theme, palette_for};
use crate::LayerKind;

/// Something a frame can be painted onto.
pub trait Surface {
    /// Resets the whole surface to transparent.
    fn clear(&mut self);

    fn begin_layer(&mut self, _layer: LayerKind) {}

    fn draw_path(&mut self, path: &Path, paint: &Paint);

    fn end_layer(&mut self, _layer: LayerKind) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear,
    BeginLayer(LayerKind),
    Draw { path: Path, paint: Paint },
    EndLayer(LayerKind),
}

/// A fully composed frame. Replaying it cannot fail, so a surface is never
/// left half drawn.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplayList {
    ops: Vec<DrawOp>,
}

impl DisplayList {
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Layers in the order they were begun.
    pub fn layers(&self) -> Vec<LayerKind> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::BeginLayer(kind) => Some(*kind),
                _ => None,
            })
            .collect()
    }

    /// Draw calls issued inside `layer`.
    pub fn draws_in(&self, layer: LayerKind) -> usize {
        let mut current = None;
        let mut count = 0;
        for op in &self.ops {
            match op {
                DrawOp::BeginLayer(kind) => current = Some(*kind),
                DrawOp::EndLayer(_) => current = None,
                DrawOp::Draw { .. } if current == Some(layer) => count += 1,
                _ => {}
            }
        }
        count
    }

    pub fn present(&self, surface: &mut impl Surface) {
        for op in &self.ops {
            match op {
                DrawOp::Clear => surface.clear(),
                DrawOp::BeginLayer(kind) => surface.begin_layer(*kind),
                DrawOp::Draw { path, paint } => surface.draw_path(path, paint),
                DrawOp::EndLayer(kind) => surface.end_layer(*kind),
            }
        }
    }

    fn layer(&mut self, kind: LayerKind, draws: impl IntoIterator<Item = (Path, Paint)>) {
        self.ops.push(DrawOp::BeginLayer(kind));
        self.ops.extend(
            draws
                .into_iter()
                .map(|(path, paint)| DrawOp::Draw { path, paint }),
        );
        self.ops.push(DrawOp::EndLayer(kind));
    }
}

/// Paints the fixed layer stack from a view, a dataset and a projection.
///
/// Every frame is composed from scratch; nothing carries over between calls.
#[derive(Debug, Clone)]
pub struct SceneRenderer {
    palette: Palette,
    grid: Vec<Vec<GeoPoint>>,
    indicators: Vec<Vec<GeoPoint>>,
}

impl SceneRenderer {
    pub fn new(theme: Theme) -> Self {
        Self {
            palette: palette_for(theme),
            grid: Graticule::default().lines(),
            indicators: indicatrix::circles(),
        }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn compose(
        &self,
        view: &ViewState,
        dataset: &FeatureCollection,
        projection: &Projection,
    ) -> DisplayList {
        let gp = GeoPath::new(projection);
        let p = &self.palette;
        let sphere = gp.sphere();

        let mut list = DisplayList {
            ops: vec![DrawOp::Clear],
        };
        list.layer(LayerKind::Sphere, [(sphere.clone(), p.sphere)]);
        list.layer(
            LayerKind::Grid,
            view.show_grid().then(|| (gp.lines(&self.grid), p.grid)),
        );
        list.layer(LayerKind::Land, [(gp.features(dataset.iter()), p.land)]);
        list.layer(
            LayerKind::Focus,
            view.focus()
                .map(|feature| (gp.geometry(feature.geometry()), p.focus)),
        );
        let indicators: Vec<(Path, Paint)> = if view.show_distortion() {
            self.indicators
                .iter()
                .map(|ring| (gp.polygon(std::slice::from_ref(ring)), p.distortion))
                .collect()
        } else {
            Vec::new()
        };
        list.layer(LayerKind::Distortion, indicators);
        list.layer(LayerKind::Outline, [(sphere, p.outline)]);

        debug!(
            projection = view.projection_id(),
            ops = list.ops.len(),
            features = dataset.len(),
            "composed frame"
        );
        list
    }

    pub fn render(
        &self,
        view: &ViewState,
        dataset: &FeatureCollection,
        projection: &Projection,
        surface: &mut impl Surface,
    ) {
        self.compose(view, dataset, projection).present(surface);
    }
}

impl Default for SceneRenderer {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

/// Records surface calls; handy for comparing frames.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordingSurface {
    pub ops: Vec<DrawOp>,
}

impl Surface for RecordingSurface {
    fn clear(&mut self) {
        self.ops.clear();
        self.ops.push(DrawOp::Clear);
    }

    fn begin_layer(&mut self, layer: LayerKind) {
        self.ops.push(DrawOp::BeginLayer(layer));
    }

    fn draw_path(&mut self, path: &Path, paint: &Paint) {
        self.ops.push(DrawOp::Draw {
            path: path.clone(),
            paint: *paint,
        });
    }

    fn end_layer(&mut self, layer: LayerKind) {
        self.ops.push(DrawOp::EndLayer(layer));
    }
}

#[cfg(test)]
mod tests {
    use super::{DrawOp, RecordingSurface, SceneRenderer};
    use crate::LayerKind;
    use catalog::ProjectionFactory;
    use foundation::Viewport;
    use foundation::math::{GeoPoint, Rotation};
    use pretty_assertions::assert_eq;
    use scene::{Feature, FeatureCollection, Geometry, ViewState};

    fn rect(lon0: f64, lat0: f64, lon1: f64, lat1: f64) -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(lon0, lat0),
            GeoPoint::new(lon1, lat0),
            GeoPoint::new(lon1, lat1),
            GeoPoint::new(lon0, lat1),
            GeoPoint::new(lon0, lat0),
        ]
    }

    fn dataset() -> FeatureCollection {
        FeatureCollection::new(vec![
            Feature::new("France", None, Geometry::Polygon(vec![rect(-4.0, 43.0, 8.0, 51.0)])),
            Feature::new("Chad", None, Geometry::Polygon(vec![rect(14.0, 8.0, 24.0, 23.0)])),
        ])
    }

    fn frame(view: &ViewState) -> RecordingSurface {
        let projection = ProjectionFactory
            .build(view.projection_id(), view.rotation(), view.viewport())
            .unwrap();
        let mut surface = RecordingSurface::default();
        SceneRenderer::default().render(view, &dataset(), &projection, &mut surface);
        surface
    }

    #[test]
    fn six_layers_in_fixed_order_even_when_disabled() {
        let mut view = ViewState::new("orthographic");
        view.set_show_grid(false);
        view.set_show_distortion(false);
        let renderer = SceneRenderer::default();
        let projection = ProjectionFactory
            .build("orthographic", Rotation::default(), Viewport::default())
            .unwrap();
        let list = renderer.compose(&view, &dataset(), &projection);
        assert_eq!(list.layers(), LayerKind::ORDER.to_vec());
        assert_eq!(list.ops()[0], DrawOp::Clear);
        assert_eq!(list.draws_in(LayerKind::Grid), 0);
        assert_eq!(list.draws_in(LayerKind::Focus), 0);
        assert_eq!(list.draws_in(LayerKind::Distortion), 0);
        assert_eq!(list.draws_in(LayerKind::Land), 1);
        assert_eq!(list.draws_in(LayerKind::Outline), 1);
    }

    #[test]
    fn distortion_overlay_draws_every_circle() {
        let mut view = ViewState::new("orthographic");
        view.set_rotation(Rotation::new(10.0, -20.0, 0.0));
        view.set_show_distortion(true);
        let surface = frame(&view);
        let draws = surface
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Draw { paint, .. } if *paint == SceneRenderer::default().palette().distortion))
            .count();
        assert_eq!(draws, 99);
    }

    #[test]
    fn clear_is_unpainted_and_the_sphere_fills_the_globe() {
        let surface = frame(&ViewState::new("orthographic"));
        assert_eq!(surface.ops[0], DrawOp::Clear);
        assert_eq!(surface.ops[1], DrawOp::BeginLayer(LayerKind::Sphere));
        match &surface.ops[2] {
            DrawOp::Draw { paint, .. } => {
                assert_eq!(*paint, SceneRenderer::default().palette().sphere)
            }
            other => panic!("expected a draw, got {other:?}"),
        }
    }

    #[test]
    fn rendering_is_repeatable() {
        let mut view = ViewState::new("conicConformal");
        view.set_rotation(Rotation::yaw_pitch(-30.0, 10.0));
        view.toggle_distortion();
        assert_eq!(frame(&view), frame(&view));
    }

    #[test]
    fn grid_toggle_round_trips() {
        let view = ViewState::new("mollweide");
        let before = frame(&view);
        let mut toggled = view.clone();
        toggled.toggle_grid();
        assert_ne!(frame(&toggled), before);
        toggled.toggle_grid();
        assert_eq!(frame(&toggled), before);
    }

    #[test]
    fn focus_layer_draws_the_focused_feature() {
        let mut view = ViewState::new("equalEarth");
        view.set_focus(dataset().features()[1].clone());
        let surface = frame(&view);
        let focus_start = surface
            .ops
            .iter()
            .position(|op| *op == DrawOp::BeginLayer(LayerKind::Focus))
            .unwrap();
        match &surface.ops[focus_start + 1] {
            DrawOp::Draw { path, .. } => assert_eq!(path.subpath_count(), 1),
            other => panic!("expected a draw, got {other:?}"),
        }
    }
}
