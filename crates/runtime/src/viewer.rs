use std::rc::Rc;
use std::str::FromStr;

use catalog::{ProjectionFactory, ProjectionId, UnknownProjection};
use foundation::Viewport;
use layers::{FrameFitter, SceneRenderer, Surface};
use scene::{Feature, FeatureCollection, Resolution, SearchIndex, SearchOutcome, ViewState};
use serde::Serialize;
use streaming::{Fetch, GeometrySource, LoadError};
use tracing::{debug, info, warn};

use crate::config::ViewerConfig;
use crate::event_bus::{EventBus, Notice, Severity};
use crate::input::InputEvent;

/// Dataset availability as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "camelCase")]
pub enum LoadStatus {
    Loading(Resolution),
    Ready,
    Failed(String),
}

/// Why a frame was not drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    NoDataset,
    UnknownProjection(UnknownProjection),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::NoDataset => f.write_str("no dataset loaded"),
            RenderError::UnknownProjection(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::UnknownProjection(e) => Some(e),
            _ => None,
        }
    }
}

/// One viewer session: owns the view state and redraws the whole scene after
/// every input event.
///
/// Datasets live in the shared [`GeometrySource`]; the viewer only holds the
/// one it is drawing. Loading is driven by the host. `handle` returns the
/// resolution to fetch when a switch needs one; the host awaits
/// [`GeometrySource::load`] on [`Viewer::source`] and passes the outcome to
/// `finish_load`.
#[derive(Debug)]
pub struct Viewer<F> {
    view: ViewState,
    status: LoadStatus,
    pending: Option<Resolution>,
    source: Rc<GeometrySource<F>>,
    active: Option<FeatureCollection>,
    index: SearchIndex,
    search_text: String,
    search: SearchOutcome,
    factory: ProjectionFactory,
    fitter: FrameFitter,
    renderer: SceneRenderer,
    bus: EventBus,
    frames: u64,
}

impl<F: Fetch> Viewer<F> {
    /// A session waiting for its first dataset; see [`Viewer::pending_load`].
    pub fn new(config: &ViewerConfig, fetcher: F) -> Self {
        let mut viewer = Self {
            view: config.initial_view(),
            status: LoadStatus::Loading(config.resolution),
            pending: Some(config.resolution),
            source: Rc::new(GeometrySource::new(fetcher, config.datasets.clone())),
            active: None,
            index: SearchIndex::default(),
            search_text: String::new(),
            search: SearchOutcome::TooShort,
            factory: ProjectionFactory,
            fitter: FrameFitter::default(),
            renderer: SceneRenderer::new(config.theme),
            bus: EventBus::new(),
            frames: 0,
        };
        if let Err(e) = ProjectionId::from_str(&config.projection) {
            viewer.notify(Severity::Error, e.to_string());
        }
        viewer
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn source(&self) -> Rc<GeometrySource<F>> {
        Rc::clone(&self.source)
    }

    /// Resolution the host should be fetching, if any.
    pub fn pending_load(&self) -> Option<Resolution> {
        self.pending
    }

    /// Dataset for the active resolution.
    pub fn dataset(&self) -> Option<&FeatureCollection> {
        self.active.as_ref()
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn search_outcome(&self) -> &SearchOutcome {
        &self.search
    }

    pub fn notices(&self) -> &[Notice] {
        self.bus.notices()
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.bus.drain()
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames
    }

    /// Applies one input event, then redraws. Returns a resolution the host
    /// must load before the switch can complete.
    pub fn handle(&mut self, event: InputEvent, surface: &mut impl Surface) -> Option<Resolution> {
        debug!(event = event.kind(), "input");
        let request = match event {
            InputEvent::SelectProjection { id } => {
                if let Err(e) = ProjectionId::from_str(&id) {
                    self.notify(Severity::Error, e.to_string());
                }
                self.view.set_projection_id(id);
                None
            }
            InputEvent::ToggleDistortion => {
                self.view.toggle_distortion();
                None
            }
            InputEvent::ToggleGrid => {
                self.view.toggle_grid();
                None
            }
            InputEvent::SetRotationLambda { deg } => {
                self.view.set_lambda(deg);
                None
            }
            InputEvent::SetRotationPhi { deg } => {
                self.view.set_phi(-deg);
                None
            }
            InputEvent::SetResolution { resolution } => self.request_resolution(resolution),
            InputEvent::Search { text } => {
                self.search_text = text;
                self.search = self.index.query(&self.search_text);
                None
            }
            InputEvent::Focus { name } => {
                match self.dataset().and_then(|d| d.find_by_name(&name)).cloned() {
                    Some(feature) => self.focus(feature),
                    None => self.notify(Severity::Warning, format!("no region named {name:?}")),
                }
                None
            }
            InputEvent::FocusSearchHit { index } => {
                let hit = self.search.hits().get(index).map(|h| h.index);
                match hit.and_then(|i| self.dataset().and_then(|d| d.get(i))).cloned() {
                    Some(feature) => self.focus(feature),
                    None => debug!(index, "search hit out of range"),
                }
                None
            }
            InputEvent::Reset => {
                self.view.clear_focus();
                self.search_text.clear();
                self.search = SearchOutcome::TooShort;
                None
            }
            InputEvent::Resize { width, height } => {
                self.view.set_viewport(Viewport::new(width, height));
                None
            }
        };
        self.present(surface);
        request
    }

    /// Completes a load requested by `handle` or by [`Viewer::new`].
    ///
    /// Results for a resolution that is no longer pending are dropped.
    pub fn finish_load(
        &mut self,
        resolution: Resolution,
        result: Result<FeatureCollection, LoadError>,
        surface: &mut impl Surface,
    ) {
        if self.pending != Some(resolution) {
            debug!(%resolution, "dropping stale dataset");
            return;
        }
        self.pending = None;
        match result {
            Ok(collection) => {
                info!(%resolution, features = collection.len(), "dataset ready");
                self.activate(resolution, collection);
            }
            Err(e) => {
                warn!(%resolution, error = %e, "dataset load failed");
                self.status = LoadStatus::Failed(e.to_string());
                self.notify(Severity::Error, e.to_string());
            }
        }
        self.present(surface);
    }

    /// Draws one frame from the current state.
    ///
    /// A pending load does not block drawing; the active dataset stays on
    /// screen until the new one replaces it.
    pub fn redraw(&mut self, surface: &mut impl Surface) -> Result<(), RenderError> {
        let dataset = self.active.as_ref().ok_or(RenderError::NoDataset)?;
        let id = ProjectionId::from_str(self.view.projection_id())
            .map_err(RenderError::UnknownProjection)?;
        let viewport = self.view.viewport();

        let mut projection = self.factory.build_id(id, self.view.rotation(), viewport);
        if let Some(feature) = self.view.focus() {
            match self.fitter.fit(feature, id, viewport) {
                Ok(framing) => projection = projection.with_scale(framing.scale),
                Err(e) => debug!(error = %e, "focus keeps the world scale"),
            }
        }

        self.renderer.render(&self.view, dataset, &projection, surface);
        self.frames += 1;
        Ok(())
    }

    fn present(&mut self, surface: &mut impl Surface) {
        if let Err(e) = self.redraw(surface) {
            debug!(reason = %e, "render skipped");
        }
    }

    fn request_resolution(&mut self, resolution: Resolution) -> Option<Resolution> {
        if let Some(pending) = self.pending {
            let busy = LoadError::Busy {
                pending,
                requested: resolution,
            };
            self.notify(Severity::Warning, busy.to_string());
            return None;
        }
        if let Some(collection) = self.source.cached(resolution) {
            self.activate(resolution, collection);
            return None;
        }
        info!(%resolution, "requesting dataset");
        self.pending = Some(resolution);
        self.status = LoadStatus::Loading(resolution);
        Some(resolution)
    }

    fn activate(&mut self, resolution: Resolution, dataset: FeatureCollection) {
        self.view.set_resolution(resolution);
        self.status = LoadStatus::Ready;
        self.index = SearchIndex::build(&dataset);
        self.search = self.index.query(&self.search_text);
        let refocus = self
            .view
            .focus()
            .map(|f| f.name().to_string())
            .map(|name| (dataset.find_by_name(&name).cloned(), name));
        self.active = Some(dataset);

        let Some((found, name)) = refocus else {
            return;
        };
        match found {
            Some(feature) => self.view.set_focus(feature),
            None => {
                self.view.clear_focus();
                self.notify(
                    Severity::Info,
                    format!("{name:?} is not in the {resolution} dataset"),
                );
            }
        }
    }

    fn focus(&mut self, feature: Feature) {
        if let Ok(id) = ProjectionId::from_str(self.view.projection_id()) {
            match self.fitter.fit(&feature, id, self.view.viewport()) {
                Ok(framing) => self.view.set_rotation(framing.rotation),
                Err(e) => self.notify(Severity::Warning, e.to_string()),
            }
        }
        self.view.set_focus(feature);
    }

    fn notify(&mut self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Error => warn!(%message, "notice"),
            _ => debug!(%message, "notice"),
        }
        self.bus.emit(self.frames, severity, message);
    }
}


#[cfg(test)]
mod tests {
    use super::{LoadStatus, RenderError, Viewer};
    use crate::event_bus::Severity;
    use crate::{InputEvent, ViewerConfig};
    use foundation::math::Rotation;
    use layers::{DrawOp, LayerKind, RecordingSurface};
    use pretty_assertions::assert_eq;
    use scene::{FeatureCollection, Resolution};
    use streaming::{DatasetSources, FetchError, LoadError, MemoryFetcher};

    fn polygon(name: &str, ring: &[[f64; 2]]) -> String {
        let coords: Vec<String> = ring.iter().map(|[lon, lat]| format!("[{lon}, {lat}]")).collect();
        format!(
            r#"{{"type": "Feature", "properties": {{"name": "{name}"}},
                "geometry": {{"type": "Polygon", "coordinates": [[{}]]}}}}"#,
            coords.join(", ")
        )
    }

    fn rect(name: &str, lon0: f64, lat0: f64, lon1: f64, lat1: f64) -> String {
        polygon(
            name,
            &[[lon0, lat0], [lon1, lat0], [lon1, lat1], [lon0, lat1], [lon0, lat0]],
        )
    }

    fn collection(features: &[String]) -> String {
        format!(r#"{{"type": "FeatureCollection", "features": [{}]}}"#, features.join(", "))
    }

    fn world(names: &[&str]) -> String {
        let features: Vec<String> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let lon = -150.0 + 25.0 * i as f64;
                rect(name, lon, 0.0, lon + 10.0, 12.0)
            })
            .collect();
        collection(&features)
    }

    fn fetcher(coarse: String, fine: Option<String>) -> MemoryFetcher {
        let urls = DatasetSources::default();
        let fetcher = MemoryFetcher::new().with_payload(urls.coarse, coarse);
        match fine {
            Some(payload) => fetcher.with_payload(urls.fine, payload),
            None => fetcher,
        }
    }

    /// Runs the load the viewer asked for through its geometry source.
    fn complete_load(viewer: &mut Viewer<MemoryFetcher>, surface: &mut RecordingSurface) {
        let resolution = viewer.pending_load().unwrap();
        let result = pollster::block_on(viewer.source().load(resolution));
        viewer.finish_load(resolution, result, surface);
    }

    fn ready_viewer(surface: &mut RecordingSurface) -> Viewer<MemoryFetcher> {
        let fine = world(&["Peru", "Chad"]);
        let coarse = world(&["France", "French Guiana", "Chad", "Peru"]);
        let mut viewer = Viewer::new(&ViewerConfig::default(), fetcher(coarse, Some(fine)));
        complete_load(&mut viewer, surface);
        viewer
    }

    fn draws_in(surface: &RecordingSurface, layer: LayerKind) -> usize {
        let start = surface
            .ops
            .iter()
            .position(|op| *op == DrawOp::BeginLayer(layer))
            .unwrap();
        surface.ops[start + 1..]
            .iter()
            .take_while(|op| !matches!(op, DrawOp::EndLayer(_)))
            .count()
    }

    fn layers(surface: &RecordingSurface) -> Vec<LayerKind> {
        surface
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::BeginLayer(kind) => Some(*kind),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn nothing_renders_until_the_first_dataset_arrives() {
        let mut surface = RecordingSurface::default();
        let mut viewer = Viewer::new(&ViewerConfig::default(), fetcher(world(&["Chad"]), None));
        assert_eq!(viewer.status(), &LoadStatus::Loading(Resolution::Coarse));
        assert_eq!(viewer.pending_load(), Some(Resolution::Coarse));
        assert_eq!(viewer.redraw(&mut surface), Err(RenderError::NoDataset));
        viewer.handle(InputEvent::ToggleGrid, &mut surface);
        assert_eq!(viewer.frames_presented(), 0);
        assert!(surface.ops.is_empty());

        complete_load(&mut viewer, &mut surface);
        assert_eq!(viewer.status(), &LoadStatus::Ready);
        assert_eq!(viewer.frames_presented(), 1);
        assert!(!viewer.view().show_grid());
    }

    #[test]
    fn every_event_renders_once() {
        let mut surface = RecordingSurface::default();
        let mut viewer = ready_viewer(&mut surface);
        let before = viewer.frames_presented();
        for event in [
            InputEvent::ToggleDistortion,
            InputEvent::SetRotationLambda { deg: 40.0 },
            InputEvent::SetRotationPhi { deg: -20.0 },
            InputEvent::Resize {
                width: 400.0,
                height: 300.0,
            },
        ] {
            viewer.handle(event, &mut surface);
        }
        assert_eq!(viewer.frames_presented(), before + 4);
        assert_eq!(viewer.view().rotation(), Rotation::yaw_pitch(40.0, 20.0));
        assert_eq!(surface.ops[0], DrawOp::Clear);
    }

    #[test]
    fn events_keep_rendering_while_a_load_is_pending() {
        let mut surface = RecordingSurface::default();
        let mut viewer = ready_viewer(&mut surface);
        let before = viewer.frames_presented();

        let request = viewer.handle(
            InputEvent::SetResolution {
                resolution: Resolution::Fine,
            },
            &mut surface,
        );
        assert_eq!(request, Some(Resolution::Fine));
        viewer.handle(InputEvent::SetRotationLambda { deg: 40.0 }, &mut surface);
        viewer.handle(InputEvent::ToggleDistortion, &mut surface);

        assert_eq!(viewer.frames_presented(), before + 3);
        assert_eq!(viewer.status(), &LoadStatus::Loading(Resolution::Fine));
        assert_eq!(viewer.view().resolution(), Resolution::Coarse);
        assert_eq!(viewer.dataset().unwrap().len(), 4);
        assert!(!viewer.view().show_distortion());
    }

    #[test]
    fn unknown_projection_skips_render_and_reports() {
        let mut surface = RecordingSurface::default();
        let mut viewer = ready_viewer(&mut surface);
        let frames = viewer.frames_presented();
        viewer.handle(
            InputEvent::SelectProjection {
                id: "dymaxion".into(),
            },
            &mut surface,
        );
        assert_eq!(viewer.frames_presented(), frames);
        let notice = viewer.notices().last().unwrap();
        assert_eq!(notice.severity, Severity::Error);
        assert!(notice.message.contains("dymaxion"));

        viewer.handle(
            InputEvent::SelectProjection {
                id: "geoOrthographic".into(),
            },
            &mut surface,
        );
        assert_eq!(viewer.frames_presented(), frames + 1);
    }

    #[test]
    fn search_then_focus_a_hit() {
        let mut surface = RecordingSurface::default();
        let mut viewer = ready_viewer(&mut surface);
        viewer.handle(InputEvent::Search { text: "f".into() }, &mut surface);
        assert!(viewer.search_outcome().is_too_short());

        viewer.handle(InputEvent::Search { text: "FR".into() }, &mut surface);
        let names: Vec<&str> = viewer
            .search_outcome()
            .hits()
            .iter()
            .map(|h| h.name.as_str())
            .collect();
        assert_eq!(names, vec!["France", "French Guiana"]);

        viewer.handle(InputEvent::FocusSearchHit { index: 1 }, &mut surface);
        let focus = viewer.view().focus().unwrap();
        assert_eq!(focus.name(), "French Guiana");
        let centroid = focus.centroid().unwrap();
        let rotation = viewer.view().rotation();
        assert!((rotation.lambda_deg + centroid.lon_deg).abs() < 1e-9);
        assert!((rotation.phi_deg + centroid.lat_deg).abs() < 1e-9);
        assert_eq!(draws_in(&surface, LayerKind::Focus), 1);

        viewer.handle(InputEvent::Reset, &mut surface);
        assert!(viewer.view().focus().is_none());
        assert_eq!(viewer.search_text(), "");
        assert_eq!(draws_in(&surface, LayerKind::Focus), 0);
    }

    #[test]
    fn degenerate_focus_keeps_highlight_and_warns() {
        let mut surface = RecordingSurface::default();
        let payload = collection(&[
            rect("Chad", 14.0, 8.0, 24.0, 23.0),
            polygon("Speck", &[[10.0, 10.0]; 4]),
        ]);
        let mut viewer = Viewer::new(&ViewerConfig::default(), fetcher(payload, None));
        complete_load(&mut viewer, &mut surface);
        let frames = viewer.frames_presented();

        viewer.handle(InputEvent::Focus { name: "speck".into() }, &mut surface);
        assert_eq!(viewer.view().focus().map(|f| f.name()), Some("Speck"));
        assert_eq!(viewer.view().rotation(), Rotation::default());
        assert_eq!(viewer.frames_presented(), frames + 1);
        assert_eq!(viewer.notices().last().unwrap().severity, Severity::Warning);
    }

    #[test]
    fn resolution_switches_are_serialized() {
        let mut surface = RecordingSurface::default();
        let mut viewer = ready_viewer(&mut surface);
        viewer.handle(InputEvent::Focus { name: "chad".into() }, &mut surface);

        let request = viewer.handle(
            InputEvent::SetResolution {
                resolution: Resolution::Fine,
            },
            &mut surface,
        );
        assert_eq!(request, Some(Resolution::Fine));
        assert_eq!(viewer.status(), &LoadStatus::Loading(Resolution::Fine));

        let again = viewer.handle(
            InputEvent::SetResolution {
                resolution: Resolution::Coarse,
            },
            &mut surface,
        );
        assert_eq!(again, None);
        assert_eq!(viewer.notices().last().unwrap().severity, Severity::Warning);

        viewer.finish_load(
            Resolution::Coarse,
            Ok(FeatureCollection::default()),
            &mut surface,
        );
        assert_eq!(viewer.pending_load(), Some(Resolution::Fine));

        let frames = viewer.frames_presented();
        complete_load(&mut viewer, &mut surface);
        assert_eq!(viewer.view().resolution(), Resolution::Fine);
        assert_eq!(viewer.frames_presented(), frames + 1);
        let focus = viewer.view().focus().unwrap();
        assert_eq!(focus.name(), "Chad");
        assert_eq!(viewer.dataset().unwrap().find_by_name("chad"), Some(focus));

        // cached: no request, immediate switch
        let back = viewer.handle(
            InputEvent::SetResolution {
                resolution: Resolution::Coarse,
            },
            &mut surface,
        );
        assert_eq!(back, None);
        assert_eq!(viewer.view().resolution(), Resolution::Coarse);
        assert_eq!(viewer.status(), &LoadStatus::Ready);
        assert_eq!(viewer.dataset().unwrap().len(), 4);
        assert_eq!(viewer.source().fetch_count(Resolution::Coarse), 1);
        assert_eq!(viewer.source().fetch_count(Resolution::Fine), 1);
    }

    #[test]
    fn failed_load_keeps_the_previous_dataset() {
        let mut surface = RecordingSurface::default();
        let mut viewer = Viewer::new(&ViewerConfig::default(), fetcher(world(&["Chad"]), None));
        complete_load(&mut viewer, &mut surface);
        viewer.handle(
            InputEvent::SetResolution {
                resolution: Resolution::Fine,
            },
            &mut surface,
        );
        let frames = viewer.frames_presented();
        complete_load(&mut viewer, &mut surface);

        let err = LoadError::Fetch(FetchError::NotFound("data/world-50m.json".into()));
        assert_eq!(viewer.status(), &LoadStatus::Failed(err.to_string()));
        assert_eq!(viewer.view().resolution(), Resolution::Coarse);
        assert_eq!(viewer.dataset().unwrap().len(), 1);
        assert_eq!(viewer.frames_presented(), frames + 1);
        assert_eq!(viewer.notices().last().unwrap().severity, Severity::Error);
    }

    #[test]
    fn orthographic_session_draws_every_layer_and_the_overlay() {
        let config = ViewerConfig::from_json_str(r#"{"showDistortion": false}"#).unwrap();
        let chad = collection(&[rect("Chad", 14.0, 8.0, 24.0, 23.0)]);
        let mut surface = RecordingSurface::default();
        let mut viewer = Viewer::new(&config, fetcher(chad, None));
        complete_load(&mut viewer, &mut surface);
        assert_eq!(viewer.dataset().unwrap().len(), 1);
        assert_eq!(viewer.source().fetch_count(Resolution::Coarse), 1);

        for event in [
            InputEvent::SelectProjection {
                id: "orthographic".into(),
            },
            InputEvent::SetRotationLambda { deg: 10.0 },
            InputEvent::SetRotationPhi { deg: 20.0 },
            InputEvent::ToggleDistortion,
        ] {
            viewer.handle(event, &mut surface);
        }

        assert_eq!(viewer.frames_presented(), 5);
        assert_eq!(viewer.view().rotation(), Rotation::yaw_pitch(10.0, -20.0));
        assert_eq!(surface.ops[0], DrawOp::Clear);
        assert_eq!(layers(&surface), LayerKind::ORDER.to_vec());
        assert_eq!(draws_in(&surface, LayerKind::Grid), 1);
        assert_eq!(draws_in(&surface, LayerKind::Land), 1);
        assert_eq!(draws_in(&surface, LayerKind::Distortion), 99);
    }
}
