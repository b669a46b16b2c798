use console_error_panic_hook::set_once;
use gloo_net::http::Request;
use serde::Serialize;
use std::cell::RefCell;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use foundation::Viewport;
use runtime::{InputEvent, Viewer, ViewerConfig};
use scene::Resolution;
use streaming::{Fetch, FetchError};

mod canvas;
use canvas::Canvas2dSurface;

/// Fetches dataset payloads over HTTP.
#[derive(Debug, Default)]
pub struct HttpFetcher;

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let resp = Request::get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        if !resp.ok() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: resp.status(),
            });
        }
        resp.text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))
    }
}

struct AppState {
    viewer: Viewer<HttpFetcher>,
    surface: Canvas2dSurface,
}

thread_local! {
    static STATE: RefCell<Option<AppState>> = const { RefCell::new(None) };
}

fn with_app<R>(f: impl FnOnce(&mut AppState) -> R) -> Result<R, JsValue> {
    STATE.with(|state| {
        let mut s = state.borrow_mut();
        let app = s
            .as_mut()
            .ok_or_else(|| JsValue::from_str("viewer not initialised"))?;
        Ok(f(app))
    })
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    Ok(())
}

/// Browser console sink for `tracing`.
#[derive(Default)]
struct ConsoleWriter {
    buf: Vec<u8>,
}

impl std::io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if !self.buf.is_empty() {
            let line = String::from_utf8_lossy(&self.buf);
            web_sys::console::log_1(&JsValue::from_str(line.trim_end()));
            self.buf.clear();
        }
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let _ = std::io::Write::flush(self);
    }
}

fn init_logging(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_ansi(false)
        .without_time()
        .with_writer(ConsoleWriter::default)
        .try_init();
}

/// Attaches the viewer to a canvas and starts loading the first dataset.
///
/// `config_json` is an optional `ViewerConfig` document; omitted fields use
/// their defaults.
#[wasm_bindgen]
pub fn init(canvas_id: &str, config_json: Option<String>) -> Result<(), JsValue> {
    init_logging("info");
    let config = match config_json {
        Some(json) => ViewerConfig::from_json_str(&json).map_err(|e| JsValue::from_str(&e.to_string()))?,
        None => ViewerConfig::default(),
    };

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let canvas = document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| JsValue::from_str(&format!("missing {canvas_id}")))?
        .dyn_into::<HtmlCanvasElement>()?;
    let ctx = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into::<CanvasRenderingContext2d>()?;

    let surface = Canvas2dSurface::new(canvas, ctx, window.device_pixel_ratio());
    let viewer = Viewer::new(&config, HttpFetcher);
    let first = viewer.pending_load();
    let mut app = AppState { viewer, surface };
    let viewport = app.surface.viewport();
    app.viewer.handle(
        InputEvent::Resize {
            width: viewport.width(),
            height: viewport.height(),
        },
        &mut app.surface,
    );
    STATE.with(|state| *state.borrow_mut() = Some(app));
    tracing::info!(canvas = canvas_id, projection = %config.projection, "viewer initialised");

    if let Some(resolution) = first {
        spawn_load(resolution)?;
    }
    Ok(())
}

fn spawn_load(resolution: Resolution) -> Result<(), JsValue> {
    let source = with_app(|app| app.viewer.source())?;
    spawn_local(async move {
        let result = source.load(resolution).await;
        let finished = with_app(|app| app.viewer.finish_load(resolution, result, &mut app.surface));
        if let Err(err) = finished {
            web_sys::console::log_1(&err);
        }
    });
    Ok(())
}

fn dispatch(event: InputEvent) -> Result<(), JsValue> {
    let request = with_app(|app| app.viewer.handle(event, &mut app.surface))?;
    if let Some(resolution) = request {
        spawn_load(resolution)?;
    }
    Ok(())
}

/// Applies a JSON-encoded input event, e.g. `{"type": "toggleGrid"}`.
#[wasm_bindgen]
pub fn dispatch_json(event_json: &str) -> Result<(), JsValue> {
    let event: InputEvent =
        serde_json::from_str(event_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    dispatch(event)
}

#[wasm_bindgen]
pub fn select_projection(id: &str) -> Result<(), JsValue> {
    dispatch(InputEvent::SelectProjection { id: id.to_string() })
}

#[wasm_bindgen]
pub fn toggle_distortion() -> Result<(), JsValue> {
    dispatch(InputEvent::ToggleDistortion)
}

#[wasm_bindgen]
pub fn toggle_grid() -> Result<(), JsValue> {
    dispatch(InputEvent::ToggleGrid)
}

#[wasm_bindgen]
pub fn set_rotation_lambda(deg: f64) -> Result<(), JsValue> {
    dispatch(InputEvent::SetRotationLambda { deg })
}

#[wasm_bindgen]
pub fn set_rotation_phi(deg: f64) -> Result<(), JsValue> {
    dispatch(InputEvent::SetRotationPhi { deg })
}

#[wasm_bindgen]
pub fn set_resolution(key: &str) -> Result<(), JsValue> {
    let resolution: Resolution = key.parse().map_err(|e: String| JsValue::from_str(&e))?;
    dispatch(InputEvent::SetResolution { resolution })
}

/// Runs a search and returns the outcome as JSON.
#[wasm_bindgen]
pub fn search(text: &str) -> Result<String, JsValue> {
    dispatch(InputEvent::Search {
        text: text.to_string(),
    })?;
    with_app(|app| to_json(app.viewer.search_outcome()))?
}

#[wasm_bindgen]
pub fn focus(name: &str) -> Result<(), JsValue> {
    dispatch(InputEvent::Focus {
        name: name.to_string(),
    })
}

#[wasm_bindgen]
pub fn focus_search_hit(index: usize) -> Result<(), JsValue> {
    dispatch(InputEvent::FocusSearchHit { index })
}

#[wasm_bindgen]
pub fn reset() -> Result<(), JsValue> {
    dispatch(InputEvent::Reset)
}

/// Resizes the canvas backing store and redraws.
#[wasm_bindgen]
pub fn resize(width: f64, height: f64) -> Result<(), JsValue> {
    let dpr = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio());
    let viewport = Viewport::new(width, height);
    with_app(|app| app.surface.resize(viewport, dpr))?;
    dispatch(InputEvent::Resize {
        width: viewport.width(),
        height: viewport.height(),
    })
}

/// Selector rows as JSON: id, label, group and family.
#[wasm_bindgen]
pub fn projections() -> Result<String, JsValue> {
    to_json(&catalog::catalog_entries())
}

#[wasm_bindgen]
pub fn status() -> Result<String, JsValue> {
    with_app(|app| to_json(app.viewer.status()))?
}

/// Notices raised since the last call, oldest first, as JSON.
#[wasm_bindgen]
pub fn drain_notices() -> Result<String, JsValue> {
    with_app(|app| to_json(&app.viewer.drain_notices()))?
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewSummary<'a> {
    projection: &'a str,
    lambda: f64,
    phi: f64,
    show_grid: bool,
    show_distortion: bool,
    resolution: Resolution,
    focus: Option<&'a str>,
    search_text: &'a str,
    frames: u64,
}

/// Current view state as JSON, for syncing UI controls.
#[wasm_bindgen]
pub fn view_state() -> Result<String, JsValue> {
    with_app(|app| {
        let view = app.viewer.view();
        to_json(&ViewSummary {
            projection: view.projection_id(),
            lambda: view.rotation().lambda_deg,
            phi: -view.rotation().phi_deg,
            show_grid: view.show_grid(),
            show_distortion: view.show_distortion(),
            resolution: view.resolution(),
            focus: view.focus().map(|f| f.name()),
            search_text: app.viewer.search_text(),
            frames: app.viewer.frames_presented(),
        })
    })?
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))
}
