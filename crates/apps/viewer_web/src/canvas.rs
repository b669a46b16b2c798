use foundation::Viewport;
use layers::{LayerKind, Paint, Path, PathCommand, Surface};
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

/// Draws frames onto a 2D canvas. Paths are in logical pixels; the backing
/// store is sized for the device pixel ratio.
#[derive(Debug)]
pub struct Canvas2dSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    viewport: Viewport,
    dpr: f64,
}

impl Canvas2dSurface {
    pub fn new(canvas: HtmlCanvasElement, ctx: CanvasRenderingContext2d, dpr: f64) -> Self {
        let viewport = Viewport::new(
            f64::from(canvas.client_width()),
            f64::from(canvas.client_height()),
        );
        let mut surface = Self {
            canvas,
            ctx,
            viewport,
            dpr: 1.0,
        };
        surface.resize(viewport, dpr);
        surface
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, viewport: Viewport, dpr: f64) {
        self.viewport = viewport;
        self.dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        self.canvas
            .set_width((viewport.width() * self.dpr).round() as u32);
        self.canvas
            .set_height((viewport.height() * self.dpr).round() as u32);
    }

    fn trace(&self, path: &Path) {
        self.ctx.begin_path();
        for command in path.commands() {
            match *command {
                PathCommand::MoveTo(p) => self.ctx.move_to(p.x, p.y),
                PathCommand::LineTo(p) => self.ctx.line_to(p.x, p.y),
                PathCommand::ClosePath => self.ctx.close_path(),
            }
        }
    }
}

impl Surface for Canvas2dSurface {
    fn clear(&mut self) {
        let _ = self
            .ctx
            .set_transform(self.dpr, 0.0, 0.0, self.dpr, 0.0, 0.0);
        self.ctx
            .clear_rect(0.0, 0.0, self.viewport.width(), self.viewport.height());
    }

    fn begin_layer(&mut self, _layer: LayerKind) {
        self.ctx.save();
    }

    fn draw_path(&mut self, path: &Path, paint: &Paint) {
        if path.is_empty() {
            return;
        }
        self.trace(path);
        if let Some(fill) = paint.fill {
            ctx_set_fill_style(&self.ctx, &fill.to_css());
            // evenodd keeps holes open
            self.ctx
                .fill_with_canvas_winding_rule(web_sys::CanvasWindingRule::Evenodd);
        }
        if let Some(stroke) = paint.stroke {
            ctx_set_stroke_style(&self.ctx, &stroke.color.to_css());
            self.ctx.set_line_width(stroke.width);
            self.ctx.set_line_join("round");
            self.ctx.stroke();
        }
    }

    fn end_layer(&mut self, _layer: LayerKind) {
        self.ctx.restore();
    }
}

fn ctx_set_fill_style(ctx: &CanvasRenderingContext2d, value: &str) {
    let _ = js_sys::Reflect::set(
        ctx.as_ref(),
        &JsValue::from_str("fillStyle"),
        &JsValue::from_str(value),
    );
}

fn ctx_set_stroke_style(ctx: &CanvasRenderingContext2d, value: &str) {
    let _ = js_sys::Reflect::set(
        ctx.as_ref(),
        &JsValue::from_str("strokeStyle"),
        &JsValue::from_str(value),
    );
}
