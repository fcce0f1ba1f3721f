use budget_map_shared::{ScreenPoint, ScreenSize};
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement};

use crate::config::{SURFACE_CLASS, SURFACE_Z_INDEX};
use crate::host::{HostError, LabelSurface};

/// Transparent 2D canvas stacked in the map's overlay pane. Drawing happens in
/// CSS pixels; the backing store is scaled by the pixel ratio on resize.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    css_size: ScreenSize,
}

impl CanvasSurface {
    pub fn create(document: &Document) -> Result<Self, HostError> {
        let canvas = document
            .create_element("canvas")?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| HostError::Js("created element is not a canvas".to_string()))?;
        canvas.set_class_name(SURFACE_CLASS);

        let style = canvas.style();
        style.set_property("position", "absolute")?;
        style.set_property("top", "0")?;
        style.set_property("left", "0")?;
        style.set_property("pointer-events", "none")?;
        style.set_property("z-index", SURFACE_Z_INDEX)?;

        let ctx = canvas
            .get_context("2d")?
            .ok_or(HostError::ContextUnavailable)?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| HostError::ContextUnavailable)?;

        Ok(Self {
            canvas,
            ctx,
            css_size: ScreenSize::default(),
        })
    }

    pub fn element(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Detach the canvas from whatever parent holds it.
    pub fn remove(&self) {
        self.canvas.remove();
    }

    fn apply_text_state(&self) {
        self.ctx.set_text_align("center");
        self.ctx.set_text_baseline("middle");
        self.ctx.set_line_join("round");
    }
}

impl LabelSurface for CanvasSurface {
    fn resize(&mut self, size: ScreenSize, pixel_ratio: f64) {
        let backing = size.scaled(pixel_ratio);
        // Assigning width/height resets the context state, transform included.
        self.canvas.set_width(backing.width.round().max(0.0) as u32);
        self.canvas.set_height(backing.height.round().max(0.0) as u32);
        let style = self.canvas.style();
        style
            .set_property("width", &format!("{}px", size.width))
            .ok();
        style
            .set_property("height", &format!("{}px", size.height))
            .ok();
        self.ctx
            .set_transform(pixel_ratio, 0.0, 0.0, pixel_ratio, 0.0, 0.0)
            .ok();
        self.apply_text_state();
        self.css_size = size;
    }

    fn set_position(&mut self, origin: ScreenPoint) {
        self.canvas
            .style()
            .set_property(
                "transform",
                &format!("translate3d({}px, {}px, 0)", origin.x, origin.y),
            )
            .ok();
    }

    fn clear(&mut self) {
        self.ctx
            .clear_rect(0.0, 0.0, self.css_size.width, self.css_size.height);
    }

    fn set_font(&mut self, font: &str) {
        self.ctx.set_font(font);
    }

    fn stroke_text(&mut self, text: &str, at: ScreenPoint, color: &str, width: f64) {
        self.ctx.set_stroke_style_str(color);
        self.ctx.set_line_width(width);
        self.ctx.stroke_text(text, at.x, at.y).ok();
    }

    fn fill_text(&mut self, text: &str, at: ScreenPoint, color: &str) {
        self.ctx.set_fill_style_str(color);
        self.ctx.fill_text(text, at.x, at.y).ok();
    }
}
