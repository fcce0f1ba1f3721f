use budget_map_shared::{LatLngBounds, ScreenPoint};

use crate::config::{
    AMOUNT_OFFSET_RATIO, AMOUNT_SIZE_RATIO, AMOUNT_STYLE, GranularityProfile, NAME_LIFT_WITH_AMOUNT,
    NAME_STROKE_WIDTH, NAME_STYLE, TextStyle, amount_stroke_width, font_css,
};
use crate::host::{FrameHandle, HostError, LabelSurface, MapHost};
use crate::label_layout::LabelDescriptor;
use crate::viewport::ViewportState;

/// Pan and zoom gestures in progress. While either is set nothing is drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GestureState {
    pub panning: bool,
    pub zooming: bool,
}

impl GestureState {
    pub fn active(&self) -> bool {
        self.panning || self.zooming
    }
}

/// Batches draw requests into animation frames.
///
/// At most one frame is outstanding; further requests while it is pending are
/// coalesced into it. Requests during a gesture are dropped, the gesture's
/// settle event schedules a fresh draw.
#[derive(Debug, Default)]
pub struct DrawScheduler {
    pending: Option<FrameHandle>,
}

impl DrawScheduler {
    /// Returns `Ok(true)` when a new frame was requested.
    pub fn schedule<H: MapHost>(
        &mut self,
        host: &mut H,
        gesture: GestureState,
    ) -> Result<bool, HostError> {
        if self.pending.is_some() || gesture.active() {
            return Ok(false);
        }
        let handle = host.request_animation_frame()?;
        self.pending = Some(handle);
        Ok(true)
    }

    /// Consume the pending request if `handle` is it. Stale handles are refused.
    pub fn take_frame(&mut self, handle: FrameHandle) -> bool {
        if self.pending == Some(handle) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn cancel<H: MapHost>(&mut self, host: &mut H) {
        if let Some(handle) = self.pending.take() {
            host.cancel_animation_frame(handle);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Paint `labels` onto an already cleared surface, smallest first so larger
/// labels end up on top. Returns the number of labels painted.
pub fn draw_labels<H: MapHost, S: LabelSurface>(
    surface: &mut S,
    host: &H,
    labels: &[LabelDescriptor],
    viewport: &ViewportState,
    view_bounds: &LatLngBounds,
    profile: &GranularityProfile,
) -> Result<usize, HostError> {
    let mut order: Vec<&LabelDescriptor> = labels
        .iter()
        .filter(|label| label.visible && view_bounds.contains(label.position))
        .collect();
    order.sort_by(|a, b| a.font_size.total_cmp(&b.font_size));

    let amount_stroke = amount_stroke_width(viewport.zoom, profile);
    for label in &order {
        let anchor = viewport.surface_point(host, label.position)?;
        draw_label(surface, label, anchor, amount_stroke);
    }
    Ok(order.len())
}

fn draw_label<S: LabelSurface>(
    surface: &mut S,
    label: &LabelDescriptor,
    anchor: ScreenPoint,
    amount_stroke: f64,
) {
    let name_y = if label.show_amount() {
        anchor.y - NAME_LIFT_WITH_AMOUNT
    } else {
        anchor.y
    };
    draw_text(
        surface,
        &label.text,
        ScreenPoint::new(anchor.x, name_y),
        label.font_size,
        NAME_STYLE,
        NAME_STROKE_WIDTH,
    );

    if let Some(amount) = &label.amount {
        let amount_at = ScreenPoint::new(anchor.x, anchor.y + label.font_size * AMOUNT_OFFSET_RATIO);
        draw_text(
            surface,
            amount,
            amount_at,
            label.font_size * AMOUNT_SIZE_RATIO,
            AMOUNT_STYLE,
            amount_stroke,
        );
    }
}

/// Outline first, then the glyphs over it.
fn draw_text<S: LabelSurface>(
    surface: &mut S,
    text: &str,
    at: ScreenPoint,
    font_size: f64,
    style: TextStyle,
    stroke_width: f64,
) {
    surface.set_font(&font_css(style.weight, font_size));
    surface.stroke_text(text, at, style.stroke, stroke_width);
    surface.fill_text(text, at, style.fill);
}
