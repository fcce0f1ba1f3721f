use budget_map_shared::{LatLng, LatLngBounds, ScreenPoint, ScreenSize};
use thiserror::Error;
use wasm_bindgen::JsValue;

/// Failures reported by the map host or the drawing surface. None of these are
/// fatal to the layer: the current pass is dropped and the previous labels stay.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    #[error("map overlay pane is detached")]
    PaneDetached,
    #[error("2d rendering context unavailable")]
    ContextUnavailable,
    #[error("label layer is not mounted")]
    NotMounted,
    #[error("map host call failed: {0}")]
    Js(String),
}

impl From<JsValue> for HostError {
    fn from(value: JsValue) -> Self {
        HostError::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

/// Map lifecycle notifications the layer reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MapEvent {
    MoveStart,
    Move,
    MoveEnd,
    ZoomStart,
    Zoom,
    ZoomEnd,
    Resize,
    ViewReset,
}

impl MapEvent {
    pub const ALL: [MapEvent; 8] = [
        MapEvent::MoveStart,
        MapEvent::Move,
        MapEvent::MoveEnd,
        MapEvent::ZoomStart,
        MapEvent::Zoom,
        MapEvent::ZoomEnd,
        MapEvent::Resize,
        MapEvent::ViewReset,
    ];

    /// Leaflet event name.
    pub fn name(self) -> &'static str {
        match self {
            MapEvent::MoveStart => "movestart",
            MapEvent::Move => "move",
            MapEvent::MoveEnd => "moveend",
            MapEvent::ZoomStart => "zoomstart",
            MapEvent::Zoom => "zoom",
            MapEvent::ZoomEnd => "zoomend",
            MapEvent::Resize => "resize",
            MapEvent::ViewReset => "viewreset",
        }
    }
}

/// Opaque id of a requested animation frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

/// A transparent 2D text surface stacked over the map.
pub trait LabelSurface {
    /// Resize to `size` CSS pixels with a backing store of `size * pixel_ratio`,
    /// resetting the transform so drawing stays in CSS pixels.
    fn resize(&mut self, size: ScreenSize, pixel_ratio: f64);
    /// Place the surface's top-left corner at `origin` in layer space.
    fn set_position(&mut self, origin: ScreenPoint);
    fn clear(&mut self);
    fn set_font(&mut self, font: &str);
    fn stroke_text(&mut self, text: &str, at: ScreenPoint, color: &str, width: f64);
    fn fill_text(&mut self, text: &str, at: ScreenPoint, color: &str);
}

/// Everything the layer needs from the interactive map.
///
/// Every query is fallible: the map may be torn down underneath the layer
/// between any two calls.
pub trait MapHost {
    type Surface: LabelSurface;

    fn overlay_pane_attached(&self) -> bool;
    fn zoom(&self) -> Result<f64, HostError>;
    fn bounds(&self) -> Result<LatLngBounds, HostError>;
    fn size(&self) -> Result<ScreenSize, HostError>;
    fn lat_lng_to_container_point(&self, point: LatLng) -> Result<ScreenPoint, HostError>;
    fn lat_lng_to_layer_point(&self, point: LatLng) -> Result<ScreenPoint, HostError>;
    fn container_point_to_layer_point(&self, point: ScreenPoint) -> Result<ScreenPoint, HostError>;
    fn device_pixel_ratio(&self) -> f64;

    fn subscribe(&mut self, event: MapEvent) -> Result<(), HostError>;
    fn unsubscribe(&mut self, event: MapEvent);

    fn request_animation_frame(&mut self) -> Result<FrameHandle, HostError>;
    fn cancel_animation_frame(&mut self, handle: FrameHandle);

    /// Create the surface and attach it to the overlay pane.
    fn mount_surface(&mut self) -> Result<Self::Surface, HostError>;
    fn unmount_surface(&mut self, surface: Self::Surface);
}
