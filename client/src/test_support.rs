//! In-memory map host and surface for driving the engine in native tests.

use std::cell::RefCell;
use std::rc::Rc;

use budget_map_shared::geometry::Geometry;
use budget_map_shared::{
    Feature, FeatureCollection, FeatureProperties, HeatmapDataPoint, LatLng, LatLngBounds,
    ScreenPoint, ScreenSize,
};

use crate::host::{FrameHandle, HostError, LabelSurface, MapEvent, MapHost};

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Resize { size: ScreenSize, pixel_ratio: f64 },
    Position(ScreenPoint),
    Clear,
    Font(String),
    Stroke {
        text: String,
        at: ScreenPoint,
        color: String,
        width: f64,
    },
    Fill {
        text: String,
        at: ScreenPoint,
        color: String,
    },
}

pub type OpLog = Rc<RefCell<Vec<SurfaceOp>>>;

pub struct FakeSurface {
    ops: OpLog,
}

impl LabelSurface for FakeSurface {
    fn resize(&mut self, size: ScreenSize, pixel_ratio: f64) {
        self.ops.borrow_mut().push(SurfaceOp::Resize { size, pixel_ratio });
    }

    fn set_position(&mut self, origin: ScreenPoint) {
        self.ops.borrow_mut().push(SurfaceOp::Position(origin));
    }

    fn clear(&mut self) {
        self.ops.borrow_mut().push(SurfaceOp::Clear);
    }

    fn set_font(&mut self, font: &str) {
        self.ops.borrow_mut().push(SurfaceOp::Font(font.to_string()));
    }

    fn stroke_text(&mut self, text: &str, at: ScreenPoint, color: &str, width: f64) {
        self.ops.borrow_mut().push(SurfaceOp::Stroke {
            text: text.to_string(),
            at,
            color: color.to_string(),
            width,
        });
    }

    fn fill_text(&mut self, text: &str, at: ScreenPoint, color: &str) {
        self.ops.borrow_mut().push(SurfaceOp::Fill {
            text: text.to_string(),
            at,
            color: color.to_string(),
        });
    }
}

/// Plate carrée host: `px_per_degree` pixels per degree on both axes, the
/// container's top-left corner at (`view.north`, `view.west`).
pub struct FakeHost {
    pub zoom: f64,
    pub view: LatLngBounds,
    pub px_per_degree: f64,
    /// Layer-space position of the container's top-left corner.
    pub pane_offset: ScreenPoint,
    pub pixel_ratio: f64,
    pub pane_attached: bool,
    pub context_available: bool,
    pub subscribed: Vec<MapEvent>,
    pub frames_requested: Vec<FrameHandle>,
    pub frames_cancelled: Vec<FrameHandle>,
    pub surfaces_mounted: usize,
    pub surfaces_unmounted: usize,
    next_frame: i32,
    ops: OpLog,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            zoom: 10.0,
            view: LatLngBounds::new(44.0, 22.0, 48.0, 30.0),
            px_per_degree: 200.0,
            pane_offset: ScreenPoint::default(),
            pixel_ratio: 1.0,
            pane_attached: true,
            context_available: true,
            subscribed: Vec::new(),
            frames_requested: Vec::new(),
            frames_cancelled: Vec::new(),
            surfaces_mounted: 0,
            surfaces_unmounted: 0,
            next_frame: 0,
            ops: OpLog::default(),
        }
    }

    /// Drain the draw operations recorded so far.
    pub fn take_ops(&self) -> Vec<SurfaceOp> {
        std::mem::take(&mut *self.ops.borrow_mut())
    }

    pub fn last_frame(&self) -> Option<FrameHandle> {
        self.frames_requested.last().copied()
    }

    fn attached(&self) -> Result<(), HostError> {
        if self.pane_attached {
            Ok(())
        } else {
            Err(HostError::PaneDetached)
        }
    }
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MapHost for FakeHost {
    type Surface = FakeSurface;

    fn overlay_pane_attached(&self) -> bool {
        self.pane_attached
    }

    fn zoom(&self) -> Result<f64, HostError> {
        self.attached()?;
        Ok(self.zoom)
    }

    fn bounds(&self) -> Result<LatLngBounds, HostError> {
        self.attached()?;
        Ok(self.view)
    }

    fn size(&self) -> Result<ScreenSize, HostError> {
        self.attached()?;
        Ok(ScreenSize::new(
            (self.view.east - self.view.west) * self.px_per_degree,
            (self.view.north - self.view.south) * self.px_per_degree,
        ))
    }

    fn lat_lng_to_container_point(&self, point: LatLng) -> Result<ScreenPoint, HostError> {
        self.attached()?;
        Ok(ScreenPoint::new(
            (point.lng - self.view.west) * self.px_per_degree,
            (self.view.north - point.lat) * self.px_per_degree,
        ))
    }

    fn lat_lng_to_layer_point(&self, point: LatLng) -> Result<ScreenPoint, HostError> {
        let container = self.lat_lng_to_container_point(point)?;
        self.container_point_to_layer_point(container)
    }

    fn container_point_to_layer_point(&self, point: ScreenPoint) -> Result<ScreenPoint, HostError> {
        self.attached()?;
        Ok(ScreenPoint::new(
            point.x + self.pane_offset.x,
            point.y + self.pane_offset.y,
        ))
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn subscribe(&mut self, event: MapEvent) -> Result<(), HostError> {
        self.attached()?;
        self.subscribed.push(event);
        Ok(())
    }

    fn unsubscribe(&mut self, event: MapEvent) {
        self.subscribed.retain(|e| *e != event);
    }

    fn request_animation_frame(&mut self) -> Result<FrameHandle, HostError> {
        self.next_frame += 1;
        let handle = FrameHandle(self.next_frame);
        self.frames_requested.push(handle);
        Ok(handle)
    }

    fn cancel_animation_frame(&mut self, handle: FrameHandle) {
        self.frames_cancelled.push(handle);
    }

    fn mount_surface(&mut self) -> Result<FakeSurface, HostError> {
        self.attached()?;
        if !self.context_available {
            return Err(HostError::ContextUnavailable);
        }
        self.surfaces_mounted += 1;
        Ok(FakeSurface {
            ops: self.ops.clone(),
        })
    }

    fn unmount_surface(&mut self, _surface: FakeSurface) {
        self.surfaces_unmounted += 1;
    }
}

/// Axis-aligned square region with its south-west corner at (`south`, `west`).
pub fn square_feature(natcode: &str, name: &str, south: f64, west: f64, side: f64) -> Feature {
    Feature {
        geometry: Some(Geometry::Polygon(vec![square_ring(south, west, side)])),
        properties: Some(FeatureProperties {
            natcode: Some(natcode.to_string()),
            name: Some(name.to_string()),
            ..FeatureProperties::default()
        }),
    }
}

pub fn square_ring(south: f64, west: f64, side: f64) -> Vec<[f64; 2]> {
    vec![
        [west, south],
        [west, south + side],
        [west + side, south + side],
        [west + side, south],
    ]
}

pub fn collection(features: Vec<Feature>) -> Rc<FeatureCollection> {
    Rc::new(FeatureCollection { features })
}

pub fn uat_row(code: &str, total: f64, population: Option<f64>) -> HeatmapDataPoint {
    HeatmapDataPoint {
        uat_code: Some(code.to_string()),
        total_amount: Some(total),
        population,
        ..HeatmapDataPoint::default()
    }
}
