use budget_map_shared::{LatLng, LatLngBounds, ScreenPoint, ScreenSize};

use crate::config::clamp_pixel_ratio;
use crate::host::{HostError, MapHost};

/// Last observed map view plus the surface's placement in layer space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub zoom: f64,
    pub bounds: LatLngBounds,
    /// Layer-space position of the surface's top-left corner.
    pub origin: ScreenPoint,
    pub size: ScreenSize,
    pub pixel_ratio: f64,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            zoom: 0.0,
            bounds: LatLngBounds::new(0.0, 0.0, 0.0, 0.0),
            origin: ScreenPoint::default(),
            size: ScreenSize::default(),
            pixel_ratio: 1.0,
        }
    }
}

impl ViewportState {
    /// Re-read zoom and bounds from the map.
    pub fn refresh_view<H: MapHost>(&mut self, host: &H) -> Result<(), HostError> {
        let zoom = host.zoom()?;
        let bounds = host.bounds()?;
        self.zoom = zoom;
        self.bounds = bounds;
        Ok(())
    }

    /// Re-read the container size, the layer-space origin of the container's
    /// top-left corner and the clamped pixel ratio.
    pub fn refresh_placement<H: MapHost>(&mut self, host: &H) -> Result<(), HostError> {
        let size = host.size()?;
        let origin = host.container_point_to_layer_point(ScreenPoint::new(0.0, 0.0))?;
        self.size = size;
        self.origin = origin;
        self.pixel_ratio = clamp_pixel_ratio(host.device_pixel_ratio());
        Ok(())
    }

    /// Re-read only the origin; used after a pan settles.
    pub fn refresh_origin<H: MapHost>(&mut self, host: &H) -> Result<(), HostError> {
        self.origin = host.container_point_to_layer_point(ScreenPoint::new(0.0, 0.0))?;
        Ok(())
    }

    /// Surface-local pixel position of a geographic point.
    pub fn surface_point<H: MapHost>(&self, host: &H, point: LatLng) -> Result<ScreenPoint, HostError> {
        Ok(host.lat_lng_to_layer_point(point)?.subtract(self.origin))
    }
}
