use serde::{Deserialize, Serialize};

/// A GeoJSON position: `[lng, lat]`.
pub type Position = [f64; 2];

/// A closed or open ring of GeoJSON positions.
pub type Ring = Vec<Position>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Convert a GeoJSON `[lng, lat]` position.
    pub const fn from_position(position: Position) -> Self {
        Self {
            lat: position[1],
            lng: position[0],
        }
    }
}

/// Geographic rectangle, inclusive on every edge (Leaflet `LatLngBounds` semantics).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl LatLngBounds {
    pub const fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// Smallest bounds containing every position, or `None` for an empty iterator.
    pub fn from_positions<'a>(positions: impl IntoIterator<Item = &'a Position>) -> Option<Self> {
        let mut iter = positions.into_iter();
        let first = LatLng::from_position(*iter.next()?);
        let mut bounds = Self::new(first.lat, first.lng, first.lat, first.lng);
        for position in iter {
            bounds.extend(LatLng::from_position(*position));
        }
        Some(bounds)
    }

    pub fn extend(&mut self, point: LatLng) {
        self.south = self.south.min(point.lat);
        self.north = self.north.max(point.lat);
        self.west = self.west.min(point.lng);
        self.east = self.east.max(point.lng);
    }

    pub fn contains(&self, point: LatLng) -> bool {
        point.lat >= self.south
            && point.lat <= self.north
            && point.lng >= self.west
            && point.lng <= self.east
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    pub fn north_east(&self) -> LatLng {
        LatLng::new(self.north, self.east)
    }

    pub fn south_west(&self) -> LatLng {
        LatLng::new(self.south, self.west)
    }
}

/// A pixel coordinate in some screen space (container, layer or surface-local).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn subtract(self, other: ScreenPoint) -> ScreenPoint {
        ScreenPoint::new(self.x - other.x, self.y - other.y)
    }
}

/// Pixel size of a map container or surface.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: f64,
    pub height: f64,
}

impl ScreenSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn scaled(self, factor: f64) -> ScreenSize {
        ScreenSize::new(self.width * factor, self.height * factor)
    }
}
