use serde::Deserialize;

use crate::geo::{LatLng, LatLngBounds, Position, Ring, ScreenPoint, ScreenSize};

/// Average glyph advance as a fraction of the font size.
pub const GLYPH_WIDTH_RATIO: f64 = 0.6;
/// Share of the polygon's screen box a label may occupy.
pub const FIT_RATIO: f64 = 0.8;
pub const NAME_LINE_HEIGHT_RATIO: f64 = 1.2;
pub const NAME_WITH_AMOUNT_HEIGHT_RATIO: f64 = 2.5;
/// Exponential growth of label size per zoom level.
pub const ZOOM_FONT_BASE: f64 = 1.15;
pub const SHRINK_STEP: f64 = 0.5;

const AREA_FONT_BASE_SIZE: f64 = 12.0;
const AREA_FONT_REFERENCE_ZOOM: f64 = 7.0;
const AREA_FONT_MIN: f64 = 9.0;
const AREA_FONT_MAX: f64 = 20.0;

/// Polygonal geometry of a region. Anything that is not a (multi)polygon is kept
/// as `Unsupported` so a single odd feature never fails a whole collection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawGeometry")]
pub enum Geometry {
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
    Unsupported(String),
}

#[derive(Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: serde_json::Value,
}

fn rings_from(raw: Vec<Vec<Vec<f64>>>) -> Vec<Ring> {
    raw.into_iter()
        .map(|ring| {
            ring.into_iter()
                .filter(|pos| pos.len() >= 2)
                .map(|pos| [pos[0], pos[1]])
                .collect()
        })
        .collect()
}

impl From<RawGeometry> for Geometry {
    fn from(raw: RawGeometry) -> Self {
        match raw.kind.as_str() {
            "Polygon" => serde_json::from_value::<Vec<Vec<Vec<f64>>>>(raw.coordinates)
                .map(|rings| Geometry::Polygon(rings_from(rings)))
                .unwrap_or_else(|_| Geometry::Unsupported("Polygon (malformed)".to_string())),
            "MultiPolygon" => {
                serde_json::from_value::<Vec<Vec<Vec<Vec<f64>>>>>(raw.coordinates)
                    .map(|polys| Geometry::MultiPolygon(polys.into_iter().map(rings_from).collect()))
                    .unwrap_or_else(|_| {
                        Geometry::Unsupported("MultiPolygon (malformed)".to_string())
                    })
            }
            _ => Geometry::Unsupported(raw.kind),
        }
    }
}

/// The rings a label is derived from.
///
/// `primary` is the outer ring used for the anchor and value sizing. For a
/// multipolygon it is the part with the most vertices. `outer` holds the outer
/// ring of every part and drives culling and fit tests.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelRings<'a> {
    pub primary: &'a [Position],
    pub outer: Vec<&'a [Position]>,
}

impl Geometry {
    pub fn label_rings(&self) -> Option<LabelRings<'_>> {
        match self {
            Geometry::Polygon(rings) => {
                let outer = rings.first()?.as_slice();
                Some(LabelRings {
                    primary: outer,
                    outer: vec![outer],
                })
            }
            Geometry::MultiPolygon(polygons) => {
                let outer: Vec<&[Position]> = polygons
                    .iter()
                    .filter_map(|poly| poly.first().map(Vec::as_slice))
                    .collect();
                // Earliest part wins ties.
                let primary = outer
                    .iter()
                    .copied()
                    .reduce(|largest, ring| if ring.len() > largest.len() { ring } else { largest })?;
                Some(LabelRings { primary, outer })
            }
            Geometry::Unsupported(_) => None,
        }
    }
}

impl LabelRings<'_> {
    pub fn outer_positions(&self) -> impl Iterator<Item = &Position> + '_ {
        self.outer.iter().flat_map(|ring| ring.iter())
    }

    /// Union bounds over every part.
    pub fn bounds(&self) -> Option<LatLngBounds> {
        LatLngBounds::from_positions(self.outer_positions())
    }

    pub fn centroid(&self) -> Option<LatLng> {
        centroid(self.primary)
    }

    /// True when a vertex lies in `viewport`, or when the viewport center falls
    /// inside one of the parts (a region larger than the view).
    pub fn intersects(&self, viewport: &LatLngBounds) -> bool {
        if self
            .outer_positions()
            .any(|pos| viewport.contains(LatLng::from_position(*pos)))
        {
            return true;
        }
        let center = viewport.center();
        self.outer.iter().any(|ring| point_in_ring(center, ring))
    }
}

/// Arithmetic mean of the ring's vertices.
pub fn centroid(ring: &[Position]) -> Option<LatLng> {
    if ring.is_empty() {
        return None;
    }
    let (sum_lng, sum_lat) = ring
        .iter()
        .fold((0.0, 0.0), |(lng, lat), pos| (lng + pos[0], lat + pos[1]));
    let count = ring.len() as f64;
    Some(LatLng::new(sum_lat / count, sum_lng / count))
}

/// Even-odd ray casting.
pub fn point_in_ring(point: LatLng, ring: &[Position]) -> bool {
    let mut inside = false;
    let Some(mut prev) = ring.last() else {
        return false;
    };
    for cur in ring {
        let (xi, yi) = (cur[0], cur[1]);
        let (xj, yj) = (prev[0], prev[1]);
        if (yi > point.lat) != (yj > point.lat)
            && point.lng < (xj - xi) * (point.lat - yi) / (yj - yi) + xi
        {
            inside = !inside;
        }
        prev = cur;
    }
    inside
}

/// Pixel extent of a box given its projected north-east and south-west corners.
pub fn screen_extent(north_east: ScreenPoint, south_west: ScreenPoint) -> ScreenSize {
    ScreenSize::new(
        (north_east.x - south_west.x).abs(),
        (north_east.y - south_west.y).abs(),
    )
}

pub fn screen_area(extent: ScreenSize) -> f64 {
    extent.width * extent.height
}

pub fn estimate_text_width(text: &str, font_size: f64) -> f64 {
    text.chars().count() as f64 * font_size * GLYPH_WIDTH_RATIO
}

pub fn label_fits(text: &str, font_size: f64, extent: ScreenSize, with_amount: bool) -> bool {
    let height_ratio = if with_amount {
        NAME_WITH_AMOUNT_HEIGHT_RATIO
    } else {
        NAME_LINE_HEIGHT_RATIO
    };
    estimate_text_width(text, font_size) <= extent.width * FIT_RATIO
        && font_size * height_ratio <= extent.height * FIT_RATIO
}

/// Step the font size down until the label fits or `floor` is reached.
/// The result never goes below `floor`, even when the label still overflows.
pub fn shrink_to_fit(
    text: &str,
    font_size: f64,
    floor: f64,
    extent: ScreenSize,
    with_amount: bool,
) -> f64 {
    let mut size = font_size;
    while size > floor && !label_fits(text, size, extent, with_amount) {
        size -= SHRINK_STEP;
    }
    size.max(floor)
}

pub fn zoom_factor(zoom: f64, reference_zoom: f64) -> f64 {
    ZOOM_FONT_BASE.powf(zoom - reference_zoom)
}

/// Font bounds for value-driven sizing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueFontScale {
    pub min: f64,
    pub max: f64,
    pub reference_zoom: f64,
}

/// Size a label by its share of the peak reference value.
///
/// The square root keeps a handful of very large regions from flattening the
/// rest of the scale. Result is clamped to `[min, 1.3 * max]`.
pub fn font_size_by_value(value: f64, max_value: f64, zoom: f64, scale: ValueFontScale) -> f64 {
    let normalized = if max_value > 0.0 {
        (value / max_value).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let base = scale.min + (scale.max - scale.min) * normalized.sqrt();
    let size = base * zoom_factor(zoom, scale.reference_zoom);
    size.clamp(scale.min, scale.max * 1.3)
}

/// Size a label by the on-screen area of its bounding box.
pub fn font_size_by_area(screen_area: f64, zoom: f64) -> f64 {
    let area_factor = screen_area.max(0.0).sqrt() / 100.0;
    let size = AREA_FONT_BASE_SIZE * area_factor * zoom_factor(zoom, AREA_FONT_REFERENCE_ZOOM);
    size.clamp(AREA_FONT_MIN, AREA_FONT_MAX)
}
