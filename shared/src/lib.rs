pub mod colors;
pub mod feature;
pub mod format;
pub mod geo;
pub mod geometry;
pub mod heatmap;

pub use colors::{Hsl, heatmap_color};
pub use feature::{Feature, FeatureCollection, FeatureProperties};
pub use geo::{LatLng, LatLngBounds, Position, Ring, ScreenPoint, ScreenSize};
pub use geometry::{Geometry, LabelRings};
pub use heatmap::{Granularity, HeatmapDataMap, HeatmapDataPoint, LookupKey, Normalization};
