//! Canvas text labels for a Leaflet choropleth.
//!
//! Region names and their amounts are painted onto one canvas in the map's
//! overlay pane instead of one DOM node per region. The engine is generic over
//! [`host::MapHost`]; [`leaflet::LeafletHost`] is the browser implementation
//! and [`bindings::CanvasLabelLayer`] the JavaScript entry point.

pub mod bindings;
pub mod canvas;
pub mod config;
pub mod host;
pub mod label_layout;
pub mod layer;
pub mod leaflet;
pub mod logging;
pub mod render_loop;
pub mod viewport;

#[cfg(test)]
mod test_support;

pub use bindings::CanvasLabelLayer;
pub use config::{LabelLayerOptions, LabelLayerOptionsPatch};
pub use host::{HostError, LabelSurface, MapEvent, MapHost};
pub use label_layout::LabelDescriptor;
pub use layer::{LabelLayer, LayerPhase};
