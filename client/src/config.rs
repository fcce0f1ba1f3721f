use std::rc::Rc;

use budget_map_shared::geometry::ValueFontScale;
use budget_map_shared::{FeatureCollection, Granularity, HeatmapDataMap, HeatmapDataPoint, Normalization};
use serde::{Deserialize, Deserializer};

/// Upper bound on the surface's backing-store scale; keeps 3x/4x displays from
/// allocating a huge bitmap for text that is legible at 2x.
pub const MAX_DEVICE_PIXEL_RATIO: f64 = 2.0;
pub const OVERLAY_PANE: &str = "overlayPane";
pub const SURFACE_CLASS: &str = "leaflet-zoom-hide leaflet-label-layer";
pub const SURFACE_Z_INDEX: &str = "450";
pub const FONT_FAMILY: &str = "Inter, system-ui, sans-serif";
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Zoom thresholds and font bounds for one map granularity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GranularityProfile {
    /// Below this zoom no labels are produced at all.
    pub name_min_zoom: f64,
    /// Below this zoom the amount sub-line is omitted.
    pub amount_min_zoom: f64,
    pub value_font: ValueFontScale,
    /// Area fallback: multiplier, then floor.
    pub area_scale: f64,
    pub area_floor: f64,
    /// Smallest size the fit loop may shrink to.
    pub shrink_floor: f64,
}

pub const UAT_PROFILE: GranularityProfile = GranularityProfile {
    name_min_zoom: 9.0,
    amount_min_zoom: 11.0,
    value_font: ValueFontScale {
        min: 12.0,
        max: 28.0,
        reference_zoom: 9.0,
    },
    area_scale: 1.0,
    area_floor: 12.0,
    shrink_floor: 8.0,
};

pub const COUNTY_PROFILE: GranularityProfile = GranularityProfile {
    name_min_zoom: 0.0,
    amount_min_zoom: 0.0,
    value_font: ValueFontScale {
        min: 11.0,
        max: 20.0,
        reference_zoom: 6.0,
    },
    area_scale: 0.85,
    area_floor: 11.0,
    shrink_floor: 9.0,
};

pub fn profile(granularity: Granularity) -> &'static GranularityProfile {
    match granularity {
        Granularity::Uat => &UAT_PROFILE,
        Granularity::County => &COUNTY_PROFILE,
    }
}

/// Paint style of one text line (outline first, then fill).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub weight: u16,
    pub fill: &'static str,
    pub stroke: &'static str,
}

pub const NAME_STYLE: TextStyle = TextStyle {
    weight: 600,
    fill: "#1f2937",
    stroke: "#ffffff",
};
pub const NAME_STROKE_WIDTH: f64 = 3.0;
/// Name is lifted by this many pixels when an amount line sits below it.
pub const NAME_LIFT_WITH_AMOUNT: f64 = 6.0;

/// Amount line is inverted: light glyphs on a dark halo.
pub const AMOUNT_STYLE: TextStyle = TextStyle {
    weight: 500,
    fill: "#ffffff",
    stroke: "#1f2937",
};
pub const AMOUNT_SIZE_RATIO: f64 = 0.75;
pub const AMOUNT_OFFSET_RATIO: f64 = 0.7;
pub const AMOUNT_STROKE_MIN: f64 = 2.0;
pub const AMOUNT_STROKE_MAX: f64 = 4.0;
pub const AMOUNT_STROKE_PER_ZOOM: f64 = 0.25;

pub fn font_css(weight: u16, size_px: f64) -> String {
    format!("{weight} {size_px}px {FONT_FAMILY}")
}

pub fn amount_stroke_width(zoom: f64, profile: &GranularityProfile) -> f64 {
    let steps = zoom - profile.value_font.reference_zoom;
    (AMOUNT_STROKE_MIN + steps * AMOUNT_STROKE_PER_ZOOM).clamp(AMOUNT_STROKE_MIN, AMOUNT_STROKE_MAX)
}

/// Cap the display's pixel ratio at `MAX_DEVICE_PIXEL_RATIO`. Ratios below 1
/// pass through; zero, negative and non-finite values fall back to 1.
pub fn clamp_pixel_ratio(raw: f64) -> f64 {
    if raw.is_finite() && raw > 0.0 {
        raw.min(MAX_DEVICE_PIXEL_RATIO)
    } else {
        1.0
    }
}

/// Current configuration of a label layer.
#[derive(Debug, Clone, Default)]
pub struct LabelLayerOptions {
    pub geometry: Option<Rc<FeatureCollection>>,
    pub granularity: Granularity,
    pub data: Rc<HeatmapDataMap>,
    pub normalization: Normalization,
    pub show_labels: bool,
    pub abbreviate_names: bool,
}

/// Partial update; `None` leaves a field untouched. `geometry: Some(None)`
/// clears the geometry.
#[derive(Debug, Clone, Default)]
pub struct LabelLayerOptionsPatch {
    pub geometry: Option<Option<Rc<FeatureCollection>>>,
    pub granularity: Option<Granularity>,
    pub data: Option<Rc<HeatmapDataMap>>,
    pub normalization: Option<Normalization>,
    pub show_labels: Option<bool>,
    pub abbreviate_names: Option<bool>,
}

impl LabelLayerOptions {
    pub fn merge(&mut self, patch: LabelLayerOptionsPatch) {
        let LabelLayerOptionsPatch {
            geometry,
            granularity,
            data,
            normalization,
            show_labels,
            abbreviate_names,
        } = patch;
        if let Some(geometry) = geometry {
            self.geometry = geometry;
        }
        if let Some(granularity) = granularity {
            self.granularity = granularity;
        }
        if let Some(data) = data {
            self.data = data;
        }
        if let Some(normalization) = normalization {
            self.normalization = normalization;
        }
        if let Some(show_labels) = show_labels {
            self.show_labels = show_labels;
        }
        if let Some(abbreviate_names) = abbreviate_names {
            self.abbreviate_names = abbreviate_names;
        }
    }

    pub fn profile(&self) -> &'static GranularityProfile {
        profile(self.granularity)
    }
}

/// Distinguish an explicit `null` (clear) from an absent key (keep).
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Options object as passed from JavaScript, for both construction and updates.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelLayerOptionsInput {
    #[serde(default, deserialize_with = "present")]
    pub geo_json_data: Option<Option<FeatureCollection>>,
    #[serde(default)]
    pub map_view_type: Option<Granularity>,
    #[serde(default)]
    pub heatmap_data: Option<Vec<HeatmapDataPoint>>,
    #[serde(default)]
    pub normalization: Option<Normalization>,
    #[serde(default)]
    pub show_labels: Option<bool>,
    #[serde(default)]
    pub abbreviate_names: Option<bool>,
}

impl LabelLayerOptionsInput {
    pub fn into_patch(self) -> LabelLayerOptionsPatch {
        LabelLayerOptionsPatch {
            geometry: self.geo_json_data.map(|fc| fc.map(Rc::new)),
            granularity: self.map_view_type,
            data: self
                .heatmap_data
                .map(|points| Rc::new(HeatmapDataMap::from_points(points))),
            normalization: self.normalization,
            show_labels: self.show_labels,
            abbreviate_names: self.abbreviate_names,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pixel_ratio_is_clamped() {
        assert_eq!(clamp_pixel_ratio(1.0), 1.0);
        assert_eq!(clamp_pixel_ratio(1.5), 1.5);
        assert_eq!(clamp_pixel_ratio(0.5), 0.5);
        assert_eq!(clamp_pixel_ratio(-2.0), 1.0);
        assert_eq!(clamp_pixel_ratio(3.0), 2.0);
        assert_eq!(clamp_pixel_ratio(0.0), 1.0);
        assert_eq!(clamp_pixel_ratio(f64::NAN), 1.0);
    }

    #[test]
    fn amount_stroke_scales_mildly_with_zoom() {
        assert_eq!(amount_stroke_width(9.0, &UAT_PROFILE), 2.0);
        assert_eq!(amount_stroke_width(11.0, &UAT_PROFILE), 2.5);
        assert_eq!(amount_stroke_width(30.0, &UAT_PROFILE), 4.0);
        assert_eq!(amount_stroke_width(3.0, &COUNTY_PROFILE), 2.0);
    }

    #[test]
    fn merge_only_touches_present_fields() {
        let mut options = LabelLayerOptions {
            show_labels: true,
            geometry: Some(Rc::new(FeatureCollection::default())),
            ..LabelLayerOptions::default()
        };
        options.merge(LabelLayerOptionsPatch {
            normalization: Some(Normalization::PerCapita),
            ..LabelLayerOptionsPatch::default()
        });
        assert!(options.show_labels);
        assert!(options.geometry.is_some());
        assert_eq!(options.normalization, Normalization::PerCapita);

        options.merge(LabelLayerOptionsPatch {
            geometry: Some(None),
            ..LabelLayerOptionsPatch::default()
        });
        assert!(options.geometry.is_none());
    }

    #[test]
    fn js_input_distinguishes_null_from_absent_geometry() {
        let absent: LabelLayerOptionsInput =
            serde_json::from_value(json!({"showLabels": false})).expect("input decodes");
        assert!(absent.geo_json_data.is_none());
        assert_eq!(absent.show_labels, Some(false));

        let cleared: LabelLayerOptionsInput =
            serde_json::from_value(json!({"geoJsonData": null})).expect("input decodes");
        assert!(matches!(cleared.geo_json_data, Some(None)));
    }

    #[test]
    fn js_input_builds_indexed_data_map() {
        let input: LabelLayerOptionsInput = serde_json::from_value(json!({
            "mapViewType": "County",
            "normalization": "per_capita",
            "heatmapData": [{"county_code": "CJ", "total_amount": 10.0, "per_capita_amount": 1.0}],
            "geoJsonData": {"type": "FeatureCollection", "features": []}
        }))
        .expect("input decodes");
        let mut options = LabelLayerOptions::default();
        options.merge(input.into_patch());

        assert_eq!(options.granularity, Granularity::County);
        assert_eq!(options.profile(), &COUNTY_PROFILE);
        assert!(options.data.get("CJ").is_some());
        assert!(options.geometry.is_some_and(|fc| fc.is_empty()));
    }
}
