use budget_map_shared::format::{ABBREVIATE_MAX_LEN, abbreviate_name, format_compact};
use budget_map_shared::geometry::{
    font_size_by_area, font_size_by_value, screen_area, screen_extent, shrink_to_fit,
};
use budget_map_shared::{Feature, LatLng, LatLngBounds};

use crate::config::{GranularityProfile, LabelLayerOptions};
use crate::host::{HostError, MapHost};
use crate::viewport::ViewportState;

/// One label ready to be painted. Rebuilt from scratch on every pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelDescriptor {
    pub text: String,
    /// Formatted amount; `Some` only when the sub-line is shown at this zoom.
    pub amount: Option<String>,
    pub position: LatLng,
    /// Union bounds of every part of the region.
    pub bounds: LatLngBounds,
    pub screen_area: f64,
    pub font_size: f64,
    pub visible: bool,
    pub feature_id: String,
}

impl LabelDescriptor {
    pub fn show_amount(&self) -> bool {
        self.amount.is_some()
    }
}

/// A visible, data-bearing feature waiting for its font size.
struct Candidate<'a> {
    name: &'a str,
    feature_id: &'a str,
    anchor: LatLng,
    bounds: LatLngBounds,
    amount: f64,
    population: Option<f64>,
}

/// Build the label list for the current view.
///
/// Returns an empty list when labels are off, geometry is missing or the zoom
/// is below the granularity's name threshold. A host failure aborts the whole
/// pass so the caller can keep the previous list.
pub fn process_labels<H: MapHost>(
    host: &H,
    options: &LabelLayerOptions,
    viewport: &ViewportState,
) -> Result<Vec<LabelDescriptor>, HostError> {
    if !options.show_labels {
        return Ok(Vec::new());
    }
    let Some(geometry) = options.geometry.as_deref() else {
        return Ok(Vec::new());
    };
    let profile = options.profile();
    if viewport.zoom < profile.name_min_zoom {
        return Ok(Vec::new());
    }

    let candidates: Vec<Candidate<'_>> = geometry
        .features
        .iter()
        .filter_map(|feature| candidate(feature, options, &viewport.bounds))
        .collect();

    // Sizing is relative to the most populous region currently in view.
    let max_population = candidates
        .iter()
        .filter_map(|c| c.population)
        .fold(0.0, f64::max);
    let show_amount = viewport.zoom >= profile.amount_min_zoom;

    let mut labels = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        labels.push(layout_label(
            host,
            candidate,
            options,
            profile,
            viewport.zoom,
            max_population,
            show_amount,
        )?);
    }
    Ok(labels)
}

fn candidate<'a>(
    feature: &'a Feature,
    options: &LabelLayerOptions,
    viewport: &LatLngBounds,
) -> Option<Candidate<'a>> {
    let properties = feature.properties.as_ref()?;
    let rings = feature.geometry.as_ref()?.label_rings()?;
    if !rings.intersects(viewport) {
        return None;
    }
    let name = properties.display_name()?;
    let point = options.data.lookup(properties)?;
    let amount = point.amount(options.normalization)?;

    Some(Candidate {
        name,
        feature_id: properties.feature_id(),
        anchor: rings.centroid()?,
        bounds: rings.bounds()?,
        amount,
        population: point.reference_population(options.granularity),
    })
}

fn layout_label<H: MapHost>(
    host: &H,
    candidate: Candidate<'_>,
    options: &LabelLayerOptions,
    profile: &GranularityProfile,
    zoom: f64,
    max_population: f64,
    show_amount: bool,
) -> Result<LabelDescriptor, HostError> {
    let north_east = host.lat_lng_to_container_point(candidate.bounds.north_east())?;
    let south_west = host.lat_lng_to_container_point(candidate.bounds.south_west())?;
    let extent = screen_extent(north_east, south_west);
    let area = screen_area(extent);

    let initial_size = match candidate.population {
        Some(population) if max_population > 0.0 => {
            font_size_by_value(population, max_population, zoom, profile.value_font)
        }
        _ => (font_size_by_area(area, zoom) * profile.area_scale).max(profile.area_floor),
    };

    let text = if options.abbreviate_names {
        abbreviate_name(candidate.name, ABBREVIATE_MAX_LEN)
    } else {
        candidate.name.to_string()
    };
    let font_size = shrink_to_fit(&text, initial_size, profile.shrink_floor, extent, show_amount);

    Ok(LabelDescriptor {
        text,
        amount: show_amount.then(|| format_compact(candidate.amount)),
        position: candidate.anchor,
        bounds: candidate.bounds,
        screen_area: area,
        font_size,
        visible: true,
        feature_id: candidate.feature_id.to_string(),
    })
}
