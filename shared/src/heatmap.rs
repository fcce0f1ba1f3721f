use std::collections::HashMap;

use serde::Deserialize;

use crate::feature::{FeatureProperties, de_opt_key};

/// Region resolution of the choropleth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum Granularity {
    /// Municipalities and communes (fine).
    #[default]
    #[serde(rename = "UAT", alias = "uat", alias = "fine")]
    Uat,
    /// Counties (coarse).
    #[serde(rename = "County", alias = "county", alias = "coarse")]
    County,
}

/// Which amount drives label text and sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    #[default]
    Total,
    PerCapita,
    TotalEuro,
    PerCapitaEuro,
}

/// Per-region metric row. UAT rows carry `uat_code`/`siruta_code`, county rows
/// carry `county_code`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HeatmapDataPoint {
    #[serde(default, deserialize_with = "de_opt_key")]
    pub uat_code: Option<String>,
    #[serde(default, deserialize_with = "de_opt_key")]
    pub siruta_code: Option<String>,
    #[serde(default, deserialize_with = "de_opt_key")]
    pub county_code: Option<String>,
    #[serde(default)]
    pub uat_name: Option<String>,
    #[serde(default)]
    pub county_name: Option<String>,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub per_capita_amount: Option<f64>,
    #[serde(default)]
    pub total_amount_eur: Option<f64>,
    #[serde(default)]
    pub per_capita_amount_eur: Option<f64>,
    #[serde(default)]
    pub population: Option<f64>,
    #[serde(default)]
    pub county_population: Option<f64>,
}

impl HeatmapDataPoint {
    pub fn is_uat(&self) -> bool {
        self.uat_code.is_some() || self.siruta_code.is_some()
    }

    pub fn amount(&self, normalization: Normalization) -> Option<f64> {
        let amount = match normalization {
            Normalization::Total => self.total_amount,
            Normalization::PerCapita => self.per_capita_amount,
            Normalization::TotalEuro => self.total_amount_eur,
            Normalization::PerCapitaEuro => self.per_capita_amount_eur,
        };
        amount.filter(|a| a.is_finite())
    }

    /// Population used to rank labels against each other.
    pub fn reference_population(&self, granularity: Granularity) -> Option<f64> {
        let population = match granularity {
            Granularity::Uat => self.population,
            Granularity::County => self.county_population.or(self.population),
        };
        population.filter(|p| p.is_finite() && *p > 0.0)
    }
}

/// Identifier fields tried, in order, to match a feature with its data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKey {
    Natcode,
    Mnemonic,
    SirutaCode,
    UatCode,
}

pub const LOOKUP_ORDER: [LookupKey; 4] = [
    LookupKey::Natcode,
    LookupKey::Mnemonic,
    LookupKey::SirutaCode,
    LookupKey::UatCode,
];

impl LookupKey {
    pub fn key_of(self, properties: &FeatureProperties) -> Option<&str> {
        match self {
            LookupKey::Natcode => properties.natcode.as_deref(),
            LookupKey::Mnemonic => properties.mnemonic.as_deref(),
            LookupKey::SirutaCode => properties.siruta_code.as_deref(),
            LookupKey::UatCode => properties.uat_code.as_deref(),
        }
    }
}

/// Heatmap rows indexed by every identifier they can be reached through.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeatmapDataMap {
    points: Vec<HeatmapDataPoint>,
    index: HashMap<String, usize>,
}

impl HeatmapDataMap {
    /// UAT rows are indexed by `uat_code` and `siruta_code`, county rows by
    /// `county_code`. Later rows overwrite earlier ones on key collisions.
    pub fn from_points(points: Vec<HeatmapDataPoint>) -> Self {
        let mut index = HashMap::with_capacity(points.len() * 2);
        for (idx, point) in points.iter().enumerate() {
            if point.is_uat() {
                for key in [&point.uat_code, &point.siruta_code].into_iter().flatten() {
                    index.insert(key.clone(), idx);
                }
            } else if let Some(key) = &point.county_code {
                index.insert(key.clone(), idx);
            }
        }
        Self { points, index }
    }

    pub fn get(&self, key: &str) -> Option<&HeatmapDataPoint> {
        self.index.get(key).map(|&idx| &self.points[idx])
    }

    /// First row matched by `LOOKUP_ORDER`.
    pub fn lookup(&self, properties: &FeatureProperties) -> Option<&HeatmapDataPoint> {
        self.lookup_with(&LOOKUP_ORDER, properties)
    }

    pub fn lookup_with(
        &self,
        order: &[LookupKey],
        properties: &FeatureProperties,
    ) -> Option<&HeatmapDataPoint> {
        order
            .iter()
            .filter_map(|strategy| strategy.key_of(properties))
            .find_map(|key| self.get(key))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
