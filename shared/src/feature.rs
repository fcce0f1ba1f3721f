use serde::{Deserialize, Deserializer};

use crate::geometry::Geometry;

/// Region identifiers arrive as JSON strings or numbers depending on the
/// dataset; both normalise to a string key. Empty strings count as absent.
pub(crate) fn de_opt_key<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawKey {
        Text(String),
        Int(i64),
        Float(f64),
    }

    let raw = Option::<RawKey>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawKey::Text(s)) => Some(s).filter(|s| !s.is_empty()),
        Some(RawKey::Int(n)) => Some(n.to_string()),
        Some(RawKey::Float(f)) if f.fract() == 0.0 && f.is_finite() => {
            Some((f as i64).to_string())
        }
        Some(RawKey::Float(f)) => Some(f.to_string()),
        None => None,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FeatureProperties {
    #[serde(default, deserialize_with = "de_opt_key")]
    pub natcode: Option<String>,
    #[serde(default, deserialize_with = "de_opt_key")]
    pub mnemonic: Option<String>,
    #[serde(default, deserialize_with = "de_opt_key")]
    pub siruta_code: Option<String>,
    #[serde(default, deserialize_with = "de_opt_key")]
    pub uat_code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub county: Option<String>,
}

impl FeatureProperties {
    /// Name shown on the map: `name`, then `mnemonic`.
    pub fn display_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.mnemonic.as_deref())
    }

    pub fn feature_id(&self) -> &str {
        self.natcode
            .as_deref()
            .or(self.mnemonic.as_deref())
            .unwrap_or_default()
    }
}

/// One administrative region (`FeaturePolygon`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Option<FeatureProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_feature_collection_with_mixed_key_types() {
        let fc: FeatureCollection = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [0, 1], [1, 1]]]},
                    "properties": {"natcode": 54975, "name": "Cluj-Napoca", "siruta_code": "54975"}
                },
                {
                    "type": "Feature",
                    "geometry": null,
                    "properties": {"mnemonic": "CJ", "natcode": ""}
                }
            ]
        }))
        .expect("collection decodes");

        assert_eq!(fc.len(), 2);
        let first = fc.features[0].properties.as_ref().expect("properties");
        assert_eq!(first.natcode.as_deref(), Some("54975"));
        assert_eq!(first.display_name(), Some("Cluj-Napoca"));
        assert_eq!(first.feature_id(), "54975");

        let second = &fc.features[1];
        assert!(second.geometry.is_none());
        let props = second.properties.as_ref().expect("properties");
        assert_eq!(props.natcode, None);
        assert_eq!(props.display_name(), Some("CJ"));
        assert_eq!(props.feature_id(), "CJ");
    }

    #[test]
    fn missing_name_and_mnemonic_has_no_display_name() {
        let props = FeatureProperties {
            natcode: Some("1".into()),
            ..FeatureProperties::default()
        };
        assert_eq!(props.display_name(), None);
    }
}
