//! GeoJSON feature collections as returned by WFS GetFeature.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name reported for the geometry column.
pub const GEOMETRY_COLUMN: &str = "geometry";

/// A GeoJSON FeatureCollection.
///
/// Members other than `type` and `features` (`totalFeatures`, `crs`, ...)
/// are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureCollection {
    /// Type identifier (always "FeatureCollection").
    #[serde(rename = "type")]
    pub type_: String,

    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            type_: "FeatureCollection".to_string(),
            features,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Attribute names in first-seen order, followed by `geometry`.
    pub fn columns(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        for feature in &self.features {
            for key in feature.properties().keys() {
                if seen.insert(key.as_str()) {
                    columns.push(key.clone());
                }
            }
        }
        columns.push(GEOMETRY_COLUMN.to_string());
        columns
    }

    /// Whether any feature carries the attribute `name`.
    pub fn has_column(&self, name: &str) -> bool {
        self.features
            .iter()
            .any(|f| f.properties().contains_key(name))
    }
}

/// A single GeoJSON Feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    /// Type identifier (always "Feature").
    #[serde(rename = "type")]
    pub type_: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    /// Geometry object; `None` for features without geometry.
    #[serde(default)]
    pub geometry: Option<Value>,

    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

impl Feature {
    pub fn new(geometry: Option<Value>, properties: Map<String, Value>) -> Self {
        Self {
            type_: "Feature".to_string(),
            id: None,
            geometry,
            properties: Some(properties),
        }
    }

    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Attribute map; empty when the feature has `"properties": null`.
    pub fn properties(&self) -> &Map<String, Value> {
        static EMPTY: std::sync::OnceLock<Map<String, Value>> = std::sync::OnceLock::new();
        self.properties
            .as_ref()
            .unwrap_or_else(|| EMPTY.get_or_init(Map::new))
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties().get(name)
    }
}
