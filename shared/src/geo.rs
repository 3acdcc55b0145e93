//! Minimal GeoJSON model for the two boundary documents.
//!
//! Positions follow GeoJSON order: `[longitude, latitude, ...]`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

pub type Position = Vec<f64>;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "collection_tag")]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<Feature>,
}

fn collection_tag() -> String {
    "FeatureCollection".to_string()
}

fn feature_tag() -> String {
    "Feature".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_tag")]
    pub kind: String,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: FeatureProperties,
}

/// GeoJSON allows `"properties": null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub territory_id: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Position),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

impl Geometry {
    fn for_each_position(&self, mut f: impl FnMut(&Position)) {
        match self {
            Self::Point(p) => f(p),
            Self::LineString(line) => line.iter().for_each(f),
            Self::MultiLineString(lines) | Self::Polygon(lines) => {
                lines.iter().flatten().for_each(f);
            }
            Self::MultiPolygon(polys) => polys.iter().flatten().flatten().for_each(f),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Geographic bounding box. Starts empty (invalid) and grows with `extend`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLngBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Default for LatLngBounds {
    fn default() -> Self {
        Self {
            south: f64::MAX,
            west: f64::MAX,
            north: f64::MIN,
            east: f64::MIN,
        }
    }
}

impl LatLngBounds {
    pub fn extend(&mut self, point: LatLng) {
        self.south = self.south.min(point.lat);
        self.north = self.north.max(point.lat);
        self.west = self.west.min(point.lng);
        self.east = self.east.max(point.lng);
    }

    pub fn is_valid(&self) -> bool {
        self.south <= self.north && self.west <= self.east
    }

    pub fn center(&self) -> LatLng {
        LatLng {
            lat: (self.south + self.north) / 2.0,
            lng: (self.west + self.east) / 2.0,
        }
    }

    /// `[[south, west], [north, east]]`, the corner-pair form map engines accept.
    pub fn corners(&self) -> [[f64; 2]; 2] {
        [[self.south, self.west], [self.north, self.east]]
    }
}

impl Feature {
    pub fn territory_id(&self) -> Option<&str> {
        self.properties.territory_id.as_deref()
    }

    /// Bounds of every finite position. Invalid when the feature has no geometry.
    pub fn bounds(&self) -> LatLngBounds {
        let mut bounds = LatLngBounds::default();
        if let Some(geometry) = &self.geometry {
            geometry.for_each_position(|pos| {
                if let [lng, lat, ..] = pos.as_slice()
                    && lat.is_finite()
                    && lng.is_finite()
                {
                    bounds.extend(LatLng {
                        lat: *lat,
                        lng: *lng,
                    });
                }
            });
        }
        bounds
    }
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: collection_tag(),
            features,
        }
    }

    /// Union of the bounds of every feature carrying the given territory id.
    pub fn bounds_for(&self, territory_id: &str) -> Option<LatLngBounds> {
        let mut found = false;
        let mut bounds = LatLngBounds::default();
        for feature in self
            .features
            .iter()
            .filter(|f| f.territory_id() == Some(territory_id))
        {
            found = true;
            let b = feature.bounds();
            if b.is_valid() {
                bounds.extend(LatLng {
                    lat: b.south,
                    lng: b.west,
                });
                bounds.extend(LatLng {
                    lat: b.north,
                    lng: b.east,
                });
            }
        }
        found.then_some(bounds)
    }

    pub fn territory_ids(&self) -> HashSet<&str> {
        self.features.iter().filter_map(Feature::territory_id).collect()
    }
}
