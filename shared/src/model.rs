use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::geo::LatLng;

/// A faction. Its color styles both territories and places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clan {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// Territory row as returned by the read API, joined to its dominant clan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Territory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub dominant_clan_id: Option<String>,
    /// Embedded dominant clan (`clan:clans!...(*)` in the select).
    #[serde(default)]
    pub clan: Option<Clan>,
    #[serde(default)]
    pub governor: Option<String>,
    #[serde(default)]
    pub governor_id: Option<String>,
    #[serde(default)]
    pub importance: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_description")]
    pub description: TerritoryDescription,
    /// Derived after load from the merged boundary document, never read from the API.
    #[serde(default, skip_deserializing)]
    pub has_polygon: bool,
}

impl Territory {
    pub fn importance_tier(&self) -> Option<Importance> {
        self.importance.as_deref().and_then(Importance::parse)
    }

    pub fn is_dominated_by(&self, clan_id: &str) -> bool {
        self.dominant_clan_id.as_deref() == Some(clan_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerritoryDescription {
    pub ambiance: Option<String>,
    pub wealth: Option<u8>,
}

impl TerritoryDescription {
    /// Wealth clamped to the 0..=5 star scale.
    pub fn wealth_stars(&self) -> Option<u8> {
        self.wealth.filter(|w| *w > 0).map(|w| w.min(5))
    }
}

/// Importance tiers, most important first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Importance {
    Critical,
    Strategic,
    Major,
    Strong,
    Medium,
    Minor,
    Natural,
}

impl Importance {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "critical" => Some(Self::Critical),
            "strategic" => Some(Self::Strategic),
            "major" => Some(Self::Major),
            "strong" => Some(Self::Strong),
            "medium" => Some(Self::Medium),
            "minor" => Some(Self::Minor),
            "natural" => Some(Self::Natural),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::Strategic => "Strategic",
            Self::Major => "Major",
            Self::Strong => "Strong",
            Self::Medium => "Medium",
            Self::Minor => "Minor",
            Self::Natural => "Natural",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerritoryName {
    pub name: String,
}

/// Point of interest, joined to its territory's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub territory_id: Option<String>,
    #[serde(default)]
    pub territory: Option<TerritoryName>,
    #[serde(default)]
    pub clan_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub protection: Option<u8>,
    /// Visible to players.
    #[serde(default)]
    pub known: Option<bool>,
    #[serde(default)]
    pub clan_overrides: Option<Vec<String>>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_description")]
    pub description: PlaceDescription,
}

pub const SANCTUARY_TAG: &str = "sanctuary";
pub const MAX_PROTECTION: u8 = 6;

impl Place {
    /// Both coordinates, when present and finite.
    pub fn position(&self) -> Option<LatLng> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => {
                Some(LatLng { lat, lng })
            }
            _ => None,
        }
    }

    pub fn is_sanctuary(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.to_lowercase().contains(SANCTUARY_TAG))
    }

    pub fn protection_level(&self) -> u8 {
        self.protection.unwrap_or(0).min(MAX_PROTECTION)
    }

    pub fn is_known(&self) -> bool {
        self.known.unwrap_or(false)
    }

    pub fn territory_name(&self) -> Option<&str> {
        self.territory.as_ref().map(|t| t.name.as_str())
    }

    pub fn belongs_to_clan(&self, clan_id: &str) -> bool {
        self.clan_id.as_deref() == Some(clan_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceDescription {
    pub ambiance: Option<String>,
    pub utility: Option<String>,
    pub occult_security: Option<String>,
    pub special_guardian: Option<String>,
    pub gm_secrets: BTreeMap<String, serde_json::Value>,
}

/// Descriptions are stored either as a JSON object or as a string holding one.
/// Anything else, including malformed text, yields the default.
fn lenient_description<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(parse_description(value))
}

pub fn parse_description<T: DeserializeOwned + Default>(value: serde_json::Value) -> T {
    match value {
        serde_json::Value::String(text) => serde_json::from_str(&text).unwrap_or_default(),
        serde_json::Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
        _ => T::default(),
    }
}

/// Render a secret value for display: strings verbatim, anything else as JSON.
pub fn secret_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn territory_decodes_embedded_clan_and_string_description() {
        let t: Territory = serde_json::from_value(json!({
            "id": "marais",
            "name": "Le Marais",
            "dominant_clan_id": "alpha",
            "clan": { "id": "alpha", "name": "Alpha", "color": "#ff0000" },
            "governor": "Anne",
            "governor_id": "anne",
            "importance": "Strategic",
            "description": "{\"ambiance\":\"Fog and lanterns\",\"wealth\":9}",
            "has_polygon": true
        }))
        .unwrap();

        assert_eq!(t.clan.as_ref().map(|c| c.name.as_str()), Some("Alpha"));
        assert_eq!(t.importance_tier(), Some(Importance::Strategic));
        assert_eq!(t.description.ambiance.as_deref(), Some("Fog and lanterns"));
        assert_eq!(t.description.wealth_stars(), Some(5));
        assert!(!t.has_polygon, "has_polygon is derived, not trusted from the API");
        assert!(t.is_dominated_by("alpha"));
    }

    #[test]
    fn null_columns_decode_to_defaults() {
        let p: Place = serde_json::from_value(json!({
            "id": "p1",
            "name": "Crypt",
            "latitude": null,
            "longitude": 2.35,
            "protection": null,
            "known": null,
            "clan_overrides": null,
            "description": null
        }))
        .unwrap();

        assert_eq!(p.position(), None);
        assert_eq!(p.protection_level(), 0);
        assert!(!p.is_known());
        assert_eq!(p.description, PlaceDescription::default());
    }

    #[test]
    fn malformed_description_text_is_ignored() {
        let p: Place = serde_json::from_value(json!({
            "id": "p1",
            "name": "Crypt",
            "description": "not json at all"
        }))
        .unwrap();
        assert_eq!(p.description, PlaceDescription::default());
    }

    #[test]
    fn sanctuary_status_is_case_insensitive() {
        let mut p: Place = serde_json::from_value(json!({ "id": "p1", "name": "Opera" })).unwrap();
        assert!(!p.is_sanctuary());
        p.status = Some("Sanctuary".into());
        assert!(p.is_sanctuary());
        p.status = Some("Former SANCTUARY ruins".into());
        assert!(p.is_sanctuary());
        p.status = Some("Haven".into());
        assert!(!p.is_sanctuary());
    }

    #[test]
    fn position_requires_both_finite_coordinates() {
        let p: Place = serde_json::from_value(json!({
            "id": "p1", "name": "Opera", "latitude": 48.85, "longitude": 2.35
        }))
        .unwrap();
        assert_eq!(p.position(), Some(LatLng { lat: 48.85, lng: 2.35 }));

        let mut q = p.clone();
        q.latitude = Some(f64::NAN);
        assert_eq!(q.position(), None);
    }

    #[test]
    fn protection_is_capped() {
        let p: Place = serde_json::from_value(json!({
            "id": "p1", "name": "Vault", "protection": 9
        }))
        .unwrap();
        assert_eq!(p.protection_level(), MAX_PROTECTION);
    }

    #[test]
    fn importance_orders_most_important_first() {
        assert!(Importance::Critical < Importance::Natural);
        assert_eq!(Importance::parse(" minor "), Some(Importance::Minor));
        assert_eq!(Importance::parse("legendary"), None);
    }

    #[test]
    fn secret_text_keeps_strings_verbatim() {
        assert_eq!(secret_text(&json!("hidden door")), "hidden door");
        assert_eq!(secret_text(&json!(3)), "3");
    }
}
