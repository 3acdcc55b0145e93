use nocturne_shared::{Clan, NEUTRAL_GRAY, Territory, resolve_color};

use crate::engine::PathStyle;

const FILL_NORMAL: f64 = 0.35;
const FILL_HOVERED: f64 = 0.6;
const FILL_PULSE: f64 = 0.75;
const WEIGHT_NORMAL: f64 = 3.0;
const WEIGHT_HOVERED: f64 = 4.0;
const WEIGHT_PULSE: f64 = 5.0;

/// Pre-built path styles for one territory color.
#[derive(Debug, Clone, PartialEq)]
pub struct TerritoryStyles {
    pub color: String,
    pub normal: PathStyle,
    pub hovered: PathStyle,
    /// Brief emphasis after a navigation flight lands.
    pub pulse: PathStyle,
}

impl TerritoryStyles {
    pub fn for_color(color: &str) -> Self {
        let style = |fill_opacity, weight| PathStyle {
            fill_color: color.to_string(),
            fill_opacity,
            color: color.to_string(),
            weight,
            opacity: 1.0,
        };
        Self {
            color: color.to_string(),
            normal: style(FILL_NORMAL, WEIGHT_NORMAL),
            hovered: style(FILL_HOVERED, WEIGHT_HOVERED),
            pulse: style(FILL_PULSE, WEIGHT_PULSE),
        }
    }

    /// Styled by the dominant clan's color, neutral gray when it has none.
    pub fn for_clan(clan: Option<&Clan>) -> Self {
        Self::for_color(resolve_color(
            clan.and_then(|c| c.color.as_deref()),
            NEUTRAL_GRAY,
        ))
    }
}

/// Thin gray outlines for the contour document.
pub fn contour_style() -> PathStyle {
    PathStyle {
        fill_color: "transparent".to_string(),
        fill_opacity: 0.0,
        color: "#666".to_string(),
        weight: 1.0,
        opacity: 0.5,
    }
}

/// Dominant clan of a territory: the embedded join when present, else a lookup.
pub fn dominant_clan<'a>(territory: &'a Territory, clans: &'a [Clan]) -> Option<&'a Clan> {
    let id = territory.dominant_clan_id.as_deref()?;
    clans
        .iter()
        .find(|c| c.id == id)
        .or_else(|| territory.clan.as_ref().filter(|c| c.id == id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clan(id: &str, color: Option<&str>) -> Clan {
        Clan {
            id: id.into(),
            name: id.into(),
            color: color.map(Into::into),
        }
    }

    #[test]
    fn styles_follow_clan_color() {
        let styles = TerritoryStyles::for_clan(Some(&clan("alpha", Some("#ff0000"))));
        assert_eq!(styles.normal.fill_color, "#ff0000");
        assert_eq!(styles.normal.color, "#ff0000");
        assert_eq!(styles.normal.fill_opacity, 0.35);
        assert_eq!(styles.normal.weight, 3.0);
        assert_eq!(styles.hovered.fill_opacity, 0.6);
        assert_eq!(styles.hovered.weight, 4.0);
        assert_eq!(styles.pulse.fill_opacity, 0.75);
        assert_eq!(styles.pulse.weight, 5.0);
    }

    #[test]
    fn missing_clan_or_color_is_neutral_gray() {
        assert_eq!(TerritoryStyles::for_clan(None).color, NEUTRAL_GRAY);
        assert_eq!(
            TerritoryStyles::for_clan(Some(&clan("beta", None))).color,
            NEUTRAL_GRAY
        );
    }

    #[test]
    fn dominant_clan_prefers_loaded_clans_then_embedded_join() {
        let mut territory: Territory = serde_json::from_value(serde_json::json!({
            "id": "t1",
            "name": "T1",
            "dominant_clan_id": "alpha",
            "clan": { "id": "alpha", "name": "Embedded", "color": "#111111" }
        }))
        .unwrap();
        let clans = vec![clan("alpha", Some("#ff0000"))];

        assert_eq!(
            dominant_clan(&territory, &clans).map(|c| c.color.as_deref()),
            Some(Some("#ff0000"))
        );
        assert_eq!(dominant_clan(&territory, &[]).map(|c| c.name.as_str()), Some("Embedded"));

        territory.dominant_clan_id = None;
        assert!(dominant_clan(&territory, &clans).is_none());
    }
}
