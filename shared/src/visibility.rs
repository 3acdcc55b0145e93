use serde::{Deserialize, Serialize};

use crate::model::Place;

/// Who is looking at the map. Applied upstream of layer reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "clan", rename_all = "snake_case")]
pub enum Viewer {
    /// Sees every place.
    #[default]
    GameMaster,
    /// Sees known places, plus places overridden for their clan.
    Player(Option<String>),
}

/// Place ids hidden from players regardless of any other flag.
pub const RESTRICTED_PLACES: &[&str] = &[];

impl Viewer {
    pub fn can_see(&self, place: &Place) -> bool {
        let Self::Player(clan) = self else {
            return true;
        };
        if RESTRICTED_PLACES.contains(&place.id.as_str()) {
            return false;
        }
        let overridden = clan.as_deref().is_some_and(|clan| {
            place
                .clan_overrides
                .as_deref()
                .is_some_and(|list| list.iter().any(|c| c == clan))
        });
        overridden || place.is_known()
    }

    pub fn filter_places(&self, places: &[Place]) -> Vec<Place> {
        places.iter().filter(|p| self.can_see(p)).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn place(id: &str, known: bool, overrides: &[&str]) -> Place {
        serde_json::from_value(json!({
            "id": id,
            "name": id,
            "known": known,
            "clan_overrides": overrides,
        }))
        .unwrap()
    }

    #[test]
    fn game_master_sees_everything() {
        let places = vec![place("a", false, &[]), place("b", true, &[])];
        assert_eq!(Viewer::GameMaster.filter_places(&places).len(), 2);
    }

    #[test]
    fn players_see_known_places_only() {
        let places = vec![place("a", false, &[]), place("b", true, &[])];
        let seen = Viewer::Player(None).filter_places(&places);
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].id, "b");
    }

    #[test]
    fn clan_overrides_reveal_unknown_places() {
        let hidden = place("lair", false, &["beta"]);
        assert!(Viewer::Player(Some("beta".into())).can_see(&hidden));
        assert!(!Viewer::Player(Some("alpha".into())).can_see(&hidden));
        assert!(!Viewer::Player(None).can_see(&hidden));
    }

    #[test]
    fn viewer_decodes_role_and_clan() {
        let v: Viewer =
            serde_json::from_value(json!({ "role": "player", "clan": "beta" })).unwrap();
        assert_eq!(v, Viewer::Player(Some("beta".into())));
    }
}
