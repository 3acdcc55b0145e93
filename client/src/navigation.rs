//! Consumes one-shot focus requests raised by other screens.
//!
//! Each `take_*` function leaves the slot untouched while the map cannot act
//! on the request yet, and otherwise acknowledges it exactly once, whether or
//! not the requested entity exists.

use nocturne_shared::{
    Clan, FeatureCollection, NavigationSlot, NavigationTarget, Place, Territory, Ticket,
};

use crate::config::{
    CLOSE_POPUPS_MS, PLACE_FLIGHT_SECS, PLACE_FLIGHT_ZOOM, POPUP_SETTLE_MS, PULSE_REVERT_MS,
    TERRITORY_FLIGHT_PADDING_PX, TERRITORY_FLIGHT_SECS,
};
use crate::engine::MapEngine;
use crate::log;
use crate::map_core::MapCore;
use crate::territory::{TerritoryStyles, dominant_clan};
use crate::timers::FollowUp;

/// A follow-up to run after `delay_ms`.
#[derive(Debug, Clone, PartialEq)]
pub struct Scheduled {
    pub delay_ms: u32,
    pub follow_up: FollowUp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaceOutcome {
    pub ticket: Ticket,
    /// The place to show in the detail drawer, when it was found.
    pub selected: Option<Place>,
    pub scheduled: Option<Scheduled>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TerritoryOutcome {
    pub selected: Option<String>,
    pub scheduled: Option<Scheduled>,
    /// Secondary place to focus once the territory flight starts.
    pub forward_place: Option<String>,
    /// Territory whose detail screen the host should open.
    pub open_detail: Option<String>,
}

/// Fly to a place and open its popup once the flight settles.
fn focus_place<E: MapEngine>(core: &mut MapCore<E>, place: &Place) -> Option<Scheduled> {
    let position = place.position()?;
    if !core.fly_to(position, PLACE_FLIGHT_ZOOM, PLACE_FLIGHT_SECS) {
        return None;
    }
    Some(Scheduled {
        delay_ms: POPUP_SETTLE_MS,
        follow_up: FollowUp::OpenPlacePopup {
            place_id: place.id.clone(),
        },
    })
}

/// Fly to a place picked inside the detail drawer and dismiss any open popup
/// so it does not cover the drawer.
pub fn jump_to_place<E: MapEngine>(core: &mut MapCore<E>, place: &Place) -> Option<Scheduled> {
    let position = place.position()?;
    if !core.fly_to(position, PLACE_FLIGHT_ZOOM, PLACE_FLIGHT_SECS) {
        return None;
    }
    Some(Scheduled {
        delay_ms: CLOSE_POPUPS_MS,
        follow_up: FollowUp::ClosePopups,
    })
}

/// Handle a pending place request once the engine exists and `places` has loaded.
pub fn take_place_target<E: MapEngine>(
    core: &mut MapCore<E>,
    slot: &mut NavigationSlot,
    places: Option<&[Place]>,
) -> Option<PlaceOutcome> {
    let (ticket, target) = slot.pending()?;
    if !core.is_ready() {
        return None;
    }
    let places = places?;

    let mut outcome = PlaceOutcome {
        ticket,
        selected: None,
        scheduled: None,
    };
    match target {
        NavigationTarget::Place { id } => match places.iter().find(|p| p.id == *id) {
            Some(place) => {
                outcome.scheduled = focus_place(core, place);
                outcome.selected = Some(place.clone());
            }
            None => log::info(&format!("navigation: place {id} is not loaded, ignoring")),
        },
        other => log::warn(&format!("navigation: {other:?} raised on the place slot")),
    }
    slot.acknowledge(ticket);
    Some(outcome)
}

/// Handle a pending territory or territory-detail request.
///
/// Territory flights wait for the engine and the merged geometry; detail
/// requests need neither and are handed straight back to the host.
pub fn take_territory_target<E: MapEngine>(
    core: &mut MapCore<E>,
    slot: &mut NavigationSlot,
    merged: Option<&FeatureCollection>,
    territories: &[Territory],
    clans: &[Clan],
) -> Option<TerritoryOutcome> {
    let (ticket, target) = slot.pending()?;
    let mut outcome = TerritoryOutcome::default();

    match target {
        NavigationTarget::TerritoryDetail { id } => {
            outcome.open_detail = Some(id.clone());
        }
        NavigationTarget::Territory { id, place_id } => {
            if !core.is_ready() {
                return None;
            }
            let merged = merged?;
            outcome.forward_place = place_id.clone();

            match merged.bounds_for(id) {
                Some(bounds) => {
                    // Degenerate geometry still gets the pulse and selection.
                    if bounds.is_valid() {
                        core.fly_to_bounds(
                            bounds,
                            TERRITORY_FLIGHT_PADDING_PX,
                            TERRITORY_FLIGHT_SECS,
                        );
                    }
                    outcome.scheduled = pulse(core, id, territories, clans);
                    outcome.selected = Some(id.clone());
                }
                None => log::info(&format!("navigation: territory {id} has no boundary, ignoring")),
            }
        }
        other => log::warn(&format!("navigation: {other:?} raised on the territory slot")),
    }
    slot.acknowledge(ticket);
    Some(outcome)
}

fn pulse<E: MapEngine>(
    core: &mut MapCore<E>,
    territory_id: &str,
    territories: &[Territory],
    clans: &[Clan],
) -> Option<Scheduled> {
    let clan = territories
        .iter()
        .find(|t| t.id == territory_id)
        .and_then(|t| dominant_clan(t, clans));
    let styles = TerritoryStyles::for_clan(clan);
    if !core.restyle_territory(territory_id, &styles.pulse) {
        return None;
    }
    Some(Scheduled {
        delay_ms: PULSE_REVERT_MS,
        follow_up: FollowUp::RevertTerritoryPulse {
            territory_id: territory_id.to_string(),
            style: styles.normal,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MapView;
    use crate::engine::fake::{Flight, RecordingEngine};
    use nocturne_shared::LatLng;
    use serde_json::json;

    fn ready_core() -> MapCore<RecordingEngine> {
        let mut core = MapCore::default();
        core.viewport
            .acquire(Some(()), |_: (), _: &MapView| Ok(RecordingEngine::default()))
            .unwrap();
        core
    }

    fn flights(core: &mut MapCore<RecordingEngine>) -> Vec<Flight> {
        core.viewport.engine_mut().unwrap().flights.clone()
    }

    fn places() -> Vec<Place> {
        serde_json::from_value(json!([
            { "id": "p1", "name": "Opera", "latitude": 48.85, "longitude": 2.35 },
            { "id": "p2", "name": "Catacombs" }
        ]))
        .unwrap()
    }

    fn clans() -> Vec<Clan> {
        vec![Clan {
            id: "alpha".into(),
            name: "Alpha".into(),
            color: Some("#ff0000".into()),
        }]
    }

    fn territories() -> Vec<Territory> {
        serde_json::from_value(json!([
            { "id": "t1", "name": "T1", "dominant_clan_id": "alpha" }
        ]))
        .unwrap()
    }

    fn merged() -> FeatureCollection {
        serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "territory_id": "t1" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[2.30, 48.80], [2.40, 48.80], [2.40, 48.90], [2.30, 48.80]]]
                }
            }]
        }))
        .unwrap()
    }

    #[test]
    fn place_target_flies_and_schedules_popup() {
        let mut core = ready_core();
        let places = places();
        let mut slot = NavigationSlot::default();
        slot.raise(NavigationTarget::Place { id: "p1".into() });

        let outcome = take_place_target(&mut core, &mut slot, Some(places.as_slice())).unwrap();

        assert_eq!(outcome.selected.map(|p| p.id), Some("p1".to_string()));
        assert_eq!(
            outcome.scheduled,
            Some(Scheduled {
                delay_ms: 900,
                follow_up: FollowUp::OpenPlacePopup { place_id: "p1".into() },
            })
        );
        assert_eq!(
            flights(&mut core),
            vec![Flight::To {
                center: LatLng { lat: 48.85, lng: 2.35 },
                zoom: 15.0,
                duration_secs: 0.8,
            }]
        );
        assert!(!slot.is_pending());
    }

    #[test]
    fn drawer_jump_flies_then_closes_popups() {
        let mut core = ready_core();
        let places = places();

        assert_eq!(
            jump_to_place(&mut core, &places[0]),
            Some(Scheduled {
                delay_ms: 100,
                follow_up: FollowUp::ClosePopups,
            })
        );
        assert_eq!(
            flights(&mut core),
            vec![Flight::To {
                center: LatLng { lat: 48.85, lng: 2.35 },
                zoom: 15.0,
                duration_secs: 0.8,
            }]
        );

        assert_eq!(jump_to_place(&mut core, &places[1]), None);
        assert_eq!(flights(&mut core).len(), 1);
    }

    #[test]
    fn place_target_is_consumed_exactly_once() {
        let mut core = ready_core();
        let places = places();
        let mut slot = NavigationSlot::default();
        slot.raise(NavigationTarget::Place { id: "p1".into() });

        let mut consumed = 0;
        for _ in 0..3 {
            if take_place_target(&mut core, &mut slot, Some(places.as_slice())).is_some() {
                consumed += 1;
            }
        }

        assert_eq!(consumed, 1);
        assert_eq!(flights(&mut core).len(), 1);
    }

    #[test]
    fn unknown_place_is_consumed_without_flight() {
        let mut core = ready_core();
        let places = places();
        let mut slot = NavigationSlot::default();
        slot.raise(NavigationTarget::Place { id: "p_unknown".into() });

        let outcome = take_place_target(&mut core, &mut slot, Some(places.as_slice())).unwrap();

        assert_eq!(outcome.selected, None);
        assert_eq!(outcome.scheduled, None);
        assert!(flights(&mut core).is_empty());
        assert!(!slot.is_pending());
    }

    #[test]
    fn place_without_coordinates_is_selected_but_not_flown_to() {
        let mut core = ready_core();
        let places = places();
        let mut slot = NavigationSlot::default();
        slot.raise(NavigationTarget::Place { id: "p2".into() });

        let outcome = take_place_target(&mut core, &mut slot, Some(places.as_slice())).unwrap();

        assert_eq!(outcome.selected.map(|p| p.name), Some("Catacombs".to_string()));
        assert_eq!(outcome.scheduled, None);
        assert!(flights(&mut core).is_empty());
    }

    #[test]
    fn early_target_waits_for_engine_and_places() {
        let mut core = MapCore::<RecordingEngine>::default();
        let places = places();
        let mut slot = NavigationSlot::default();
        slot.raise(NavigationTarget::Place { id: "p1".into() });

        assert!(take_place_target(&mut core, &mut slot, Some(places.as_slice())).is_none());
        assert!(slot.is_pending());

        let mut core = ready_core();
        assert!(take_place_target(&mut core, &mut slot, None).is_none());
        assert!(slot.is_pending());

        assert!(take_place_target(&mut core, &mut slot, Some(places.as_slice())).is_some());
        assert!(!slot.is_pending());
    }

    #[test]
    fn territory_target_fits_bounds_and_pulses() {
        let mut core = ready_core();
        let (territories, clans, merged) = (territories(), clans(), merged());
        core.sync_territories(&territories, &merged, &clans, None).unwrap();
        let mut slot = NavigationSlot::default();
        slot.raise(NavigationTarget::Territory {
            id: "t1".into(),
            place_id: Some("p1".into()),
        });

        let outcome =
            take_territory_target(&mut core, &mut slot, Some(&merged), &territories, &clans)
                .unwrap();

        assert_eq!(outcome.selected.as_deref(), Some("t1"));
        assert_eq!(outcome.forward_place.as_deref(), Some("p1"));
        let styles = TerritoryStyles::for_color("#ff0000");
        assert_eq!(
            outcome.scheduled,
            Some(Scheduled {
                delay_ms: 1800,
                follow_up: FollowUp::RevertTerritoryPulse {
                    territory_id: "t1".into(),
                    style: styles.normal,
                },
            })
        );

        let engine = core.viewport.engine_mut().unwrap();
        let (_, layer) = engine.layer_for("t1").unwrap();
        assert_eq!(layer.style, styles.pulse);
        match &engine.flights[..] {
            [Flight::ToBounds { bounds, padding_px, duration_secs }] => {
                assert_eq!(*padding_px, 60.0);
                assert_eq!(*duration_secs, 0.9);
                assert_eq!(bounds.corners(), [[48.80, 2.30], [48.90, 2.40]]);
            }
            other => panic!("unexpected flights: {other:?}"),
        }
        assert!(!slot.is_pending());
    }

    #[test]
    fn territory_without_usable_bounds_still_pulses_and_selects() {
        let mut core = ready_core();
        let (territories, clans) = (territories(), clans());
        let merged: FeatureCollection = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "territory_id": "t1" },
                "geometry": null
            }]
        }))
        .unwrap();
        core.sync_territories(&territories, &merged, &clans, None).unwrap();
        let mut slot = NavigationSlot::default();
        slot.raise(NavigationTarget::Territory {
            id: "t1".into(),
            place_id: None,
        });

        let outcome =
            take_territory_target(&mut core, &mut slot, Some(&merged), &territories, &clans)
                .unwrap();

        assert_eq!(outcome.selected.as_deref(), Some("t1"));
        assert!(outcome.scheduled.is_some());
        assert!(flights(&mut core).is_empty());
        let engine = core.viewport.engine_mut().unwrap();
        let (_, layer) = engine.layer_for("t1").unwrap();
        assert_eq!(layer.style, TerritoryStyles::for_color("#ff0000").pulse);
        assert!(!slot.is_pending());
    }

    #[test]
    fn unknown_territory_is_consumed_as_no_op() {
        let mut core = ready_core();
        let (territories, clans, merged) = (territories(), clans(), merged());
        let mut slot = NavigationSlot::default();
        slot.raise(NavigationTarget::Territory {
            id: "nowhere".into(),
            place_id: None,
        });

        let outcome =
            take_territory_target(&mut core, &mut slot, Some(&merged), &territories, &clans)
                .unwrap();

        assert_eq!(outcome, TerritoryOutcome::default());
        assert!(flights(&mut core).is_empty());
        assert!(!slot.is_pending());
    }

    #[test]
    fn territory_target_waits_for_merged_geometry() {
        let mut core = ready_core();
        let mut slot = NavigationSlot::default();
        slot.raise(NavigationTarget::Territory {
            id: "t1".into(),
            place_id: None,
        });

        assert!(take_territory_target(&mut core, &mut slot, None, &[], &[]).is_none());
        assert!(slot.is_pending());
    }

    #[test]
    fn detail_request_is_forwarded_once_without_engine() {
        let mut core = MapCore::<RecordingEngine>::default();
        let mut slot = NavigationSlot::default();
        slot.raise(NavigationTarget::TerritoryDetail { id: "t1".into() });

        let first = take_territory_target(&mut core, &mut slot, None, &[], &[]).unwrap();
        assert_eq!(first.open_detail.as_deref(), Some("t1"));
        assert!(take_territory_target(&mut core, &mut slot, None, &[], &[]).is_none());
    }
}
