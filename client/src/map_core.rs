//! Single owner of the engine-facing state for one mounted map.

use nocturne_shared::{Clan, FeatureCollection, LatLng, LatLngBounds, Place, Territory};

use crate::engine::{EngineError, MapEngine, PathStyle};
use crate::layers::LayerManager;
use crate::timers::FollowUp;
use crate::viewport::ViewportController;

pub struct MapCore<E> {
    pub viewport: ViewportController<E>,
    pub layers: LayerManager,
}

impl<E> Default for MapCore<E> {
    fn default() -> Self {
        Self {
            viewport: ViewportController::default(),
            layers: LayerManager::default(),
        }
    }
}

impl<E: MapEngine> MapCore<E> {
    pub fn is_ready(&self) -> bool {
        self.viewport.is_ready()
    }

    /// Returns `Ok(false)` when there is no engine yet.
    pub fn sync_contours(&mut self, contours: &FeatureCollection) -> Result<bool, EngineError> {
        let Some(engine) = self.viewport.engine_mut() else {
            return Ok(false);
        };
        self.layers.reconcile_contours(engine, contours)?;
        Ok(true)
    }

    /// Polygon count after reconciliation, `None` when there is no engine yet.
    pub fn sync_territories(
        &mut self,
        territories: &[Territory],
        merged: &FeatureCollection,
        clans: &[Clan],
        clan_filter: Option<&str>,
    ) -> Result<Option<usize>, EngineError> {
        let Some(engine) = self.viewport.engine_mut() else {
            return Ok(None);
        };
        self.layers
            .reconcile(engine, territories, merged, clans, clan_filter)
            .map(Some)
    }

    pub fn sync_places(
        &mut self,
        places: &[Place],
        clans: &[Clan],
        clan_filter: Option<&str>,
    ) -> Result<Option<usize>, EngineError> {
        let Some(engine) = self.viewport.engine_mut() else {
            return Ok(None);
        };
        self.layers
            .reconcile_markers(engine, places, clans, clan_filter)
            .map(Some)
    }

    pub fn fly_to(&mut self, center: LatLng, zoom: f64, duration_secs: f64) -> bool {
        let Some(engine) = self.viewport.engine_mut() else {
            return false;
        };
        engine.fly_to(center, zoom, duration_secs);
        true
    }

    pub fn fly_to_bounds(
        &mut self,
        bounds: LatLngBounds,
        padding_px: f64,
        duration_secs: f64,
    ) -> bool {
        let Some(engine) = self.viewport.engine_mut() else {
            return false;
        };
        engine.fly_to_bounds(bounds, padding_px, duration_secs);
        true
    }

    /// Restyle the live layer for `territory_id`, if there is one.
    pub fn restyle_territory(&mut self, territory_id: &str, style: &PathStyle) -> bool {
        let Some(layer) = self.layers.territory_layer(territory_id) else {
            return false;
        };
        let Some(engine) = self.viewport.engine_mut() else {
            return false;
        };
        engine.set_layer_style(layer, style);
        true
    }

    /// Apply a delayed follow-up against whatever layers are live now.
    /// Targets that have since disappeared are ignored.
    pub fn run_follow_up(&mut self, follow_up: &FollowUp) {
        match follow_up {
            FollowUp::OpenPlacePopup { place_id } => {
                let Some(marker) = self.layers.marker(place_id) else {
                    return;
                };
                if let Some(engine) = self.viewport.engine_mut() {
                    engine.open_popup(marker);
                }
            }
            FollowUp::RevertTerritoryPulse {
                territory_id,
                style,
            } => {
                self.restyle_territory(territory_id, style);
            }
            FollowUp::ClosePopups => {
                if let Some(engine) = self.viewport.engine_mut() {
                    engine.close_popups();
                }
            }
        }
    }

    /// Remove every owned layer, then release the engine.
    pub fn teardown(&mut self) {
        match self.viewport.engine_mut() {
            Some(engine) => self.layers.clear(engine),
            None => self.layers.forget(),
        }
        self.viewport.release();
    }
}
