//! Territory polygons, place markers and contour outlines derived from the
//! loaded data, kept in id-keyed indexes and replaced wholesale on change.

use std::collections::{BTreeMap, HashMap};

use nocturne_shared::{
    Clan, Feature, FeatureCollection, LatLng, PLACE_GOLD, Place, Territory, resolve_color,
};

use crate::engine::{
    EngineError, LayerId, MapEngine, MarkerId, MarkerLayer, OutlineLayer, Pane, PolygonLayer,
};
use crate::icons::MarkerGlyph;
use crate::popup::{place_popup_html, territory_popup_html};
use crate::territory::{TerritoryStyles, contour_style, dominant_clan};

/// One territory to draw: every merged feature keyed to it, in document order.
#[derive(Debug)]
pub struct TerritoryShape<'a> {
    pub territory: &'a Territory,
    pub clan: Option<&'a Clan>,
    pub features: Vec<&'a Feature>,
    pub styles: TerritoryStyles,
}

/// One place to pin.
#[derive(Debug)]
pub struct PlacePin<'a> {
    pub place: &'a Place,
    pub clan: Option<&'a Clan>,
    pub position: LatLng,
    pub glyph: MarkerGlyph,
    pub color: &'a str,
}

fn passes_filter(clan_id: Option<&str>, filter: Option<&str>) -> bool {
    filter.is_none_or(|wanted| clan_id == Some(wanted))
}

/// Resolve each merged feature to its territory, apply the clan filter, and
/// group features sharing a territory id. Unknown ids are skipped.
pub fn derive_territory_shapes<'a>(
    territories: &'a [Territory],
    merged: &'a FeatureCollection,
    clans: &'a [Clan],
    clan_filter: Option<&str>,
) -> Vec<TerritoryShape<'a>> {
    let by_id: HashMap<&str, &Territory> =
        territories.iter().map(|t| (t.id.as_str(), t)).collect();

    let mut shapes: Vec<TerritoryShape<'a>> = Vec::new();
    let mut slot_of: HashMap<&str, usize> = HashMap::new();

    for feature in &merged.features {
        let Some(territory) = feature.territory_id().and_then(|id| by_id.get(id).copied()) else {
            continue;
        };
        if !passes_filter(territory.dominant_clan_id.as_deref(), clan_filter) {
            continue;
        }
        if let Some(&slot) = slot_of.get(territory.id.as_str()) {
            shapes[slot].features.push(feature);
            continue;
        }
        let clan = dominant_clan(territory, clans);
        slot_of.insert(territory.id.as_str(), shapes.len());
        shapes.push(TerritoryShape {
            territory,
            clan,
            features: vec![feature],
            styles: TerritoryStyles::for_clan(clan),
        });
    }
    shapes
}

/// Places with coordinates that pass the clan filter. Later duplicates of an
/// id replace earlier ones so each id yields at most one pin.
pub fn derive_place_pins<'a>(
    places: &'a [Place],
    clans: &'a [Clan],
    clan_filter: Option<&str>,
) -> Vec<PlacePin<'a>> {
    let clan_by_id: HashMap<&str, &Clan> = clans.iter().map(|c| (c.id.as_str(), c)).collect();
    let mut pins: Vec<PlacePin<'a>> = Vec::new();
    let mut slot_of: HashMap<&str, usize> = HashMap::new();

    for place in places {
        if !passes_filter(place.clan_id.as_deref(), clan_filter) {
            continue;
        }
        let Some(position) = place.position() else {
            continue;
        };
        let clan = place
            .clan_id
            .as_deref()
            .and_then(|id| clan_by_id.get(id).copied());
        let pin = PlacePin {
            place,
            clan,
            position,
            glyph: MarkerGlyph::for_place(place),
            color: resolve_color(clan.and_then(|c| c.color.as_deref()), PLACE_GOLD),
        };
        match slot_of.get(place.id.as_str()) {
            Some(&slot) => pins[slot] = pin,
            None => {
                slot_of.insert(place.id.as_str(), pins.len());
                pins.push(pin);
            }
        }
    }
    pins
}

/// Owns every layer and marker the map has added, keyed by entity id.
#[derive(Debug, Default)]
pub struct LayerManager {
    contours: Option<LayerId>,
    territories: BTreeMap<String, LayerId>,
    markers: HashMap<String, MarkerId>,
}

impl LayerManager {
    pub fn territory_layer(&self, territory_id: &str) -> Option<LayerId> {
        self.territories.get(territory_id).copied()
    }

    pub fn marker(&self, place_id: &str) -> Option<MarkerId> {
        self.markers.get(place_id).copied()
    }

    pub fn territory_count(&self) -> usize {
        self.territories.len()
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn has_contours(&self) -> bool {
        self.contours.is_some()
    }

    pub fn reconcile_contours<E: MapEngine>(
        &mut self,
        engine: &mut E,
        contours: &FeatureCollection,
    ) -> Result<(), EngineError> {
        if let Some(old) = self.contours.take() {
            engine.remove_layer(old);
        }
        let id = engine.add_outline_layer(OutlineLayer {
            pane: Pane::Contours,
            geometry: contours,
            style: contour_style(),
        })?;
        self.contours = Some(id);
        Ok(())
    }

    /// Remove every territory layer from the previous pass, then add one layer
    /// per derived shape. Returns the number of layers now live.
    pub fn reconcile<E: MapEngine>(
        &mut self,
        engine: &mut E,
        territories: &[Territory],
        merged: &FeatureCollection,
        clans: &[Clan],
        clan_filter: Option<&str>,
    ) -> Result<usize, EngineError> {
        for (_, old) in std::mem::take(&mut self.territories) {
            engine.remove_layer(old);
        }

        for shape in derive_territory_shapes(territories, merged, clans, clan_filter) {
            let popup_html = territory_popup_html(shape.territory, shape.clan, &shape.styles.color);
            let id = engine.add_polygon_layer(PolygonLayer {
                territory_id: &shape.territory.id,
                features: shape.features,
                style: shape.styles.normal,
                hover_style: shape.styles.hovered,
                popup_html,
            })?;
            self.territories.insert(shape.territory.id.clone(), id);
        }
        Ok(self.territories.len())
    }

    /// Same discipline as `reconcile`, for place markers.
    pub fn reconcile_markers<E: MapEngine>(
        &mut self,
        engine: &mut E,
        places: &[Place],
        clans: &[Clan],
        clan_filter: Option<&str>,
    ) -> Result<usize, EngineError> {
        for (_, old) in std::mem::take(&mut self.markers) {
            engine.remove_marker(old);
        }

        for pin in derive_place_pins(places, clans, clan_filter) {
            let id = engine.add_marker(MarkerLayer {
                place_id: &pin.place.id,
                position: pin.position,
                icon: pin.glyph.icon(pin.color),
                tooltip: &pin.place.name,
                popup_html: place_popup_html(pin.place, pin.clan, pin.color),
            })?;
            self.markers.insert(pin.place.id.clone(), id);
        }
        Ok(self.markers.len())
    }

    /// Remove everything this manager added.
    pub fn clear<E: MapEngine>(&mut self, engine: &mut E) {
        if let Some(old) = self.contours.take() {
            engine.remove_layer(old);
        }
        for (_, old) in std::mem::take(&mut self.territories) {
            engine.remove_layer(old);
        }
        for (_, old) in std::mem::take(&mut self.markers) {
            engine.remove_marker(old);
        }
    }

    /// Forget every id without touching an engine, for when the engine itself
    /// is already gone.
    pub fn forget(&mut self) {
        self.contours = None;
        self.territories.clear();
        self.markers.clear();
    }
}
