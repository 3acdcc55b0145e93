//! The seam between map state and the imperative rendering engine.
//!
//! Exactly one engine instance exists per mounted map. It is owned by the
//! viewport controller; everything else reaches it through `MapCore`.

use std::rc::Rc;

use nocturne_shared::{Feature, FeatureCollection, LatLng, LatLngBounds};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

/// Named render panes, stacked so markers stay clickable above fills and
/// contour outlines stay visible over fill colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pane {
    Territories,
    Contours,
    Places,
}

impl Pane {
    pub const ALL: [Pane; 3] = [Pane::Contours, Pane::Territories, Pane::Places];

    pub const fn name(self) -> &'static str {
        match self {
            Pane::Territories => "territoriesPane",
            Pane::Contours => "contoursPane",
            Pane::Places => "placesPane",
        }
    }

    pub const fn z_index(self) -> u32 {
        match self {
            Pane::Territories => 400,
            Pane::Contours => 450,
            Pane::Places => 600,
        }
    }
}

/// Vector path style, serialized in the engine's option casing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStyle {
    pub fill_color: String,
    pub fill_opacity: f64,
    pub color: String,
    pub weight: f64,
    pub opacity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub center: LatLng,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileLayerSpec {
    pub url: &'static str,
    pub subdomains: &'static str,
    pub max_zoom: f64,
    pub attribution: &'static str,
}

/// Non-interactive outlines for a whole document.
pub struct OutlineLayer<'a> {
    pub pane: Pane,
    pub geometry: &'a FeatureCollection,
    pub style: PathStyle,
}

/// One territory's polygons. Hover swaps to `hover_style` and back; click
/// raises `MapEvent::TerritoryClicked` and opens `popup_html`.
pub struct PolygonLayer<'a> {
    pub territory_id: &'a str,
    pub features: Vec<&'a Feature>,
    pub style: PathStyle,
    pub hover_style: PathStyle,
    pub popup_html: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerIcon {
    pub html: String,
    pub size: (u32, u32),
    pub anchor: (i32, i32),
    pub popup_anchor: (i32, i32),
}

pub struct MarkerLayer<'a> {
    pub place_id: &'a str,
    pub position: LatLng,
    pub icon: MarkerIcon,
    pub tooltip: &'a str,
    pub popup_html: String,
}

/// User interactions the engine reports back into view state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapEvent {
    TerritoryClicked(String),
}

pub type EventSink = Rc<dyn Fn(MapEvent)>;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("map library global `{0}` is not loaded")]
    MissingGlobal(&'static str),
    #[error("map engine call `{call}` failed: {message}")]
    Js { call: &'static str, message: String },
    #[error("map engine is unavailable on this platform")]
    Unsupported,
}

pub trait MapEngine {
    fn create_pane(&mut self, pane: Pane) -> Result<(), EngineError>;
    fn add_tile_layer(&mut self, spec: &TileLayerSpec) -> Result<(), EngineError>;
    fn add_outline_layer(&mut self, layer: OutlineLayer<'_>) -> Result<LayerId, EngineError>;
    fn add_polygon_layer(&mut self, layer: PolygonLayer<'_>) -> Result<LayerId, EngineError>;
    fn set_layer_style(&mut self, id: LayerId, style: &PathStyle);
    fn remove_layer(&mut self, id: LayerId);
    fn add_marker(&mut self, marker: MarkerLayer<'_>) -> Result<MarkerId, EngineError>;
    fn remove_marker(&mut self, id: MarkerId);
    fn open_popup(&mut self, id: MarkerId);
    fn close_popups(&mut self);
    fn fly_to(&mut self, center: LatLng, zoom: f64, duration_secs: f64);
    fn fly_to_bounds(&mut self, bounds: LatLngBounds, padding_px: f64, duration_secs: f64);
    /// Destroy the engine instance. No other call is valid afterwards.
    fn release(&mut self);
}
