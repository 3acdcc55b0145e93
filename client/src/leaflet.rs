//! `MapEngine` over the page's Leaflet global.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use js_sys::{Object, Reflect};
use serde::Serialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use nocturne_shared::{Feature, LatLng, LatLngBounds};

use crate::engine::{
    EngineError, EventSink, LayerId, MapEngine, MapEvent, MapView, MarkerId, MarkerLayer,
    OutlineLayer, Pane, PathStyle, PolygonLayer, TileLayerSpec,
};

#[wasm_bindgen]
extern "C" {
    #[derive(Debug, Clone)]
    type LeafletMap;

    #[wasm_bindgen(catch, js_namespace = L, js_name = map)]
    fn new_map(container: &web_sys::HtmlElement, options: &JsValue) -> Result<LeafletMap, JsValue>;

    #[wasm_bindgen(method, js_name = createPane)]
    fn create_pane(this: &LeafletMap, name: &str) -> web_sys::HtmlElement;

    #[wasm_bindgen(method, js_name = flyTo)]
    fn fly_to(this: &LeafletMap, center: &JsValue, zoom: f64, options: &JsValue);

    #[wasm_bindgen(method, js_name = flyToBounds)]
    fn fly_to_bounds(this: &LeafletMap, bounds: &JsValue, options: &JsValue);

    #[wasm_bindgen(method, js_name = closePopup)]
    fn close_popup(this: &LeafletMap);

    #[wasm_bindgen(method, js_name = remove)]
    fn destroy(this: &LeafletMap);

    #[derive(Debug, Clone)]
    type Layer;

    #[wasm_bindgen(catch, js_namespace = L, js_name = tileLayer)]
    fn tile_layer(url: &str, options: &JsValue) -> Result<Layer, JsValue>;

    #[wasm_bindgen(catch, js_namespace = L, js_name = geoJSON)]
    fn geo_json(data: &JsValue, options: &JsValue) -> Result<Layer, JsValue>;

    #[wasm_bindgen(catch, js_namespace = L, js_name = marker)]
    fn marker(position: &JsValue, options: &JsValue) -> Result<Layer, JsValue>;

    #[wasm_bindgen(js_namespace = L, js_name = divIcon)]
    fn div_icon(options: &JsValue) -> JsValue;

    #[wasm_bindgen(method, js_name = addTo)]
    fn add_to(this: &Layer, map: &LeafletMap) -> Layer;

    #[wasm_bindgen(method, js_name = remove)]
    fn detach(this: &Layer);

    #[wasm_bindgen(method, js_name = setStyle)]
    fn set_style(this: &Layer, style: &JsValue);

    #[wasm_bindgen(method, js_name = bindPopup)]
    fn bind_popup(this: &Layer, html: &str, options: &JsValue) -> Layer;

    #[wasm_bindgen(method, js_name = bindTooltip)]
    fn bind_tooltip(this: &Layer, text: &str, options: &JsValue) -> Layer;

    #[wasm_bindgen(method, js_name = openPopup)]
    fn open_popup(this: &Layer);

    #[wasm_bindgen(method)]
    fn on(this: &Layer, event: &str, handler: &js_sys::Function) -> Layer;
}

// Hover closures hold their own handle to the layer they restyle.
const _: fn() = || {
    fn layer_handles_clone<T: Clone>() {}
    layer_handles_clone::<Layer>();
};

fn to_js<T: Serialize + ?Sized>(call: &'static str, value: &T) -> Result<JsValue, EngineError> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value.serialize(&serializer).map_err(|e| EngineError::Js {
        call,
        message: e.to_string(),
    })
}

fn js_error(call: &'static str) -> impl Fn(JsValue) -> EngineError {
    move |err| EngineError::Js {
        call,
        message: err
            .as_string()
            .or_else(|| {
                err.dyn_ref::<js_sys::Error>()
                    .map(|e| String::from(e.message()))
            })
            .unwrap_or_else(|| format!("{err:?}")),
    }
}

fn lat_lng(point: LatLng) -> JsValue {
    let pair = js_sys::Array::new();
    pair.push(&point.lat.into());
    pair.push(&point.lng.into());
    pair.into()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MapOptions {
    center: [f64; 2],
    zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
    zoom_control: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TileOptions<'a> {
    subdomains: &'a str,
    max_zoom: f64,
    attribution: &'a str,
}

#[derive(Serialize)]
struct GeoJsonOptions<'a> {
    pane: &'static str,
    interactive: bool,
    style: &'a PathStyle,
}

#[derive(Serialize)]
struct FeatureSlice<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    features: &'a [&'a Feature],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IconOptions<'a> {
    html: &'a str,
    class_name: &'static str,
    icon_size: [u32; 2],
    icon_anchor: [i32; 2],
    popup_anchor: [i32; 2],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PopupOptions {
    class_name: &'static str,
    max_width: u32,
}

const POPUP_OPTIONS: PopupOptions = PopupOptions {
    class_name: "lmp-popup",
    max_width: 280,
};

#[derive(Serialize)]
struct TooltipOptions {
    direction: &'static str,
    offset: [i32; 2],
}

#[derive(Serialize)]
struct FlightOptions {
    duration: f64,
}

#[derive(Serialize)]
struct BoundsFlightOptions {
    padding: [f64; 2],
    duration: f64,
}

struct LiveLayer {
    layer: Layer,
    /// Style that hover-out returns to.
    base_style: Rc<RefCell<JsValue>>,
    _handlers: Vec<Closure<dyn Fn()>>,
}

pub struct LeafletEngine {
    map: LeafletMap,
    events: EventSink,
    next_id: u64,
    layers: HashMap<LayerId, LiveLayer>,
    markers: HashMap<MarkerId, Layer>,
    released: bool,
}

impl LeafletEngine {
    pub fn new(
        container: web_sys::HtmlElement,
        view: &MapView,
        events: EventSink,
    ) -> Result<Self, EngineError> {
        let window = web_sys::window().ok_or(EngineError::MissingGlobal("window"))?;
        let global = Reflect::get(&window, &JsValue::from_str("L")).unwrap_or(JsValue::UNDEFINED);
        if global.is_undefined() || global.is_null() {
            return Err(EngineError::MissingGlobal("L"));
        }

        let options = to_js(
            "L.map",
            &MapOptions {
                center: [view.center.lat, view.center.lng],
                zoom: view.zoom,
                min_zoom: view.min_zoom,
                max_zoom: view.max_zoom,
                zoom_control: true,
            },
        )?;
        let map = new_map(&container, &options).map_err(js_error("L.map"))?;
        Ok(Self {
            map,
            events,
            next_id: 0,
            layers: HashMap::new(),
            markers: HashMap::new(),
            released: false,
        })
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn insert_layer(
        &mut self,
        layer: Layer,
        base_style: Rc<RefCell<JsValue>>,
        handlers: Vec<Closure<dyn Fn()>>,
    ) -> LayerId {
        let id = LayerId(self.next());
        self.layers.insert(
            id,
            LiveLayer {
                layer,
                base_style,
                _handlers: handlers,
            },
        );
        id
    }
}

impl MapEngine for LeafletEngine {
    fn create_pane(&mut self, pane: Pane) -> Result<(), EngineError> {
        let element = self.map.create_pane(pane.name());
        element
            .style()
            .set_property("z-index", &pane.z_index().to_string())
            .map_err(js_error("createPane"))
    }

    fn add_tile_layer(&mut self, spec: &TileLayerSpec) -> Result<(), EngineError> {
        let options = to_js(
            "L.tileLayer",
            &TileOptions {
                subdomains: spec.subdomains,
                max_zoom: spec.max_zoom,
                attribution: spec.attribution,
            },
        )?;
        tile_layer(spec.url, &options)
            .map_err(js_error("L.tileLayer"))?
            .add_to(&self.map);
        Ok(())
    }

    fn add_outline_layer(&mut self, layer: OutlineLayer<'_>) -> Result<LayerId, EngineError> {
        let data = to_js("L.geoJSON", layer.geometry)?;
        let options = to_js(
            "L.geoJSON",
            &GeoJsonOptions {
                pane: layer.pane.name(),
                interactive: false,
                style: &layer.style,
            },
        )?;
        let base_style = Rc::new(RefCell::new(to_js("setStyle", &layer.style)?));
        let js_layer = geo_json(&data, &options).map_err(js_error("L.geoJSON"))?;
        js_layer.add_to(&self.map);
        Ok(self.insert_layer(js_layer, base_style, Vec::new()))
    }

    fn add_polygon_layer(&mut self, layer: PolygonLayer<'_>) -> Result<LayerId, EngineError> {
        let data = to_js(
            "L.geoJSON",
            &FeatureSlice {
                kind: "FeatureCollection",
                features: &layer.features,
            },
        )?;
        let options = to_js(
            "L.geoJSON",
            &GeoJsonOptions {
                pane: Pane::Territories.name(),
                interactive: true,
                style: &layer.style,
            },
        )?;
        let base_style = Rc::new(RefCell::new(to_js("setStyle", &layer.style)?));
        let hover_style = to_js("setStyle", &layer.hover_style)?;
        let popup_options = to_js("bindPopup", &POPUP_OPTIONS)?;

        let js_layer = geo_json(&data, &options).map_err(js_error("L.geoJSON"))?;
        js_layer.bind_popup(&layer.popup_html, &popup_options);

        let over = {
            let target = js_layer.clone();
            Closure::<dyn Fn()>::new(move || target.set_style(&hover_style))
        };
        let out = {
            let target = js_layer.clone();
            let base = base_style.clone();
            Closure::<dyn Fn()>::new(move || target.set_style(&base.borrow()))
        };
        let click = {
            let events = self.events.clone();
            let territory_id = layer.territory_id.to_string();
            Closure::<dyn Fn()>::new(move || {
                events(MapEvent::TerritoryClicked(territory_id.clone()))
            })
        };
        js_layer.on("mouseover", over.as_ref().unchecked_ref());
        js_layer.on("mouseout", out.as_ref().unchecked_ref());
        js_layer.on("click", click.as_ref().unchecked_ref());
        js_layer.add_to(&self.map);

        Ok(self.insert_layer(js_layer, base_style, vec![over, out, click]))
    }

    fn set_layer_style(&mut self, id: LayerId, style: &PathStyle) {
        let Some(live) = self.layers.get(&id) else {
            return;
        };
        match to_js("setStyle", style) {
            Ok(js_style) => {
                live.layer.set_style(&js_style);
                *live.base_style.borrow_mut() = js_style;
            }
            Err(err) => crate::log::warn(&err.to_string()),
        }
    }

    fn remove_layer(&mut self, id: LayerId) {
        if let Some(live) = self.layers.remove(&id) {
            live.layer.detach();
        }
    }

    fn add_marker(&mut self, marker: MarkerLayer<'_>) -> Result<MarkerId, EngineError> {
        let icon = div_icon(&to_js(
            "L.divIcon",
            &IconOptions {
                html: &marker.icon.html,
                class_name: "lmp-marker",
                icon_size: [marker.icon.size.0, marker.icon.size.1],
                icon_anchor: [marker.icon.anchor.0, marker.icon.anchor.1],
                popup_anchor: [marker.icon.popup_anchor.0, marker.icon.popup_anchor.1],
            },
        )?);
        let options = Object::new();
        Reflect::set(&options, &"icon".into(), &icon).map_err(js_error("L.marker"))?;
        Reflect::set(&options, &"pane".into(), &Pane::Places.name().into())
            .map_err(js_error("L.marker"))?;

        let js_marker = marker_from(&marker, &options)?;
        js_marker.add_to(&self.map);
        let id = MarkerId(self.next());
        self.markers.insert(id, js_marker);
        Ok(id)
    }

    fn remove_marker(&mut self, id: MarkerId) {
        if let Some(js_marker) = self.markers.remove(&id) {
            js_marker.detach();
        }
    }

    fn open_popup(&mut self, id: MarkerId) {
        if let Some(js_marker) = self.markers.get(&id) {
            js_marker.open_popup();
        }
    }

    fn close_popups(&mut self) {
        self.map.close_popup();
    }

    fn fly_to(&mut self, center: LatLng, zoom: f64, duration_secs: f64) {
        match to_js("flyTo", &FlightOptions { duration: duration_secs }) {
            Ok(options) => self.map.fly_to(&lat_lng(center), zoom, &options),
            Err(err) => crate::log::warn(&err.to_string()),
        }
    }

    fn fly_to_bounds(&mut self, bounds: LatLngBounds, padding_px: f64, duration_secs: f64) {
        let options = to_js(
            "flyToBounds",
            &BoundsFlightOptions {
                padding: [padding_px, padding_px],
                duration: duration_secs,
            },
        );
        let corners = to_js("flyToBounds", &bounds.corners());
        match (corners, options) {
            (Ok(corners), Ok(options)) => self.map.fly_to_bounds(&corners, &options),
            (Err(err), _) | (_, Err(err)) => crate::log::warn(&err.to_string()),
        }
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        for (_, live) in self.layers.drain() {
            live.layer.detach();
        }
        for (_, js_marker) in self.markers.drain() {
            js_marker.detach();
        }
        self.map.destroy();
    }
}

fn marker_from(marker: &MarkerLayer<'_>, options: &Object) -> Result<Layer, EngineError> {
    let js_marker = self::marker(&lat_lng(marker.position), options).map_err(js_error("L.marker"))?;
    js_marker.bind_tooltip(
        marker.tooltip,
        &to_js(
            "bindTooltip",
            &TooltipOptions {
                direction: "top",
                offset: [0, -30],
            },
        )?,
    );
    js_marker.bind_popup(&marker.popup_html, &to_js("bindPopup", &POPUP_OPTIONS)?);
    Ok(js_marker)
}
