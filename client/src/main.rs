mod app;
mod bridge;
mod config;
mod drawer;
mod engine;
mod icons;
mod layers;
#[cfg(target_arch = "wasm32")]
mod leaflet;
mod log;
mod map_core;
mod map_view;
mod navigation;
mod popup;
mod sidebar;
mod sync;
mod territory;
mod timers;
mod viewport;

#[cfg(not(target_arch = "wasm32"))]
mod leaflet {
    use nocturne_shared::{LatLng, LatLngBounds};

    use crate::engine::{
        EngineError, EventSink, LayerId, MapEngine, MapView, MarkerId, MarkerLayer, OutlineLayer,
        Pane, PathStyle, PolygonLayer, TileLayerSpec,
    };

    /// Native builds have no page to draw on; construction always fails.
    pub struct LeafletEngine;

    impl LeafletEngine {
        pub fn new(
            _container: web_sys::HtmlElement,
            _view: &MapView,
            _events: EventSink,
        ) -> Result<Self, EngineError> {
            Err(EngineError::Unsupported)
        }
    }

    impl MapEngine for LeafletEngine {
        fn create_pane(&mut self, _pane: Pane) -> Result<(), EngineError> {
            Err(EngineError::Unsupported)
        }
        fn add_tile_layer(&mut self, _spec: &TileLayerSpec) -> Result<(), EngineError> {
            Err(EngineError::Unsupported)
        }
        fn add_outline_layer(&mut self, _layer: OutlineLayer<'_>) -> Result<LayerId, EngineError> {
            Err(EngineError::Unsupported)
        }
        fn add_polygon_layer(&mut self, _layer: PolygonLayer<'_>) -> Result<LayerId, EngineError> {
            Err(EngineError::Unsupported)
        }
        fn set_layer_style(&mut self, _id: LayerId, _style: &PathStyle) {}
        fn remove_layer(&mut self, _id: LayerId) {}
        fn add_marker(&mut self, _marker: MarkerLayer<'_>) -> Result<MarkerId, EngineError> {
            Err(EngineError::Unsupported)
        }
        fn remove_marker(&mut self, _id: MarkerId) {}
        fn open_popup(&mut self, _id: MarkerId) {}
        fn close_popups(&mut self) {}
        fn fly_to(&mut self, _center: LatLng, _zoom: f64, _duration_secs: f64) {}
        fn fly_to_bounds(&mut self, _bounds: LatLngBounds, _padding_px: f64, _duration_secs: f64) {}
        fn release(&mut self) {}
    }
}

use leptos::mount::mount_to;
use std::any::Any;
use std::cell::RefCell;
use wasm_bindgen::JsCast;

thread_local! {
    static APP_MOUNT_HANDLE: RefCell<Option<Box<dyn Any>>> = RefCell::new(None);
}

fn main() {
    console_error_panic_hook::set_once();
    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(document) = window.document() else {
        return;
    };
    let mount_target = document
        .get_element_by_id("app")
        .and_then(|node| node.dyn_into::<web_sys::HtmlElement>().ok())
        .or_else(|| document.body());
    let Some(target) = mount_target else {
        return;
    };

    APP_MOUNT_HANDLE.with(move |slot| {
        // Drop any previous mount so its effects stop touching the map.
        let _old = slot.borrow_mut().take();
        let handle = mount_to(target, app::App);
        *slot.borrow_mut() = Some(Box::new(handle));
    });
}
