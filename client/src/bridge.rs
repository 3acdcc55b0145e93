//! Named window functions that popup markup calls back into the map with.
//!
//! The window functions are installed once and look up the current table on
//! every call, so republishing only swaps the table.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use nocturne_shared::Place;

pub const PLACE_BY_ID_FN: &str = "__nocturnePlaceById";
pub const OPEN_PLACE_DETAIL_FN: &str = "__nocturneOpenPlaceDetail";
pub const OPEN_TERRITORY_DETAIL_FN: &str = "__nocturneOpenTerritoryDetail";

/// Current state the window functions answer from.
pub struct BridgeTable {
    pub places: Arc<Vec<Place>>,
    pub open_place: Rc<dyn Fn(Place)>,
    pub open_territory_detail: Rc<dyn Fn(String)>,
}

impl BridgeTable {
    pub fn place_by_id(&self, id: &str) -> Option<&Place> {
        self.places.iter().find(|p| p.id == id)
    }
}

thread_local! {
    static CURRENT: RefCell<Option<Rc<BridgeTable>>> = const { RefCell::new(None) };
}

fn current() -> Option<Rc<BridgeTable>> {
    CURRENT.with(|slot| slot.borrow().clone())
}

/// Make `table` the one popup actions see, installing the window functions
/// on first use.
pub fn publish(table: BridgeTable) {
    CURRENT.with(|slot| *slot.borrow_mut() = Some(Rc::new(table)));
    #[cfg(target_arch = "wasm32")]
    window::install();
}

/// Remove the window functions and drop the table.
pub fn unpublish() {
    CURRENT.with(|slot| slot.borrow_mut().take());
    #[cfg(target_arch = "wasm32")]
    window::uninstall();
}

pub fn place_by_id(id: &str) -> Option<Place> {
    current()?.place_by_id(id).cloned()
}

/// Select a place from popup markup. Returns whether it was found.
pub fn open_place_detail(id: &str) -> bool {
    let Some(table) = current() else {
        return false;
    };
    let Some(place) = table.place_by_id(id).cloned() else {
        return false;
    };
    (table.open_place)(place);
    true
}

pub fn open_territory_detail(id: &str) -> bool {
    let Some(table) = current() else {
        return false;
    };
    (table.open_territory_detail)(id.to_string());
    true
}

#[cfg(target_arch = "wasm32")]
mod window {
    use std::cell::RefCell;

    use js_sys::Reflect;
    use wasm_bindgen::JsValue;
    use wasm_bindgen::closure::Closure;

    use super::{OPEN_PLACE_DETAIL_FN, OPEN_TERRITORY_DETAIL_FN, PLACE_BY_ID_FN};
    use crate::log;

    struct WindowBinding {
        window: web_sys::Window,
        _place_by_id: Closure<dyn Fn(String) -> JsValue>,
        _open_place: Closure<dyn Fn(String)>,
        _open_territory: Closure<dyn Fn(String)>,
    }

    thread_local! {
        static BINDING: RefCell<Option<WindowBinding>> = const { RefCell::new(None) };
    }

    fn set(window: &web_sys::Window, name: &str, value: &JsValue) {
        if let Err(err) = Reflect::set(window, &JsValue::from_str(name), value) {
            log::warn(&format!("bridge: failed to publish {name}: {err:?}"));
        }
    }

    pub(super) fn install() {
        if BINDING.with(|slot| slot.borrow().is_some()) {
            return;
        }
        let Some(window) = web_sys::window() else {
            return;
        };

        let place_by_id = Closure::<dyn Fn(String) -> JsValue>::new(|id: String| {
            super::place_by_id(&id)
                .and_then(|place| {
                    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
                    serde::Serialize::serialize(&place, &serializer).ok()
                })
                .unwrap_or(JsValue::NULL)
        });
        let open_place = Closure::<dyn Fn(String)>::new(|id: String| {
            if !super::open_place_detail(&id) {
                log::info(&format!("bridge: place {id} is not loaded"));
            }
        });
        let open_territory = Closure::<dyn Fn(String)>::new(|id: String| {
            super::open_territory_detail(&id);
        });

        set(&window, PLACE_BY_ID_FN, place_by_id.as_ref());
        set(&window, OPEN_PLACE_DETAIL_FN, open_place.as_ref());
        set(&window, OPEN_TERRITORY_DETAIL_FN, open_territory.as_ref());

        BINDING.with(|slot| {
            *slot.borrow_mut() = Some(WindowBinding {
                window,
                _place_by_id: place_by_id,
                _open_place: open_place,
                _open_territory: open_territory,
            });
        });
    }

    pub(super) fn uninstall() {
        let Some(binding) = BINDING.with(|slot| slot.borrow_mut().take()) else {
            return;
        };
        for name in [PLACE_BY_ID_FN, OPEN_PLACE_DETAIL_FN, OPEN_TERRITORY_DETAIL_FN] {
            let _ = Reflect::delete_property(&binding.window, &JsValue::from_str(name));
        }
    }
}
