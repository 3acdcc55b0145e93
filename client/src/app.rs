use std::cell::RefCell;

use leptos::prelude::*;
use wasm_bindgen::JsCast;

use nocturne_shared::{NavigationSlot, NavigationTarget, Viewer};

use crate::config::MapConfig;
use crate::log;
use crate::map_view::TerritoryMap;

const MAP_ROUTE: &str = "#/map";

struct HashChangeBinding {
    window: web_sys::Window,
    handler: wasm_bindgen::closure::Closure<dyn Fn(web_sys::HashChangeEvent)>,
}

thread_local! {
    static HASH_CHANGE_BINDING: RefCell<Option<HashChangeBinding>> = const { RefCell::new(None) };
}

/// Deep links other screens use to focus the map:
/// `#/map/place/<id>`, `#/map/territory/<id>` and `#/map/territory/<id>/<place id>`.
pub fn parse_route(hash: &str) -> Option<NavigationTarget> {
    let path = hash.trim_start_matches('#').trim_start_matches('/');
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    if segments.next()? != "map" {
        return None;
    }
    let kind = segments.next()?;
    let id = segments.next()?.to_string();
    let secondary = segments.next().map(str::to_string);
    if segments.next().is_some() {
        return None;
    }
    match (kind, secondary) {
        ("place", None) => Some(NavigationTarget::Place { id }),
        ("territory", place_id) => Some(NavigationTarget::Territory { id, place_id }),
        _ => None,
    }
}

pub fn territory_detail_route(territory_id: &str) -> String {
    format!("#/territories/{territory_id}")
}

fn current_hash() -> Option<String> {
    web_sys::window()?.location().hash().ok()
}

fn set_hash(hash: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    if let Err(err) = window.location().set_hash(hash) {
        log::warn(&format!("app: failed to set route {hash}: {err:?}"));
    }
}

/// Raise the route's target on the slot it belongs to.
fn route_to_slots(
    hash: &str,
    place_target: RwSignal<NavigationSlot>,
    territory_target: RwSignal<NavigationSlot>,
) {
    match parse_route(hash) {
        Some(target @ NavigationTarget::Place { .. }) => place_target.update(|slot| {
            slot.raise(target);
        }),
        Some(target) => territory_target.update(|slot| {
            slot.raise(target);
        }),
        None => {}
    }
}

fn install_hash_listener(
    place_target: RwSignal<NavigationSlot>,
    territory_target: RwSignal<NavigationSlot>,
) {
    let Some(window) = web_sys::window() else {
        return;
    };
    uninstall_hash_listener();
    let handler = wasm_bindgen::closure::Closure::<dyn Fn(web_sys::HashChangeEvent)>::new(
        move |_event: web_sys::HashChangeEvent| {
            if let Some(hash) = current_hash() {
                route_to_slots(&hash, place_target, territory_target);
            }
        },
    );
    if window
        .add_event_listener_with_callback("hashchange", handler.as_ref().unchecked_ref())
        .is_err()
    {
        return;
    }
    HASH_CHANGE_BINDING.with(|slot| {
        *slot.borrow_mut() = Some(HashChangeBinding { window, handler });
    });
}

fn uninstall_hash_listener() {
    HASH_CHANGE_BINDING.with(|slot| {
        if let Some(old) = slot.borrow_mut().take() {
            let _ = old.window.remove_event_listener_with_callback(
                "hashchange",
                old.handler.as_ref().unchecked_ref(),
            );
        }
    });
}

#[component]
pub fn App() -> impl IntoView {
    let place_target = RwSignal::new(NavigationSlot::default());
    let territory_target = RwSignal::new(NavigationSlot::default());
    provide_context(MapConfig::default());

    if let Some(hash) = current_hash() {
        route_to_slots(&hash, place_target, territory_target);
    }
    install_hash_listener(place_target, territory_target);
    on_cleanup(uninstall_hash_listener);

    let clear_route = Callback::new(move |_: ()| {
        if current_hash().is_some_and(|hash| parse_route(&hash).is_some()) {
            set_hash(MAP_ROUTE);
        }
    });
    let open_territory_detail = Callback::new(move |territory_id: String| {
        set_hash(&territory_detail_route(&territory_id));
    });

    view! {
        <main style="position: fixed; inset: 0; font-family: 'Cormorant Garamond', Georgia, serif;">
            <TerritoryMap
                place_target=place_target
                territory_target=territory_target
                on_target_place_consumed=clear_route
                on_target_territory_consumed=clear_route
                on_navigate_to_territory_detail=open_territory_detail
                viewer=Viewer::GameMaster
            />
        </main>
    }
}
