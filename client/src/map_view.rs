use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use nocturne_shared::{NavigationSlot, NavigationTarget, Place, Territory, Viewer};

use crate::bridge::{self, BridgeTable};
use crate::config::MapConfig;
use crate::drawer::PlaceDrawer;
use crate::engine::{EngineError, EventSink, MapEvent};
use crate::leaflet::LeafletEngine;
use crate::log;
use crate::map_core::MapCore;
use crate::navigation::{Scheduled, jump_to_place, take_place_target, take_territory_target};
use crate::sidebar::MapSidebar;
use crate::sync::{self, MapData, mark_polygons};
use crate::timers::TimerScope;
use crate::viewport::{Acquire, acquire_delay_ms};

/// Newtype wrappers so each signal gets its own context slot.
#[derive(Clone, Copy)]
pub(crate) struct ClanFilter(pub RwSignal<Option<String>>);
#[derive(Clone, Copy)]
pub(crate) struct SelectedTerritory(pub RwSignal<Option<String>>);
#[derive(Clone, Copy)]
pub(crate) struct SelectedPlace(pub RwSignal<Option<Place>>);
/// Places the current viewer may see.
#[derive(Clone, Copy)]
pub(crate) struct VisiblePlaces(pub Memo<Option<Arc<Vec<Place>>>>);
/// Territories with their polygon flag resolved against the merged document.
#[derive(Clone, Copy)]
pub(crate) struct MarkedTerritories(pub Memo<Option<Arc<Vec<Territory>>>>);

thread_local! {
    static MAP_CORE: RefCell<MapCore<LeafletEngine>> = RefCell::new(MapCore::default());
    static TIMERS: RefCell<TimerScope> = RefCell::new(TimerScope::default());
}

fn with_core<R>(f: impl FnOnce(&mut MapCore<LeafletEngine>) -> R) -> Option<R> {
    MAP_CORE.with(|core| match core.try_borrow_mut() {
        Ok(mut core) => Some(f(&mut core)),
        Err(_) => {
            log::warn("map: engine busy, skipping re-entrant call");
            None
        }
    })
}

fn schedule(scheduled: Scheduled) {
    let Scheduled {
        delay_ms,
        follow_up,
    } = scheduled;
    TIMERS.with(|timers| {
        timers.borrow_mut().schedule(delay_ms, move || {
            with_core(|core| core.run_follow_up(&follow_up));
        });
    });
}

fn report<T>(step: &str, result: Option<Result<T, EngineError>>) {
    if let Some(Err(err)) = result {
        log::warn(&format!("map: {step} failed: {err}"));
    }
}

/// Fly to `place` and close popups shortly after.
pub(crate) fn fly_to_place(place: &Place) {
    if let Some(Some(scheduled)) = with_core(|core| jump_to_place(core, place)) {
        schedule(scheduled);
    }
}

/// Retry until the container is in the document, then build the engine.
fn acquire_engine(
    container: NodeRef<leptos::html::Div>,
    ready: RwSignal<bool>,
    events: EventSink,
    alive: Arc<AtomicBool>,
) {
    spawn_local(async move {
        let mut attempt = 0;
        loop {
            TimeoutFuture::new(acquire_delay_ms(attempt)).await;
            if !alive.load(Ordering::Relaxed) {
                return;
            }
            let node = container.get_untracked().map(|div| {
                let element: &web_sys::HtmlElement = &div;
                element.clone()
            });
            let outcome = with_core(|core| {
                core.viewport
                    .acquire(node, |node, view| LeafletEngine::new(node, view, events.clone()))
            });
            match outcome {
                Some(Ok(Acquire::Retry)) | None => attempt += 1,
                Some(Ok(Acquire::Acquired | Acquire::AlreadyAcquired)) => {
                    ready.set(true);
                    return;
                }
                Some(Err(err)) => {
                    log::warn(&format!("map: engine unavailable: {err}"));
                    return;
                }
            }
        }
    });
}

#[component]
pub fn TerritoryMap(
    place_target: RwSignal<NavigationSlot>,
    territory_target: RwSignal<NavigationSlot>,
    #[prop(optional)] on_target_place_consumed: Option<Callback<()>>,
    #[prop(optional)] on_target_territory_consumed: Option<Callback<()>>,
    #[prop(optional)] on_navigate_to_territory_detail: Option<Callback<String>>,
    #[prop(optional)] viewer: Viewer,
) -> impl IntoView {
    let config: MapConfig = use_context().unwrap_or_default();
    let data = MapData::new();
    let clan_filter = RwSignal::new(None::<String>);
    let selected_territory = RwSignal::new(None::<String>);
    let selected_place = RwSignal::new(None::<Place>);
    let detail_request = RwSignal::new(NavigationSlot::default());
    let ready = RwSignal::new(false);
    let container = NodeRef::<leptos::html::Div>::new();
    let alive = Arc::new(AtomicBool::new(true));

    provide_context(viewer.clone());
    let visible_places = Memo::new(move |_| {
        data.places
            .get()
            .map(|places| Arc::new(viewer.filter_places(&places)))
    });
    let marked_territories = Memo::new(move |_| match (data.territories.get(), data.merged.get()) {
        (Some(territories), Some(merged)) => Some(Arc::new(mark_polygons(&territories, &merged))),
        (territories, _) => territories,
    });

    provide_context(config.clone());
    provide_context(data);
    provide_context(ClanFilter(clan_filter));
    provide_context(SelectedTerritory(selected_territory));
    provide_context(SelectedPlace(selected_place));
    provide_context(VisiblePlaces(visible_places));
    provide_context(MarkedTerritories(marked_territories));

    sync::load(config, data, alive.clone());

    let events: EventSink = Rc::new(move |event| match event {
        MapEvent::TerritoryClicked(id) => selected_territory.set(Some(id)),
    });
    acquire_engine(container, ready, events, alive.clone());

    // Contour outlines need only their own document.
    Effect::new(move || {
        if !ready.get() {
            return;
        }
        let Some(contours) = data.contours.get() else {
            return;
        };
        report("contours", with_core(|core| core.sync_contours(&contours)));
    });

    // Territory polygons: clans, territories and merged geometry.
    Effect::new(move || {
        if !ready.get() {
            return;
        }
        let filter = clan_filter.get();
        let (Some(territories), Some(merged), Some(clans)) =
            (marked_territories.get(), data.merged.get(), data.clans.get())
        else {
            return;
        };
        report(
            "territories",
            with_core(|core| {
                core.sync_territories(&territories, &merged, &clans, filter.as_deref())
            }),
        );
    });

    // Place markers: visible places and clans.
    Effect::new(move || {
        if !ready.get() {
            return;
        }
        let filter = clan_filter.get();
        let (Some(places), Some(clans)) = (visible_places.get(), data.clans.get()) else {
            return;
        };
        report(
            "places",
            with_core(|core| core.sync_places(&places, &clans, filter.as_deref())),
        );
    });

    Effect::new(move || {
        let is_ready = ready.get();
        let places = visible_places.get();
        if !is_ready || !place_target.with(NavigationSlot::is_pending) {
            return;
        }
        let mut slot = place_target.get_untracked();
        let Some(outcome) = with_core(|core| {
            take_place_target(core, &mut slot, places.as_deref().map(Vec::as_slice))
        })
        .flatten() else {
            return;
        };
        place_target.set(slot);

        if let Some(place) = outcome.selected {
            selected_place.set(Some(place));
        }
        if let Some(scheduled) = outcome.scheduled {
            schedule(scheduled);
        }
        if let Some(consumed) = on_target_place_consumed {
            consumed.run(());
        }
    });

    Effect::new(move || {
        let is_ready = ready.get();
        let merged = data.merged.get();
        let territories = marked_territories.get().unwrap_or_default();
        let clans = data.clans.get().unwrap_or_default();
        if !is_ready || !territory_target.with(NavigationSlot::is_pending) {
            return;
        }
        let mut slot = territory_target.get_untracked();
        let Some(outcome) = with_core(|core| {
            take_territory_target(core, &mut slot, merged.as_deref(), &territories, &clans)
        })
        .flatten() else {
            return;
        };
        territory_target.set(slot);

        if let Some(id) = outcome.selected {
            selected_territory.set(Some(id));
        }
        if let Some(scheduled) = outcome.scheduled {
            schedule(scheduled);
        }
        if let Some(place_id) = outcome.forward_place {
            place_target.update(|slot| {
                slot.raise(NavigationTarget::Place { id: place_id });
            });
        }
        if let (Some(id), Some(navigate)) = (outcome.open_detail, on_navigate_to_territory_detail) {
            navigate.run(id);
        }
        if let Some(consumed) = on_target_territory_consumed {
            consumed.run(());
        }
    });

    // Detail requests raised from popup markup.
    Effect::new(move || {
        if !detail_request.with(NavigationSlot::is_pending) {
            return;
        }
        let mut slot = detail_request.get_untracked();
        let Some(outcome) =
            with_core(|core| take_territory_target(core, &mut slot, None, &[], &[])).flatten()
        else {
            return;
        };
        detail_request.set(slot);
        if let (Some(id), Some(navigate)) = (outcome.open_detail, on_navigate_to_territory_detail) {
            navigate.run(id);
        }
    });

    // Republish the popup bridge whenever the visible places change.
    Effect::new(move || {
        let places = visible_places.get().unwrap_or_default();
        bridge::publish(BridgeTable {
            places,
            open_place: Rc::new(move |place: Place| selected_place.set(Some(place))),
            open_territory_detail: Rc::new(move |id: String| {
                detail_request.update(|slot| {
                    slot.raise(NavigationTarget::TerritoryDetail { id });
                });
            }),
        });
    });

    on_cleanup(move || {
        alive.store(false, Ordering::Relaxed);
        bridge::unpublish();
        TIMERS.with(|timers| timers.borrow_mut().cancel_all());
        with_core(|core| core.teardown());
    });

    view! {
        <div
            class="territory-map"
            style="display: flex; width: 100%; height: 100%; background: #0d0b0e; color: #e8dcc8;"
        >
            <MapSidebar />
            <div style="position: relative; flex: 1; min-width: 0;">
                <div
                    node_ref=container
                    id="territory-map"
                    style="position: absolute; inset: 0;"
                ></div>
                <Show when=move || data.is_loading()>
                    <div
                        class="map-loading"
                        style="position: absolute; inset: 0; display: flex; align-items: center; justify-content: center; background: rgba(13,11,14,0.85); z-index: 1000; font-style: italic; color: #b09a7a;"
                    >
                        "Loading the city..."
                    </div>
                </Show>
                {move || {
                    data.error
                        .get()
                        .map(|message| {
                            view! {
                                <div
                                    class="map-error"
                                    style="position: absolute; inset: 0; display: flex; flex-direction: column; align-items: center; justify-content: center; gap: 8px; background: rgba(13,11,14,0.92); z-index: 1001;"
                                >
                                    <div style="font-size: 1.1rem; color: #c0392b;">
                                        "The map could not be loaded"
                                    </div>
                                    <div style="font-size: 0.8rem; color: #8a7a6a;">{message}</div>
                                </div>
                            }
                        })
                }}
            </div>
            <PlaceDrawer />
        </div>
    }
}
