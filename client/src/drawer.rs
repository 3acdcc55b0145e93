use std::cell::RefCell;

use leptos::prelude::*;
use wasm_bindgen::JsCast;

use nocturne_shared::{Clan, MAX_PROTECTION, Place, PlaceDescription, Viewer, secret_text};

use crate::config::MapConfig;
use crate::icons::MarkerGlyph;
use crate::map_view::{SelectedPlace, VisiblePlaces, fly_to_place};
use crate::sync::MapData;

struct KeydownBinding {
    window: web_sys::Window,
    handler: wasm_bindgen::closure::Closure<dyn Fn(web_sys::KeyboardEvent)>,
}

thread_local! {
    static KEYDOWN_BINDING: RefCell<Option<KeydownBinding>> = const { RefCell::new(None) };
}

/// Filled/empty state of each protection pip.
pub fn protection_pips(level: u8) -> [bool; MAX_PROTECTION as usize] {
    std::array::from_fn(|i| i < usize::from(level.min(MAX_PROTECTION)))
}

/// Other places in the same territory, in load order.
pub fn sibling_places<'a>(place: &Place, places: &'a [Place]) -> Vec<&'a Place> {
    let Some(territory_id) = place.territory_id.as_deref() else {
        return Vec::new();
    };
    places
        .iter()
        .filter(|p| p.id != place.id && p.territory_id.as_deref() == Some(territory_id))
        .collect()
}

/// Titled, non-empty description paragraphs in display order.
pub fn description_sections(description: &PlaceDescription) -> Vec<(&'static str, &str)> {
    [
        ("Ambiance", description.ambiance.as_deref()),
        ("Utility", description.utility.as_deref()),
        ("Occult security", description.occult_security.as_deref()),
        ("Special guardian", description.special_guardian.as_deref()),
    ]
    .into_iter()
    .filter_map(|(title, text)| {
        text.map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| (title, t))
    })
    .collect()
}

fn install_escape(selected: RwSignal<Option<Place>>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    uninstall_escape();
    let handler = wasm_bindgen::closure::Closure::<dyn Fn(web_sys::KeyboardEvent)>::new(
        move |event: web_sys::KeyboardEvent| {
            if event.key() == "Escape" {
                selected.set(None);
            }
        },
    );
    if window
        .add_event_listener_with_callback("keydown", handler.as_ref().unchecked_ref())
        .is_err()
    {
        return;
    }
    KEYDOWN_BINDING.with(|slot| {
        *slot.borrow_mut() = Some(KeydownBinding { window, handler });
    });
}

fn uninstall_escape() {
    KEYDOWN_BINDING.with(|slot| {
        if let Some(old) = slot.borrow_mut().take() {
            let _ = old.window.remove_event_listener_with_callback(
                "keydown",
                old.handler.as_ref().unchecked_ref(),
            );
        }
    });
}

#[component]
pub fn PlaceDrawer() -> impl IntoView {
    let SelectedPlace(selected) = expect_context();

    Effect::new(move || {
        if selected.with(Option::is_some) {
            install_escape(selected);
        } else {
            uninstall_escape();
        }
    });
    on_cleanup(uninstall_escape);

    move || {
        selected.get().map(|place| {
            view! {
                <div
                    class="place-drawer-backdrop"
                    style="position: fixed; inset: 0; background: rgba(0,0,0,0.6); z-index: 2000; display: flex; justify-content: flex-end;"
                    on:click=move |_| selected.set(None)
                >
                    <div
                        class="place-drawer scrollbar-thin"
                        style="width: min(520px, 100%); height: 100%; overflow-y: auto; background: #15111a; border-left: 1px solid #3a2a2a; box-shadow: -8px 0 30px rgba(0,0,0,0.5);"
                        on:click=|ev| ev.stop_propagation()
                    >
                        <PlaceDetail place=place />
                    </div>
                </div>
            }
        })
    }
}

#[component]
fn PlaceDetail(place: Place) -> impl IntoView {
    let SelectedPlace(selected) = expect_context();
    let VisiblePlaces(visible_places) = expect_context();
    let data: MapData = expect_context();
    let config: MapConfig = expect_context();
    let viewer: Viewer = use_context().unwrap_or_default();
    let show_secrets = RwSignal::new(false);

    let clan: Option<Clan> = place.clan_id.as_deref().and_then(|id| {
        data.clans
            .get_untracked()
            .and_then(|clans| clans.iter().find(|c| c.id == id).cloned())
    });
    let color = clan
        .as_ref()
        .and_then(|c| c.color.clone())
        .unwrap_or_else(|| nocturne_shared::PLACE_GOLD.to_string());
    let glyph = MarkerGlyph::for_place(&place);

    let siblings: Vec<Place> = visible_places
        .get_untracked()
        .map(|places| sibling_places(&place, &places).into_iter().cloned().collect())
        .unwrap_or_default();

    let sections: Vec<(&'static str, String)> = description_sections(&place.description)
        .into_iter()
        .map(|(title, text)| (title, text.to_string()))
        .collect();
    let secrets: Vec<(String, String)> = place
        .description
        .gm_secrets
        .iter()
        .map(|(key, value)| (key.clone(), secret_text(value)))
        .collect();
    let can_see_secrets = viewer == Viewer::GameMaster && !secrets.is_empty();

    let images = [1u8, 2].map(|index| config.place_image_url(&place.id, index));
    let pips = protection_pips(place.protection_level());
    let sanctuary = place.is_sanctuary();

    view! {
        <div style="position: relative;">
            <button
                class="drawer-close"
                style="position: absolute; top: 12px; right: 12px; z-index: 2; background: rgba(0,0,0,0.5); color: #e8dcc8; border: 1px solid #3a2a2a; border-radius: 50%; width: 32px; height: 32px; cursor: pointer;"
                on:click=move |_| selected.set(None)
            >
                "\u{2715}"
            </button>
            <div style="display: grid; grid-template-columns: 1fr 1fr; gap: 2px;">
                {images.into_iter().map(|src| view! { <PlaceImage src=src /> }).collect_view()}
            </div>
        </div>
        <div style="padding: 18px 20px; display: flex; flex-direction: column; gap: 14px;">
            <div style=format!("border-left: 3px solid {color}; padding-left: 12px;")>
                <h2 style=format!("margin: 0; font-size: 1.4rem; color: {color};")>
                    <span class=format!("glyph glyph-{}", glyph.css_shape())></span>
                    {place.name.clone()}
                </h2>
                <div style="display: flex; flex-wrap: wrap; gap: 6px; margin-top: 6px; font-size: 0.78rem;">
                    {place.status.clone().map(|status| {
                        view! {
                            <span
                                class="badge"
                                class:badge-sanctuary=sanctuary
                                style="padding: 2px 8px; border-radius: 10px; border: 1px solid #5a4a3a;"
                            >
                                {status}
                            </span>
                        }
                    })}
                    {clan.map(|clan| {
                        view! {
                            <span
                                class="badge"
                                style=format!("padding: 2px 8px; border-radius: 10px; border: 1px solid {color}; color: {color};")
                            >
                                {clan.name}
                            </span>
                        }
                    })}
                </div>
            </div>
            <div style="display: grid; grid-template-columns: auto 1fr; gap: 4px 12px; font-size: 0.85rem; color: #b09a7a;">
                {place.territory_name().map(|name| {
                    let name = name.to_string();
                    view! {
                        <span>"Territory"</span>
                        <span style="color: #e8dcc8;">{name}</span>
                    }
                })}
                {place.address.clone().map(|address| {
                    view! {
                        <span>"Address"</span>
                        <span style="color: #e8dcc8;">{address}</span>
                    }
                })}
                <span>"Protection"</span>
                <span style="letter-spacing: 3px;">
                    {pips
                        .into_iter()
                        .map(|filled| {
                            let (glyph, tint) = if filled {
                                ("\u{25C6}", color.clone())
                            } else {
                                ("\u{25C7}", "#4a3a3a".to_string())
                            };
                            view! { <span style=format!("color: {tint};")>{glyph}</span> }
                        })
                        .collect_view()}
                </span>
            </div>
            {sections
                .into_iter()
                .map(|(title, text)| {
                    view! {
                        <section>
                            <h3 style="margin: 0 0 4px; font-size: 0.75rem; text-transform: uppercase; letter-spacing: 1px; color: #8a7a6a;">
                                {title}
                            </h3>
                            <p style="margin: 0; line-height: 1.5; white-space: pre-line;">{text}</p>
                        </section>
                    }
                })
                .collect_view()}
            {(!siblings.is_empty()).then(|| {
                view! {
                    <section>
                        <h3 style="margin: 0 0 6px; font-size: 0.75rem; text-transform: uppercase; letter-spacing: 1px; color: #8a7a6a;">
                            "Elsewhere in this territory"
                        </h3>
                        <ul style="list-style: none; margin: 0; padding: 0; display: flex; flex-direction: column; gap: 4px;">
                            {siblings
                                .into_iter()
                                .map(|sibling| {
                                    let name = sibling.name.clone();
                                    let shape = MarkerGlyph::for_place(&sibling).css_shape();
                                    view! {
                                        <li>
                                            <button
                                                class="sibling-place"
                                                style="background: none; border: none; color: #e8dcc8; cursor: pointer; padding: 4px 0; text-align: left;"
                                                on:click=move |_| {
                                                    fly_to_place(&sibling);
                                                    selected.set(Some(sibling.clone()));
                                                }
                                            >
                                                <span class=format!("glyph glyph-{shape}")></span>
                                                {name}
                                            </button>
                                        </li>
                                    }
                                })
                                .collect_view()}
                        </ul>
                    </section>
                }
            })}
            {can_see_secrets.then(|| {
                view! {
                    <section>
                        <button
                            class="secrets-toggle"
                            style="background: none; border: 1px dashed #6a3a3a; color: #c0392b; padding: 6px 10px; cursor: pointer; width: 100%;"
                            on:click=move |_| show_secrets.update(|open| *open = !*open)
                        >
                            {move || if show_secrets.get() { "Hide secrets" } else { "Reveal secrets" }}
                        </button>
                        <Show when=move || show_secrets.get()>
                            <dl style="margin: 8px 0 0; font-size: 0.85rem;">
                                {secrets
                                    .clone()
                                    .into_iter()
                                    .map(|(key, value)| {
                                        view! {
                                            <dt style="color: #8a7a6a;">{key}</dt>
                                            <dd style="margin: 0 0 6px;">{value}</dd>
                                        }
                                    })
                                    .collect_view()}
                            </dl>
                        </Show>
                    </section>
                }
            })}
        </div>
    }
}

#[component]
fn PlaceImage(src: String) -> impl IntoView {
    let loaded = RwSignal::new(false);
    let failed = RwSignal::new(false);

    view! {
        <div style="position: relative; aspect-ratio: 4 / 3; background: #1f1820; overflow: hidden;">
            <Show
                when=move || !failed.get()
                fallback=|| {
                    view! {
                        <div style="position: absolute; inset: 0; display: flex; align-items: center; justify-content: center; color: #5a4a4a; font-size: 0.75rem;">
                            "No image"
                        </div>
                    }
                }
            >
                <img
                    src=src.clone()
                    alt=""
                    style="width: 100%; height: 100%; object-fit: cover; transition: opacity 0.3s;"
                    style:opacity=move || if loaded.get() { "1" } else { "0" }
                    on:load=move |_| loaded.set(true)
                    on:error=move |_| failed.set(true)
                />
            </Show>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn place(id: &str, territory: Option<&str>) -> Place {
        serde_json::from_value(json!({ "id": id, "name": id, "territory_id": territory })).unwrap()
    }

    #[test]
    fn pips_fill_up_to_level() {
        assert_eq!(protection_pips(2), [true, true, false, false, false, false]);
        assert_eq!(protection_pips(0), [false; 6]);
        assert_eq!(protection_pips(9), [true; 6]);
    }

    #[test]
    fn siblings_share_territory_and_exclude_self() {
        let places = vec![
            place("a", Some("t1")),
            place("b", Some("t1")),
            place("c", Some("t2")),
            place("d", None),
        ];
        let ids: Vec<&str> = sibling_places(&places[0], &places)
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["b"]);
        assert!(sibling_places(&places[3], &places).is_empty());
    }

    #[test]
    fn empty_description_sections_are_dropped() {
        let description = PlaceDescription {
            ambiance: Some("Candles".into()),
            utility: Some("   ".into()),
            special_guardian: Some("A gargoyle".into()),
            ..PlaceDescription::default()
        };
        assert_eq!(
            description_sections(&description),
            vec![("Ambiance", "Candles"), ("Special guardian", "A gargoyle")]
        );
    }
}
