use leptos::prelude::*;

use nocturne_shared::{Clan, NEUTRAL_GRAY, Place, Territory, resolve_color, with_alpha};

use crate::map_view::{ClanFilter, MarkedTerritories, SelectedTerritory, VisiblePlaces};
use crate::popup::wealth_stars;
use crate::sync::MapData;
use crate::territory::dominant_clan;

/// Clicking the active clan clears the filter; any other click selects it.
pub fn toggle_filter(current: Option<&str>, clicked: &str) -> Option<String> {
    if current == Some(clicked) {
        None
    } else {
        Some(clicked.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MapStats {
    pub territories: usize,
    pub places: usize,
    pub clans: usize,
}

/// Counts under the active clan filter.
pub fn map_stats(
    territories: &[Territory],
    places: &[Place],
    clans: &[Clan],
    filter: Option<&str>,
) -> MapStats {
    let Some(clan_id) = filter else {
        return MapStats {
            territories: territories.len(),
            places: places.len(),
            clans: clans.len(),
        };
    };
    MapStats {
        territories: territories.iter().filter(|t| t.is_dominated_by(clan_id)).count(),
        places: places.iter().filter(|p| p.belongs_to_clan(clan_id)).count(),
        clans: clans.len(),
    }
}

#[component]
pub fn MapSidebar() -> impl IntoView {
    view! {
        <aside
            class="map-sidebar scrollbar-thin"
            style="width: 280px; flex-shrink: 0; height: 100%; overflow-y: auto; background: #120e13; border-right: 1px solid #2a2024; display: flex; flex-direction: column; gap: 18px; padding: 16px 14px;"
        >
            <ClanFilterPanel />
            <StatsPanel />
            <SelectedTerritoryPanel />
        </aside>
    }
}

const HEADING_STYLE: &str = "margin: 0 0 8px; font-size: 0.7rem; text-transform: uppercase; letter-spacing: 1.5px; color: #8a7a6a;";

fn filter_button_style(active: bool, color: &str) -> String {
    let (background, border) = if active {
        (with_alpha(color, 0.15), color)
    } else {
        ("transparent".to_string(), "#2a2024")
    };
    format!(
        "display: flex; align-items: center; gap: 8px; width: 100%; padding: 6px 8px; background: {background}; border: 1px solid {border}; border-radius: 4px; color: #e8dcc8; cursor: pointer; text-align: left; font-size: 0.85rem;"
    )
}

#[component]
fn ClanFilterPanel() -> impl IntoView {
    let data: MapData = expect_context();
    let ClanFilter(filter) = expect_context();

    view! {
        <section>
            <h3 style=HEADING_STYLE>"Clans"</h3>
            <div style="display: flex; flex-direction: column; gap: 4px;">
                <button
                    style=move || filter_button_style(filter.with(Option::is_none), NEUTRAL_GRAY)
                    on:click=move |_| filter.set(None)
                >
                    "All"
                </button>
                {move || {
                    data.clans
                        .get()
                        .map(|clans| {
                            clans
                                .iter()
                                .map(|clan| {
                                    let id = clan.id.clone();
                                    let active_id = clan.id.clone();
                                    let color = resolve_color(clan.color.as_deref(), NEUTRAL_GRAY)
                                        .to_string();
                                    let dot = format!(
                                        "width: 10px; height: 10px; border-radius: 50%; background: {color}; flex-shrink: 0;"
                                    );
                                    let name = clan.name.clone();
                                    view! {
                                        <button
                                            style=move || {
                                                filter_button_style(
                                                    filter.with(|f| f.as_deref() == Some(active_id.as_str())),
                                                    &color,
                                                )
                                            }
                                            on:click=move |_| {
                                                filter.update(|f| *f = toggle_filter(f.as_deref(), &id))
                                            }
                                        >
                                            <span style=dot></span>
                                            {name}
                                        </button>
                                    }
                                })
                                .collect_view()
                        })
                }}
            </div>
        </section>
    }
}

#[component]
fn StatsPanel() -> impl IntoView {
    let data: MapData = expect_context();
    let ClanFilter(filter) = expect_context();
    let VisiblePlaces(visible_places) = expect_context();

    let stats = Memo::new(move |_| {
        let territories = data.territories.get().unwrap_or_default();
        let places = visible_places.get().unwrap_or_default();
        let clans = data.clans.get().unwrap_or_default();
        filter.with(|f| map_stats(&territories, &places, &clans, f.as_deref()))
    });

    let row = |label: &'static str, value: Signal<usize>| {
        view! {
            <div style="display: flex; justify-content: space-between; font-size: 0.85rem; padding: 2px 0;">
                <span style="color: #8a7a6a;">{label}</span>
                <span style="color: #e8dcc8; font-variant-numeric: tabular-nums;">
                    {move || value.get()}
                </span>
            </div>
        }
    };

    view! {
        <section>
            <h3 style=HEADING_STYLE>"Overview"</h3>
            {row("Territories", Signal::derive(move || stats.get().territories))}
            {row("Places", Signal::derive(move || stats.get().places))}
            {row("Clans", Signal::derive(move || stats.get().clans))}
        </section>
    }
}

#[component]
fn SelectedTerritoryPanel() -> impl IntoView {
    let data: MapData = expect_context();
    let SelectedTerritory(selected) = expect_context();
    let MarkedTerritories(territories) = expect_context();

    move || {
        let id = selected.get()?;
        let territories = territories.get()?;
        let territory = territories.iter().find(|t| t.id == id)?.clone();
        let clans = data.clans.get().unwrap_or_default();
        let clan = dominant_clan(&territory, &clans).cloned();
        let (clan_name, clan_color) = match &clan {
            Some(clan) => (
                clan.name.clone(),
                resolve_color(clan.color.as_deref(), NEUTRAL_GRAY).to_string(),
            ),
            None => ("Independent".to_string(), NEUTRAL_GRAY.to_string()),
        };

        Some(view! {
            <section style=format!("border-left: 3px solid {clan_color}; padding-left: 10px;")>
                <div style="display: flex; justify-content: space-between; align-items: baseline;">
                    <h3 style="margin: 0; font-size: 1.05rem; color: #e8dcc8;">{territory.name.clone()}</h3>
                    <button
                        style="background: none; border: none; color: #8a7a6a; cursor: pointer;"
                        on:click=move |_| selected.set(None)
                    >
                        "\u{2715}"
                    </button>
                </div>
                <div style=format!("font-size: 0.8rem; color: {clan_color}; margin-top: 2px;")>{clan_name}</div>
                {territory.importance_tier().map(|tier| {
                    view! { <div style="font-size: 0.75rem; color: #8a7a6a;">{tier.label()}</div> }
                })}
                {(!territory.has_polygon).then(|| {
                    view! {
                        <div style="font-size: 0.75rem; color: #6a5a5a; font-style: italic;">
                            "Not drawn on the map"
                        </div>
                    }
                })}
                {territory.description.ambiance.clone().map(|ambiance| {
                    view! {
                        <p style="margin: 8px 0 4px; font-style: italic; font-size: 0.85rem; color: #c8b89a;">
                            {ambiance}
                        </p>
                    }
                })}
                {territory.description.wealth_stars().map(|stars| {
                    view! {
                        <div style="font-size: 0.85rem; color: #b09030;">{wealth_stars(stars)}</div>
                    }
                })}
            </section>
        })
    }
}
