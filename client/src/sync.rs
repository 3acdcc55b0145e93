//! Loads the two boundary documents and the three record sets, each into its
//! own signal, so every render step can start as soon as its inputs exist.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use gloo_net::http::{Request, RequestBuilder};
use leptos::prelude::*;
use serde::de::DeserializeOwned;
use wasm_bindgen_futures::spawn_local;

use nocturne_shared::{Clan, FeatureCollection, Place, Territory};

use crate::config::MapConfig;
use crate::log;

pub const CLANS_QUERY: &str = "clans?select=*&order=name";
pub const TERRITORIES_QUERY: &str =
    "territories?select=*,clan:clans!territories_dominant_clan_id_fkey(*)&order=name";
pub const PLACES_QUERY: &str =
    "places?select=*,territory:territories!places_territory_id_fkey(name)&order=name";

#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("could not decode {url}: {message}")]
    Decode { url: String, message: String },
}

/// Immutable snapshots for one mount. `None` until the matching fetch succeeds.
#[derive(Clone, Copy)]
pub struct MapData {
    pub contours: RwSignal<Option<Arc<FeatureCollection>>>,
    pub merged: RwSignal<Option<Arc<FeatureCollection>>>,
    pub clans: RwSignal<Option<Arc<Vec<Clan>>>>,
    pub territories: RwSignal<Option<Arc<Vec<Territory>>>>,
    pub places: RwSignal<Option<Arc<Vec<Place>>>>,
    pub error: RwSignal<Option<String>>,
}

impl MapData {
    pub fn new() -> Self {
        Self {
            contours: RwSignal::new(None),
            merged: RwSignal::new(None),
            clans: RwSignal::new(None),
            territories: RwSignal::new(None),
            places: RwSignal::new(None),
            error: RwSignal::new(None),
        }
    }

    /// True until every source has either arrived or failed.
    pub fn is_loading(&self) -> bool {
        self.error.with(Option::is_none)
            && (self.contours.with(Option::is_none)
                || self.merged.with(Option::is_none)
                || self.clans.with(Option::is_none)
                || self.territories.with(Option::is_none)
                || self.places.with(Option::is_none))
    }

    fn settle<T>(&self, target: RwSignal<Option<Arc<T>>>, result: Result<T, LoadError>)
    where
        T: Send + Sync + 'static,
    {
        match result {
            Ok(value) => target.set(Some(Arc::new(value))),
            Err(err) => {
                log::warn(&format!("load: {err}"));
                self.error.set(Some(err.to_string()));
            }
        }
    }
}

fn api_request(config: &MapConfig, url: &str) -> RequestBuilder {
    Request::get(url)
        .header("apikey", &config.api_key)
        .header("Authorization", &format!("Bearer {}", config.api_key))
}

async fn fetch_json<T: DeserializeOwned>(
    request: RequestBuilder,
    url: &str,
) -> Result<T, LoadError> {
    let resp = request.send().await.map_err(|e| LoadError::Transport {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    if !resp.ok() {
        return Err(LoadError::Status {
            url: url.to_string(),
            status: resp.status(),
        });
    }

    resp.json::<T>().await.map_err(|e| LoadError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

pub async fn fetch_geometry(url: &str) -> Result<FeatureCollection, LoadError> {
    fetch_json(Request::get(url), url).await
}

pub async fn fetch_table<T: DeserializeOwned>(
    config: &MapConfig,
    query: &str,
) -> Result<Vec<T>, LoadError> {
    let url = config.table_url(query);
    fetch_json(api_request(config, &url), &url).await
}

/// Set each territory's polygon flag from the merged document.
pub fn mark_polygons(territories: &[Territory], merged: &FeatureCollection) -> Vec<Territory> {
    let ids = merged.territory_ids();
    territories
        .iter()
        .map(|t| Territory {
            has_polygon: ids.contains(t.id.as_str()),
            ..t.clone()
        })
        .collect()
}

/// Start both fetch groups. Results arriving after `alive` drops to false are
/// discarded.
pub fn load(config: MapConfig, data: MapData, alive: Arc<AtomicBool>) {
    let geometry_config = config.clone();
    let geometry_alive = alive.clone();
    spawn_local(async move {
        let (contours, merged) = futures::join!(
            fetch_geometry(&geometry_config.contours_url),
            fetch_geometry(&geometry_config.territories_url),
        );
        if !geometry_alive.load(Ordering::Relaxed) {
            return;
        }
        data.settle(data.contours, contours);
        data.settle(data.merged, merged);
    });

    spawn_local(async move {
        let (clans, territories, places) = futures::join!(
            fetch_table::<Clan>(&config, CLANS_QUERY),
            fetch_table::<Territory>(&config, TERRITORIES_QUERY),
            fetch_table::<Place>(&config, PLACES_QUERY),
        );
        if !alive.load(Ordering::Relaxed) {
            return;
        }
        data.settle(data.clans, clans);
        data.settle(data.territories, territories);
        data.settle(data.places, places);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn queries_order_by_name_and_embed_joins() {
        let config = MapConfig {
            api_url: "https://db.example.org".into(),
            ..MapConfig::default()
        };
        assert_eq!(
            config.table_url(CLANS_QUERY),
            "https://db.example.org/rest/v1/clans?select=*&order=name"
        );
        assert!(TERRITORIES_QUERY.contains("clan:clans!territories_dominant_clan_id_fkey(*)"));
        assert!(PLACES_QUERY.contains("territory:territories!places_territory_id_fkey(name)"));
        for query in [CLANS_QUERY, TERRITORIES_QUERY, PLACES_QUERY] {
            assert!(query.ends_with("&order=name"), "{query}");
        }
    }

    #[test]
    fn polygon_flag_follows_merged_document() {
        let territories: Vec<Territory> = serde_json::from_value(json!([
            { "id": "t1", "name": "Drawn" },
            { "id": "t2", "name": "Off map", "has_polygon": true }
        ]))
        .unwrap();
        let merged: FeatureCollection = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": { "territory_id": "t1" }, "geometry": null },
                { "type": "Feature", "properties": { "territory_id": "ghost" }, "geometry": null }
            ]
        }))
        .unwrap();

        let marked = mark_polygons(&territories, &merged);
        assert!(marked[0].has_polygon);
        assert!(!marked[1].has_polygon);
        assert_eq!(marked.len(), 2);
    }

    #[test]
    fn load_errors_read_as_messages() {
        let err = LoadError::Status {
            url: "/geo/contours.geojson".into(),
            status: 404,
        };
        assert_eq!(err.to_string(), "/geo/contours.geojson answered HTTP 404");
    }
}
