use nocturne_shared::LatLng;

/// Endpoints the map loads from. Overridable at build time through env vars.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    /// Base URL of the relational read API (PostgREST style).
    pub api_url: String,
    pub api_key: String,
    /// Fine-grained contour outlines.
    pub contours_url: String,
    /// One merged feature per territory.
    pub territories_url: String,
    /// Place photos live at `{bucket}/{place_id}{n}.jpg`.
    pub image_bucket_url: String,
}

const DEFAULT_API_URL: &str = "http://localhost:54321";
const DEFAULT_API_KEY: &str = "";
const DEFAULT_CONTOURS_URL: &str = "/geo/contours.geojson";
const DEFAULT_TERRITORIES_URL: &str = "/geo/territories.geojson";
const DEFAULT_IMAGE_BUCKET_URL: &str = "/images/places";

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            api_url: option_env!("NOCTURNE_API_URL")
                .unwrap_or(DEFAULT_API_URL)
                .to_string(),
            api_key: option_env!("NOCTURNE_API_KEY")
                .unwrap_or(DEFAULT_API_KEY)
                .to_string(),
            contours_url: option_env!("NOCTURNE_CONTOURS_URL")
                .unwrap_or(DEFAULT_CONTOURS_URL)
                .to_string(),
            territories_url: option_env!("NOCTURNE_TERRITORIES_URL")
                .unwrap_or(DEFAULT_TERRITORIES_URL)
                .to_string(),
            image_bucket_url: option_env!("NOCTURNE_IMAGE_BUCKET_URL")
                .unwrap_or(DEFAULT_IMAGE_BUCKET_URL)
                .to_string(),
        }
    }
}

impl MapConfig {
    /// `{api_url}/rest/v1/{path_and_query}`, tolerant of a trailing slash on the base.
    pub fn table_url(&self, path_and_query: &str) -> String {
        format!("{}/rest/v1/{path_and_query}", self.api_url.trim_end_matches('/'))
    }

    pub fn place_image_url(&self, place_id: &str, index: u8) -> String {
        format!(
            "{}/{place_id}{index}.jpg",
            self.image_bucket_url.trim_end_matches('/')
        )
    }
}

// Initial camera.
pub const INITIAL_CENTER: LatLng = LatLng {
    lat: 48.8566,
    lng: 2.3522,
};
pub const INITIAL_ZOOM: f64 = 11.0;
pub const MIN_ZOOM: f64 = 10.0;
pub const MAX_ZOOM: f64 = 16.0;

// Base raster layer.
pub const TILE_URL: &str = "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}{r}.png";
pub const TILE_SUBDOMAINS: &str = "abcd";
pub const TILE_MAX_ZOOM: f64 = 20.0;
pub const TILE_ATTRIBUTION: &str = "&copy; OpenStreetMap &copy; CARTO";

// Container acquisition.
pub const ACQUIRE_FIRST_DELAY_MS: u32 = 100;
pub const ACQUIRE_RETRY_MS: u32 = 50;

// Camera flights.
pub const PLACE_FLIGHT_ZOOM: f64 = 15.0;
pub const PLACE_FLIGHT_SECS: f64 = 0.8;
pub const TERRITORY_FLIGHT_SECS: f64 = 0.9;
pub const TERRITORY_FLIGHT_PADDING_PX: f64 = 60.0;

// Follow-ups.
pub const POPUP_SETTLE_MS: u32 = 900;
pub const PULSE_REVERT_MS: u32 = 1_800;
pub const CLOSE_POPUPS_MS: u32 = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_url_joins_without_double_slash() {
        let config = MapConfig {
            api_url: "https://db.example.org/".into(),
            ..MapConfig::default()
        };
        assert_eq!(
            config.table_url("clans?select=*"),
            "https://db.example.org/rest/v1/clans?select=*"
        );
    }

    #[test]
    fn place_image_url_appends_index() {
        let config = MapConfig {
            image_bucket_url: "https://cdn.example.org/places/".into(),
            ..MapConfig::default()
        };
        assert_eq!(
            config.place_image_url("opera", 2),
            "https://cdn.example.org/places/opera2.jpg"
        );
    }
}
