pub mod colors;
pub mod geo;
pub mod model;
pub mod navigation;
pub mod visibility;

pub use colors::{NEUTRAL_GRAY, PLACE_GOLD, resolve_color, with_alpha};
pub use geo::{Feature, FeatureCollection, Geometry, LatLng, LatLngBounds};
pub use model::*;
pub use navigation::{NavigationSlot, NavigationTarget, Ticket};
pub use visibility::Viewer;
