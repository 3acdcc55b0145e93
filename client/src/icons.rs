use nocturne_shared::Place;

use crate::engine::MarkerIcon;
use crate::popup::escape_html;

/// Marker glyph shape for a place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerGlyph {
    /// Sanctuaries: ornamented diamond on a stem.
    Diamond,
    Circle,
}

const POPUP_ANCHOR: (i32, i32) = (0, -38);

impl MarkerGlyph {
    pub fn for_place(place: &Place) -> Self {
        if place.is_sanctuary() {
            Self::Diamond
        } else {
            Self::Circle
        }
    }

    pub const fn size(self) -> (u32, u32) {
        match self {
            Self::Diamond => (30, 38),
            Self::Circle => (24, 34),
        }
    }

    /// Pixel the marker is pinned at: the foot of the stem.
    pub const fn anchor(self) -> (i32, i32) {
        match self {
            Self::Diamond => (15, 36),
            Self::Circle => (12, 32),
        }
    }

    /// CSS class for list swatches mirroring the map glyph.
    pub const fn css_shape(self) -> &'static str {
        match self {
            Self::Diamond => "diamond",
            Self::Circle => "circle",
        }
    }

    pub fn svg(self, color: &str) -> String {
        let color = escape_html(color);
        match self {
            Self::Diamond => format!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="30" height="38" viewBox="0 0 30 38"><ellipse cx="15" cy="36" rx="5" ry="2" fill="rgba(0,0,0,0.5)"/><line x1="15" y1="24" x2="15" y2="34" stroke="{color}" stroke-width="2"/><polygon points="15,2 28,15 15,24 2,15" fill="{color}" stroke="rgba(255,255,255,0.6)" stroke-width="1.5" opacity="0.95"/><circle cx="15" cy="13" r="2.5" fill="rgba(255,255,255,0.45)"/></svg>"#
            ),
            Self::Circle => format!(
                r##"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="34" viewBox="0 0 24 34"><ellipse cx="12" cy="33" rx="4" ry="1.5" fill="rgba(0,0,0,0.5)"/><line x1="12" y1="22" x2="12" y2="31" stroke="{color}" stroke-width="2"/><circle cx="12" cy="12" r="10" fill="{color}" stroke="#1a1215" stroke-width="1.5" opacity="0.95"/><circle cx="12" cy="12" r="6" fill="none" stroke="rgba(255,255,255,0.25)" stroke-width="1"/><circle cx="9.5" cy="9.5" r="2" fill="rgba(255,255,255,0.4)"/></svg>"##
            ),
        }
    }

    pub fn icon(self, color: &str) -> MarkerIcon {
        MarkerIcon {
            html: self.svg(color),
            size: self.size(),
            anchor: self.anchor(),
            popup_anchor: POPUP_ANCHOR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn place(status: Option<&str>) -> Place {
        serde_json::from_value(json!({
            "id": "p1",
            "name": "Opera",
            "latitude": 48.85,
            "longitude": 2.35,
            "status": status,
        }))
        .unwrap()
    }

    #[test]
    fn sanctuary_renders_as_diamond() {
        assert_eq!(MarkerGlyph::for_place(&place(Some("Sanctuary"))), MarkerGlyph::Diamond);
        assert_eq!(MarkerGlyph::for_place(&place(Some("haven"))), MarkerGlyph::Circle);
        assert_eq!(MarkerGlyph::for_place(&place(None)), MarkerGlyph::Circle);
    }

    #[test]
    fn glyph_fill_uses_given_color() {
        let svg = MarkerGlyph::Diamond.svg("#ff0000");
        assert!(svg.contains(r##"<polygon points="15,2 28,15 15,24 2,15" fill="#ff0000""##));
        let svg = MarkerGlyph::Circle.svg("#00ff00");
        assert!(svg.contains(r##"r="10" fill="#00ff00""##));
    }

    #[test]
    fn glyph_color_stays_inside_its_attribute() {
        let svg = MarkerGlyph::Circle.svg(r#"red" onload="alert(1)"#);
        assert!(!svg.contains(r#"" onload=""#));
        assert!(svg.contains("red&quot; onload=&quot;alert(1)"));
    }

    #[test]
    fn icon_geometry_matches_glyph() {
        let icon = MarkerGlyph::Diamond.icon("#fff");
        assert_eq!(icon.size, (30, 38));
        assert_eq!(icon.anchor, (15, 36));
        assert_eq!(icon.popup_anchor, (0, -38));
        let icon = MarkerGlyph::Circle.icon("#fff");
        assert_eq!(icon.size, (24, 34));
        assert_eq!(icon.anchor, (12, 32));
    }
}
