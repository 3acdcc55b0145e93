/// Fill/stroke for territories whose dominant clan is unknown or has no color.
pub const NEUTRAL_GRAY: &str = "#cccccc";

/// Marker and badge color for places whose clan is unknown or has no color.
pub const PLACE_GOLD: &str = "#d4af37";

/// Pick a record's color, falling back when it is missing or not a hex color.
/// The result is safe to splice into markup.
pub fn resolve_color<'a>(color: Option<&'a str>, fallback: &'a str) -> &'a str {
    match color.map(str::trim) {
        Some(c) if parse_hex(c).is_some() => c,
        _ => fallback,
    }
}

/// Parse `#rgb` or `#rrggbb` into (r, g, b).
pub fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        3 => {
            let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
            Some((digit(0)?, digit(1)?, digit(2)?))
        }
        6 => {
            let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            Some((byte(0)?, byte(2)?, byte(4)?))
        }
        _ => None,
    }
}

/// Format RGBA as a CSS color string.
pub fn rgba_css(r: u8, g: u8, b: u8, a: f64) -> String {
    format!("rgba({r},{g},{b},{a})")
}

/// Translucent variant of a CSS color. Non-hex colors are returned unchanged.
pub fn with_alpha(color: &str, a: f64) -> String {
    match parse_hex(color) {
        Some((r, g, b)) => rgba_css(r, g, b, a),
        None => color.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_color_falls_back_on_missing_or_blank() {
        assert_eq!(resolve_color(Some("#ff0000"), NEUTRAL_GRAY), "#ff0000");
        assert_eq!(resolve_color(Some("  "), NEUTRAL_GRAY), NEUTRAL_GRAY);
        assert_eq!(resolve_color(None, PLACE_GOLD), PLACE_GOLD);
        assert_eq!(resolve_color(Some(" #0f0 "), NEUTRAL_GRAY), "#0f0");
    }

    #[test]
    fn resolve_color_rejects_non_hex_values() {
        assert_eq!(resolve_color(Some("crimson"), NEUTRAL_GRAY), NEUTRAL_GRAY);
        assert_eq!(
            resolve_color(Some(r#"red" onmouseover="alert(1)"#), PLACE_GOLD),
            PLACE_GOLD
        );
        assert_eq!(resolve_color(Some("#ff0000;x:y"), NEUTRAL_GRAY), NEUTRAL_GRAY);
    }

    #[test]
    fn parse_hex_accepts_short_and_long_forms() {
        assert_eq!(parse_hex("#ff0000"), Some((255, 0, 0)));
        assert_eq!(parse_hex("#d4af37"), Some((212, 175, 55)));
        assert_eq!(parse_hex("#fff"), Some((255, 255, 255)));
        assert_eq!(parse_hex("#0f0"), Some((0, 255, 0)));
    }

    #[test]
    fn parse_hex_rejects_garbage() {
        assert_eq!(parse_hex("ff0000"), None);
        assert_eq!(parse_hex("#ff00"), None);
        assert_eq!(parse_hex("#gg0000"), None);
        assert_eq!(parse_hex("#éé"), None);
    }

    #[test]
    fn with_alpha_only_rewrites_hex() {
        assert_eq!(with_alpha("#ff0000", 0.2), "rgba(255,0,0,0.2)");
        assert_eq!(with_alpha("crimson", 0.2), "crimson");
    }
}
