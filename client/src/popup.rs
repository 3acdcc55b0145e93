//! Popup markup handed to the engine as raw strings.
//!
//! Actions inside the markup call the functions published by `bridge`.

use nocturne_shared::{Clan, Place, Territory};

use crate::bridge::{OPEN_PLACE_DETAIL_FN, OPEN_TERRITORY_DETAIL_FN};

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// A single-quoted JS string literal, safe inside a double-quoted HTML attribute.
fn js_string_arg(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('\'');
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            _ => escaped.push(ch),
        }
    }
    escaped.push('\'');
    escape_html(&escaped)
}

pub fn wealth_stars(stars: u8) -> String {
    let filled = usize::from(stars.min(5));
    format!("{}{}", "\u{2605}".repeat(filled), "\u{2606}".repeat(5 - filled))
}

fn header(name: &str, color: &str, sub: &str) -> String {
    format!(
        r#"<div class="lmp-header" style="border-left:3px solid {color};padding-left:10px"><div class="lmp-nom" style="color:{color}">{name}</div><div class="lmp-sub">{sub}</div></div>"#,
        name = escape_html(name),
    )
}

fn with_secondary(primary: &str, secondary: Option<&str>) -> String {
    let mut sub = format!(r#"<span class="lmp-clan">{}</span>"#, escape_html(primary));
    if let Some(secondary) = secondary.filter(|s| !s.is_empty()) {
        sub.push_str(&format!(
            r#"<span class="lmp-dot">&middot;</span><span class="lmp-statut">{}</span>"#,
            escape_html(secondary)
        ));
    }
    sub
}

fn action_button(color: &str, function: &str, id: &str) -> String {
    format!(
        r#"<button class="lmp-cta" style="border-color:{color};color:{color}" onclick="window.{function}({arg})">View sheet &rarr;</button>"#,
        arg = js_string_arg(id),
    )
}

pub fn territory_popup_html(territory: &Territory, clan: Option<&Clan>, color: &str) -> String {
    let color = &escape_html(color);
    let clan_name = clan.map(|c| c.name.as_str()).unwrap_or("Unknown");
    let mut html = format!(r#"<div class="lmp-root" style="--pc:{color}">"#);
    html.push_str(&header(
        &territory.name,
        color,
        &with_secondary(clan_name, territory.governor.as_deref()),
    ));
    if let Some(ambiance) = territory.description.ambiance.as_deref() {
        html.push_str(&format!(
            r#"<p style="margin:8px 0 4px;font-style:italic;font-size:0.85rem;color:#c8b89a">{}</p>"#,
            escape_html(ambiance)
        ));
    }
    if let Some(stars) = territory.description.wealth_stars() {
        html.push_str(&format!(
            r#"<p style="margin:4px 0 8px;font-size:0.8rem;color:#b09030">{}</p>"#,
            wealth_stars(stars)
        ));
    }
    html.push_str(&action_button(color, OPEN_TERRITORY_DETAIL_FN, &territory.id));
    html.push_str("</div>");
    html
}

pub fn place_popup_html(place: &Place, clan: Option<&Clan>, color: &str) -> String {
    let color = &escape_html(color);
    let clan_name = clan.map(|c| c.name.as_str()).unwrap_or("");
    let mut html = format!(r#"<div class="lmp-root" style="--pc:{color}">"#);
    html.push_str(&header(
        &place.name,
        color,
        &with_secondary(clan_name, place.status.as_deref()),
    ));
    html.push_str(&action_button(color, OPEN_PLACE_DETAIL_FN, &place.id));
    html.push_str("</div>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn escape_html_neutralizes_markup() {
        assert_eq!(
            escape_html(r#"<b onclick="x">'&'</b>"#),
            "&lt;b onclick=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn js_argument_cannot_break_out_of_the_attribute() {
        let arg = js_string_arg(r#"a'b"c"#);
        assert_eq!(arg, r#"&#39;a\&#39;b&quot;c&#39;"#);
    }

    #[test]
    fn wealth_stars_fill_out_of_five() {
        assert_eq!(wealth_stars(3), "\u{2605}\u{2605}\u{2605}\u{2606}\u{2606}");
        assert_eq!(wealth_stars(9).chars().filter(|c| *c == '\u{2605}').count(), 5);
    }

    #[test]
    fn territory_popup_carries_summary_and_detail_action() {
        let territory: Territory = serde_json::from_value(json!({
            "id": "marais",
            "name": "Le Marais",
            "dominant_clan_id": "alpha",
            "governor": "Anne",
            "description": { "ambiance": "Fog", "wealth": 2 }
        }))
        .unwrap();
        let clan = Clan {
            id: "alpha".into(),
            name: "Alpha".into(),
            color: Some("#ff0000".into()),
        };

        let html = territory_popup_html(&territory, Some(&clan), "#ff0000");
        assert!(html.contains("Le Marais"));
        assert!(html.contains("Alpha"));
        assert!(html.contains("Anne"));
        assert!(html.contains("Fog"));
        assert!(html.contains(&wealth_stars(2)));
        assert!(html.contains(&format!("window.{OPEN_TERRITORY_DETAIL_FN}(&#39;marais&#39;)")));
    }

    #[test]
    fn hostile_color_cannot_open_new_attributes() {
        let territory: Territory =
            serde_json::from_value(json!({ "id": "t1", "name": "T1" })).unwrap();
        let html = territory_popup_html(&territory, None, r#"red" onmouseover="alert(1)"#);
        assert!(!html.contains(r#"" onmouseover=""#));
        assert!(html.contains(r#"style="--pc:red&quot; onmouseover=&quot;alert(1)">"#));

        let place: Place = serde_json::from_value(json!({ "id": "p1", "name": "P1" })).unwrap();
        let html = place_popup_html(&place, None, r#"#fff"><script>x</script>"#);
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn place_popup_opens_place_detail() {
        let place: Place = serde_json::from_value(json!({
            "id": "opera",
            "name": "Opera <Garnier>",
            "status": "Sanctuary"
        }))
        .unwrap();

        let html = place_popup_html(&place, None, "#d4af37");
        assert!(html.contains("Opera &lt;Garnier&gt;"));
        assert!(html.contains("Sanctuary"));
        assert!(html.contains(&format!("window.{OPEN_PLACE_DETAIL_FN}(&#39;opera&#39;)")));
    }
}
