//! Selection-driven map panel.
//!
//! The map mirrors the dashboard's selection slot. Coordinates are validated
//! before anything reaches Leaflet; a report whose coordinate text does not
//! parse gets an explanatory panel instead of a marker.

use crate::cards::escape_html;
use crate::models::{EarthquakeReport, LatLng};

/// Zoom level the map opens at.
pub const MAP_ZOOM: u8 = 6;

/// Fixed panel height in pixels, shared by every map state.
pub const MAP_HEIGHT_PX: u32 = 400;

/// Shown until a card has been selected.
pub const PLACEHOLDER_MESSAGE: &str = "Select an earthquake to view on the map";

/// Popup contents for the marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Popup {
    pub region: String,
    pub magnitude: String,
    pub depth: String,
}

/// What the map panel should show.
#[derive(Debug, Clone, PartialEq)]
pub enum MapView {
    /// Nothing selected yet
    Placeholder,
    /// Selected report with a usable position
    Marker {
        center: LatLng,
        marker: LatLng,
        zoom: u8,
        popup: Popup,
    },
    /// Selected report whose coordinates could not be parsed
    InvalidCoordinates { region: String, reason: String },
}

impl MapView {
    /// Derive the map state from the current selection.
    #[must_use]
    pub fn for_selection(selected: Option<&EarthquakeReport>) -> Self {
        let Some(report) = selected else {
            return Self::Placeholder;
        };

        match report.position() {
            Ok(position) => Self::Marker {
                center: position,
                marker: position,
                zoom: MAP_ZOOM,
                popup: Popup {
                    region: report.region.clone(),
                    magnitude: report.magnitude.clone(),
                    depth: report.depth.clone(),
                },
            },
            Err(e) => {
                tracing::warn!(region = %report.region, coordinates = %report.coordinates, "{e}");
                Self::InvalidCoordinates {
                    region: report.region.clone(),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Render as an HTML fragment for the `#map-panel` container.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Placeholder => format!(
                r#"<div class="map-placeholder" style="height: {MAP_HEIGHT_PX}px">{PLACEHOLDER_MESSAGE}</div>"#
            ),
            Self::InvalidCoordinates { region, reason } => format!(
                r#"<div class="map-placeholder map-invalid" style="height: {MAP_HEIGHT_PX}px">
  <p>Cannot place <strong>{region}</strong> on the map.</p>
  <p class="map-reason">{reason}</p>
</div>"#,
                region = escape_html(region),
                reason = escape_html(reason),
            ),
            Self::Marker {
                center,
                marker,
                zoom,
                popup,
            } => {
                let popup_html = format!(
                    "<div><h3>{}</h3><p>Magnitude: {}</p><p>Depth: {}</p></div>",
                    escape_html(&popup.region),
                    escape_html(&popup.magnitude),
                    escape_html(&popup.depth),
                );
                // Popup HTML goes through JSON so it is a valid JS string literal.
                let popup_js = serde_json::to_string(&popup_html)
                    .unwrap_or_else(|_| "\"\"".to_string());

                format!(
                    r#"<div id="quake-map" class="quake-map" style="height: {MAP_HEIGHT_PX}px; width: 100%"
     data-lat="{clat}" data-lng="{clng}" data-zoom="{zoom}"></div>
<script>
(function() {{
  var el = document.getElementById('quake-map');
  if (!el || el._leaflet_id) return;
  var map = L.map(el).setView([{clat}, {clng}], {zoom});
  L.tileLayer('https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{
    attribution: '&copy; <a href="https://www.openstreetmap.org/copyright">OpenStreetMap</a> contributors'
  }}).addTo(map);
  L.marker([{mlat}, {mlng}]).addTo(map).bindPopup({popup_js});
}})();
</script>"#,
                    clat = center.lat,
                    clng = center.lng,
                    mlat = marker.lat,
                    mlng = marker.lng,
                )
            }
        }
    }
}
