//! List renderers for the three report tabs.
//!
//! Each report becomes one clickable card. Cards post their tab, position,
//! and the slot revision they were rendered from, so the server can resolve
//! a click to exactly the record that was on screen.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::client::ReportKind;
use crate::dashboard::Dashboard;
use crate::models::EarthquakeReport;

/// Where shakemap images are published.
const SHAKEMAP_BASE_URL: &str = "https://data.bmkg.go.id/DataMKG/TEWS";

/// Shown for a list tab whose slot is empty.
pub const EMPTY_LIST_MESSAGE: &str = "No earthquake reports yet.";

/// Shown on the Auto tab until its first report arrives.
pub const AUTO_LOADING_MESSAGE: &str = "Loading auto gempa data...";

/// Escape text for safe inclusion in HTML content and attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Panel heading for a tab.
#[must_use]
pub const fn panel_title(kind: ReportKind) -> &'static str {
    match kind {
        ReportKind::Latest => "Latest Earthquakes",
        ReportKind::Felt => "Felt Earthquakes",
        ReportKind::Auto => "Auto Gempa",
    }
}

/// CSS class for a magnitude value.
fn severity_class(mag: Option<f64>) -> &'static str {
    match mag {
        Some(m) if m >= 7.0 => "severity-critical",
        Some(m) if m >= 6.0 => "severity-major",
        Some(m) if m >= 4.5 => "severity-moderate",
        Some(m) if m >= 3.0 => "severity-light",
        _ => "severity-minor",
    }
}

/// Relative time (e.g., "2 hr ago")
fn relative_time(t: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(t);
    if diff.num_hours() < 1 {
        format!("{} min ago", diff.num_minutes().max(1))
    } else if diff.num_hours() < 24 {
        format!("{} hr ago", diff.num_hours())
    } else {
        format!("{} days ago", diff.num_days())
    }
}

/// Render one report card.
#[must_use]
pub fn render_card(
    report: &EarthquakeReport,
    tab: ReportKind,
    index: usize,
    revision: u64,
    now: DateTime<Utc>,
) -> String {
    let mut html = String::new();

    let _ = write!(
        html,
        r##"<div class="quake-card {severity}" hx-post="/select/{tab}/{index}?rev={revision}" hx-target="#map-panel" hx-swap="innerHTML">
  <h3 class="card-title">{region}</h3>
  <dl class="card-fields">"##,
        severity = severity_class(report.magnitude_value()),
        tab = tab.as_str(),
        region = escape_html(&report.region),
    );

    let potential = report.potential.as_deref().unwrap_or("-");
    for (label, value) in [
        ("Magnitude", report.magnitude.as_str()),
        ("Depth", report.depth.as_str()),
        ("Date", report.date.as_str()),
        ("Time", report.time.as_str()),
        ("Coordinates", report.coordinates.as_str()),
        ("Potential", potential),
    ] {
        let _ = write!(
            html,
            "\n    <div><dt>{label}</dt><dd>{}</dd></div>",
            escape_html(value)
        );
    }
    html.push_str("\n  </dl>");

    if let Some(felt) = report.felt_text() {
        let _ = write!(
            html,
            "\n  <p class=\"card-felt\"><strong>Felt:</strong> {}</p>",
            escape_html(felt)
        );
    }

    let mut extras = Vec::new();
    if let Some(issued) = report.issued_at() {
        extras.push(format!(
            r#"<span class="card-age">◷ {}</span>"#,
            relative_time(issued, now)
        ));
    }
    if let Some(shakemap) = report.shakemap.as_deref().filter(|s| !s.trim().is_empty()) {
        extras.push(format!(
            r#"<a class="card-shakemap" href="{SHAKEMAP_BASE_URL}/{}" target="_blank" rel="noopener">Shakemap</a>"#,
            escape_html(shakemap.trim())
        ));
    }
    if !extras.is_empty() {
        let _ = write!(html, "\n  <div class=\"card-extra\">{}</div>", extras.join(" "));
    }

    html.push_str("\n</div>");
    html
}

/// Render the active tab's panel: heading plus its cards.
#[must_use]
pub fn render_panel(dashboard: &Dashboard, now: DateTime<Utc>) -> String {
    let tab = dashboard.active_tab();
    let reports = dashboard.state().reports(tab);
    let revision = dashboard.revision(tab);

    let mut html = format!(
        "<h2 class=\"panel-title\">{}</h2>\n",
        panel_title(tab)
    );

    if reports.is_empty() {
        let message = if tab.is_list() {
            EMPTY_LIST_MESSAGE
        } else {
            AUTO_LOADING_MESSAGE
        };
        let _ = write!(html, "<p class=\"empty-state\">{message}</p>");
        return html;
    }

    html.push_str("<div class=\"card-list\">\n");
    for (index, report) in reports.iter().enumerate() {
        html.push_str(&render_card(report, tab, index, revision, now));
        html.push('\n');
    }
    html.push_str("</div>");
    html
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::{self, Payload, fixtures};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 6, 0, 0).single().expect("valid")
    }

    fn mounted_with(kind: ReportKind, payload: Payload) -> Dashboard {
        let (mut dashboard, first) = Dashboard::mounted();
        let ticket = dashboard.activate(kind).unwrap_or(first);
        dashboard.commit(ticket, payload);
        dashboard
    }

    #[test]
    fn test_one_card_per_report_in_order() {
        let payload = models::parse_payload(ReportKind::Latest, fixtures::LATEST).expect("latest");
        let regions: Vec<String> = payload
            .clone()
            .into_reports()
            .into_iter()
            .map(|r| escape_html(&r.region))
            .collect();
        let dashboard = mounted_with(ReportKind::Latest, payload);

        let html = render_panel(&dashboard, now());
        assert_eq!(html.matches("class=\"quake-card").count(), regions.len());

        let positions: Vec<usize> = regions
            .iter()
            .map(|r| html.find(r.as_str()).expect("region rendered"))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        for index in 0..regions.len() {
            assert!(html.contains(&format!("/select/latest/{index}?rev=")));
        }
    }

    #[test]
    fn test_empty_list_message() {
        let (dashboard, _) = Dashboard::mounted();
        let html = render_panel(&dashboard, now());
        assert!(html.contains("Latest Earthquakes"));
        assert!(html.contains(EMPTY_LIST_MESSAGE));
        assert!(!html.contains("quake-card"));
    }

    #[test]
    fn test_auto_loading_until_committed() {
        let (mut dashboard, _) = Dashboard::mounted();
        dashboard.activate(ReportKind::Auto);

        let html = render_panel(&dashboard, now());
        assert!(html.contains(AUTO_LOADING_MESSAGE));
        assert!(!html.contains("quake-card"));
    }

    #[test]
    fn test_auto_renders_single_card() {
        let payload = models::parse_payload(ReportKind::Auto, fixtures::AUTO).expect("auto");
        let dashboard = mounted_with(ReportKind::Auto, payload);

        let html = render_panel(&dashboard, now());
        assert_eq!(html.matches("class=\"quake-card").count(), 1);
        assert!(html.contains("/select/auto/0?rev="));
        assert!(html.contains("Shakemap"));
        assert!(!html.contains(AUTO_LOADING_MESSAGE));
    }

    #[test]
    fn test_card_fields() {
        let report = fixtures::report("Laut Banda", "-6.10,129.50");
        let html = render_card(&report, ReportKind::Latest, 2, 7, now());

        assert!(html.contains("<h3 class=\"card-title\">Laut Banda</h3>"));
        assert!(html.contains("<dt>Magnitude</dt><dd>5.0</dd>"));
        assert!(html.contains("<dt>Depth</dt><dd>10 km</dd>"));
        assert!(html.contains("<dt>Date</dt><dd>10 Mei 2024</dd>"));
        assert!(html.contains("<dt>Time</dt><dd>11:12:33 WIB</dd>"));
        assert!(html.contains("<dt>Coordinates</dt><dd>-6.10,129.50</dd>"));
        assert!(html.contains("<dt>Potential</dt><dd>Tidak berpotensi tsunami</dd>"));
        assert!(html.contains("hx-post=\"/select/latest/2?rev=7\""));
        assert!(html.contains("severity-moderate"));
    }

    #[test]
    fn test_missing_potential_shows_dash() {
        let mut report = fixtures::report("Garut", "-7.6,107.8");
        report.potential = None;
        let html = render_card(&report, ReportKind::Felt, 0, 1, now());
        assert!(html.contains("<dt>Potential</dt><dd>-</dd>"));
    }

    #[test]
    fn test_felt_line_absent_and_empty_render_identically() {
        let absent = fixtures::report("Garut", "-7.6,107.8");
        let mut empty = absent.clone();
        empty.felt_reports = Some(String::new());

        let absent_html = render_card(&absent, ReportKind::Felt, 0, 1, now());
        let empty_html = render_card(&empty, ReportKind::Felt, 0, 1, now());

        assert!(!absent_html.contains("Felt:"));
        assert_eq!(absent_html, empty_html);
    }

    #[test]
    fn test_felt_line_present() {
        let mut report = fixtures::report("Garut", "-7.6,107.8");
        report.felt_reports = Some("III Garut".into());
        let html = render_card(&report, ReportKind::Felt, 0, 1, now());
        assert!(html.contains("<p class=\"card-felt\"><strong>Felt:</strong> III Garut</p>"));
    }

    #[test]
    fn test_upstream_text_is_escaped() {
        let report = fixtures::report("<script>alert(1)</script>", "-6,110");
        let html = render_card(&report, ReportKind::Latest, 0, 1, now());
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_relative_time() {
        let t = now() - chrono::Duration::minutes(30);
        assert_eq!(relative_time(t, now()), "30 min ago");
        let t = now() - chrono::Duration::hours(5);
        assert_eq!(relative_time(t, now()), "5 hr ago");
        let t = now() - chrono::Duration::days(3);
        assert_eq!(relative_time(t, now()), "3 days ago");
    }

    #[test]
    fn test_severity_classes() {
        assert_eq!(severity_class(Some(7.2)), "severity-critical");
        assert_eq!(severity_class(Some(5.0)), "severity-moderate");
        assert_eq!(severity_class(None), "severity-minor");
    }
}
