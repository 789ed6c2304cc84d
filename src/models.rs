//! Data models for BMKG earthquake API responses.
//!
//! Every endpoint wraps its reports in `{"Infogempa": {"gempa": ...}}`.
//! The list endpoints carry an array, `autogempa.json` a single object.
//! Shapes are checked here, at the boundary, so nothing downstream has to
//! cope with missing fields.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::client::ReportKind;
use crate::errors::GempaError;

/// A single earthquake report as published by BMKG.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EarthquakeReport {
    /// Free-text region description
    #[serde(rename = "Wilayah")]
    pub region: String,

    /// Magnitude as formatted by the source (usually "5.1")
    #[serde(rename = "Magnitude", deserialize_with = "text_or_number")]
    pub magnitude: String,

    /// Depth text, e.g. "10 km"
    #[serde(rename = "Kedalaman")]
    pub depth: String,

    /// Local date text, e.g. "10 Mei 2024"
    #[serde(rename = "Tanggal")]
    pub date: String,

    /// Local time text, e.g. "11:12:33 WIB"
    #[serde(rename = "Jam")]
    pub time: String,

    /// "lat,lng" pair, see [`LatLng`]
    #[serde(rename = "Coordinates")]
    pub coordinates: String,

    /// Tsunami / impact advisory (not published by the felt endpoint)
    #[serde(rename = "Potensi", default)]
    pub potential: Option<String>,

    /// Where the event was felt (felt and auto endpoints only)
    #[serde(rename = "Dirasakan", default)]
    pub felt_reports: Option<String>,

    /// ISO-8601 origin time
    #[serde(rename = "DateTime", default)]
    pub date_time: Option<String>,

    /// Shakemap image file name (auto endpoint only)
    #[serde(rename = "Shakemap", default)]
    pub shakemap: Option<String>,
}

impl EarthquakeReport {
    /// Numeric magnitude, if the source text parses as one.
    #[must_use]
    pub fn magnitude_value(&self) -> Option<f64> {
        self.magnitude.trim().parse::<f64>().ok()
    }

    /// Felt-report text, treating empty or blank text as absent.
    #[must_use]
    pub fn felt_text(&self) -> Option<&str> {
        self.felt_reports
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Origin time, if present and well-formed.
    #[must_use]
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.date_time.as_deref()?;
        DateTime::parse_from_rfc3339(raw.trim())
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Parse the coordinate text into a map position.
    ///
    /// # Errors
    ///
    /// Returns [`GempaError::InvalidCoordinates`] for anything that is not a
    /// pair of in-range numbers.
    pub fn position(&self) -> Result<LatLng, GempaError> {
        self.coordinates.parse()
    }
}

/// Accept `"5.1"` as well as `5.1` for fields BMKG usually sends as text.
fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

/// A validated map position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl FromStr for LatLng {
    type Err = GempaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').collect();
        let [lat, lng] = parts.as_slice() else {
            return Err(GempaError::InvalidCoordinates(format!(
                "expected \"lat,lng\", got {s:?}"
            )));
        };

        let lat = parse_degrees(lat, "latitude")?;
        let lng = parse_degrees(lng, "longitude")?;

        if !(-90.0..=90.0).contains(&lat) {
            return Err(GempaError::InvalidCoordinates(format!(
                "latitude {lat} out of range [-90, 90]"
            )));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(GempaError::InvalidCoordinates(format!(
                "longitude {lng} out of range [-180, 180]"
            )));
        }

        Ok(Self { lat, lng })
    }
}

fn parse_degrees(part: &str, axis: &str) -> Result<f64, GempaError> {
    let value: f64 = part.trim().parse().map_err(|_| {
        GempaError::InvalidCoordinates(format!("{axis} {:?} is not a number", part.trim()))
    })?;
    if !value.is_finite() {
        return Err(GempaError::InvalidCoordinates(format!(
            "{axis} {value} is not finite"
        )));
    }
    Ok(value)
}

/// Decoded body of one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// `gempaterkini.json` and `gempadirasakan.json`
    List(Vec<EarthquakeReport>),
    /// `autogempa.json`
    Single(EarthquakeReport),
}

impl Payload {
    /// Number of reports carried.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::List(reports) => reports.len(),
            Self::Single(_) => 1,
        }
    }

    /// Check if the payload carries no reports.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into a list, in source order.
    #[must_use]
    pub fn into_reports(self) -> Vec<EarthquakeReport> {
        match self {
            Self::List(reports) => reports,
            Self::Single(report) => vec![report],
        }
    }
}

/// Parse a response body for `kind`.
///
/// # Errors
///
/// Returns [`GempaError::Parse`] if the body is not JSON, and
/// [`GempaError::MalformedPayload`] if `Infogempa.gempa` is missing, has the
/// wrong shape for `kind`, or a report lacks a required field.
pub fn parse_payload(kind: ReportKind, body: &str) -> Result<Payload, GempaError> {
    let root: serde_json::Value = serde_json::from_str(body)?;

    let gempa = root
        .get("Infogempa")
        .and_then(|info| info.get("gempa"))
        .ok_or_else(|| {
            GempaError::MalformedPayload(format!(
                "{} response has no Infogempa.gempa field",
                kind.as_str()
            ))
        })?;

    let malformed = |e: serde_json::Error| {
        GempaError::MalformedPayload(format!("{} report: {e}", kind.as_str()))
    };

    if kind.is_list() {
        if !gempa.is_array() {
            return Err(GempaError::MalformedPayload(format!(
                "{} response must carry a list of reports",
                kind.as_str()
            )));
        }
        let reports = Vec::<EarthquakeReport>::deserialize(gempa).map_err(malformed)?;
        Ok(Payload::List(reports))
    } else {
        if !gempa.is_object() {
            return Err(GempaError::MalformedPayload(format!(
                "{} response must carry a single report",
                kind.as_str()
            )));
        }
        let report = EarthquakeReport::deserialize(gempa).map_err(malformed)?;
        Ok(Payload::Single(report))
    }
}

/// Normalized report for JSON/NDJSON output.
#[derive(Debug, Clone, Serialize)]
pub struct OutputReport {
    pub region: String,
    pub magnitude: String,
    pub depth: String,
    pub date: String,
    pub time: String,
    pub issued_at: Option<String>,
    pub coordinates: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub potential: Option<String>,
    pub felt: Option<String>,
}

impl From<&EarthquakeReport> for OutputReport {
    fn from(r: &EarthquakeReport) -> Self {
        let position = r.position().ok();
        Self {
            region: r.region.clone(),
            magnitude: r.magnitude.clone(),
            depth: r.depth.clone(),
            date: r.date.clone(),
            time: r.time.clone(),
            issued_at: r.issued_at().map(|t| t.to_rfc3339()),
            coordinates: r.coordinates.clone(),
            latitude: position.map(|p| p.lat),
            longitude: position.map(|p| p.lng),
            potential: r.potential.clone(),
            felt: r.felt_text().map(str::to_string),
        }
    }
}
