//! Terminal output formatters for earthquake reports.
//!
//! Supports human-readable (with colors), JSON, and NDJSON formats.

use std::io::{self, Write};

use crate::models::{EarthquakeReport, OutputReport};

// ANSI color codes
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

// Magnitude-based colors
const RED: &str = "\x1b[91m"; // Critical: mag >= 7.0
const YELLOW: &str = "\x1b[93m"; // Warning: mag >= 6.0
const CYAN: &str = "\x1b[96m"; // Significant: mag >= 4.5
const GREEN: &str = "\x1b[92m"; // Moderate: mag >= 3.0
const WHITE: &str = "\x1b[97m"; // Minor: mag < 3.0

const ICON_QUAKE: &str = "🌍";
const ICON_FELT: &str = "👥";

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Human-readable terminal output (default)
    #[default]
    Human,
    /// JSON array
    Json,
    /// Newline-delimited JSON (one object per line)
    Ndjson,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "ndjson" => Ok(Self::Ndjson),
            _ => Err(format!("unknown format: {s} (expected: human, json, ndjson)")),
        }
    }
}

/// Get the color code for a magnitude value.
fn magnitude_color(mag: Option<f64>) -> &'static str {
    match mag {
        Some(m) if m >= 7.0 => RED,
        Some(m) if m >= 6.0 => YELLOW,
        Some(m) if m >= 4.5 => CYAN,
        Some(m) if m >= 3.0 => GREEN,
        _ => WHITE,
    }
}

/// Get severity label for magnitude.
fn magnitude_label(mag: Option<f64>) -> &'static str {
    match mag {
        Some(m) if m >= 7.0 => "MAJOR",
        Some(m) if m >= 6.0 => "STRONG",
        Some(m) if m >= 4.5 => "MODERATE",
        Some(m) if m >= 3.0 => "LIGHT",
        Some(m) if m >= 2.0 => "MINOR",
        _ => "MICRO",
    }
}

/// Write reports in human-readable format.
///
/// One line per report, plus an indented felt line when the report has one.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human<W: Write>(writer: &mut W, reports: &[EarthquakeReport]) -> io::Result<()> {
    for report in reports {
        let mag = report.magnitude_value();
        let color = magnitude_color(mag);
        let label = magnitude_label(mag);
        let potential = report.potential.as_deref().unwrap_or("-");

        writeln!(
            writer,
            "{ICON_QUAKE} {color}{BOLD}M{mag_str}{RESET} │ \
             {color}{label:8}{RESET} │ \
             {DIM}{depth:>7}{RESET} │ \
             {date} {time} │ \
             {DIM}{coords}{RESET} │ \
             {region} {DIM}({potential}){RESET}",
            mag_str = report.magnitude,
            depth = report.depth,
            date = report.date,
            time = report.time,
            coords = report.coordinates,
            region = report.region,
        )?;

        if let Some(felt) = report.felt_text() {
            writeln!(writer, "   {ICON_FELT} {DIM}Felt:{RESET} {felt}")?;
        }
    }
    Ok(())
}

/// Write reports as a JSON array.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write>(writer: &mut W, reports: &[EarthquakeReport]) -> io::Result<()> {
    let output: Vec<OutputReport> = reports.iter().map(OutputReport::from).collect();
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{json}")
}

/// Write reports as newline-delimited JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_ndjson<W: Write>(writer: &mut W, reports: &[EarthquakeReport]) -> io::Result<()> {
    for report in reports {
        let output = OutputReport::from(report);
        let json = serde_json::to_string(&output)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writeln!(writer, "{json}")?;
    }
    Ok(())
}

/// Write reports in the specified format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_reports<W: Write>(
    writer: &mut W,
    reports: &[EarthquakeReport],
    format: Format,
) -> io::Result<()> {
    match format {
        Format::Human => write_human(writer, reports),
        Format::Json => write_json(writer, reports),
        Format::Ndjson => write_ndjson(writer, reports),
    }
}
