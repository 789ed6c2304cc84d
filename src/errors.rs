//! Error types for gempawatch.
//!
//! Uses `thiserror` for library-style error definitions.

use thiserror::Error;

/// Errors that can occur while fetching or interpreting BMKG reports.
#[derive(Error, Debug)]
pub enum GempaError {
    /// HTTP request failed (DNS, timeout, connection refused)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Body was not valid JSON
    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// API returned an error status
    #[error("BMKG API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// JSON was valid but did not have the expected report shape
    #[error("Malformed upstream payload: {0}")]
    MalformedPayload(String),

    /// Coordinate text is not a usable "lat,lng" pair
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),
}
