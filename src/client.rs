//! BMKG earthquake API client.
//!
//! Provides blocking HTTP access to the three TEWS report endpoints.
//! Uses reqwest with rustls for TLS.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, instrument};

use crate::errors::GempaError;
use crate::models::{self, Payload};

/// Default request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// User agent string for API requests.
const USER_AGENT: &str = concat!("gempawatch/", env!("CARGO_PKG_VERSION"));

/// BMKG base URL for the TEWS data files.
pub const BMKG_BASE_URL: &str = "https://data.bmkg.go.id/DataMKG/TEWS";

/// The three report feeds, one per dashboard tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    /// Latest M5.0+ events (`gempaterkini.json`)
    Latest,
    /// Recent events felt by people (`gempadirasakan.json`)
    Felt,
    /// The single most recent event (`autogempa.json`)
    Auto,
}

impl ReportKind {
    /// All kinds, in tab order.
    pub const ALL: [Self; 3] = [Self::Latest, Self::Felt, Self::Auto];

    /// Short name used in URLs and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::Felt => "felt",
            Self::Auto => "auto",
        }
    }

    /// Upstream file name for this kind.
    #[must_use]
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::Latest => "gempaterkini.json",
            Self::Felt => "gempadirasakan.json",
            Self::Auto => "autogempa.json",
        }
    }

    /// Human-readable tab label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Latest => "Latest",
            Self::Felt => "Felt",
            Self::Auto => "Auto",
        }
    }

    /// Whether this endpoint publishes a list rather than a single report.
    #[must_use]
    pub const fn is_list(self) -> bool {
        matches!(self, Self::Latest | Self::Felt)
    }

    /// Stable slot index, for per-kind bookkeeping arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Latest => 0,
            Self::Felt => 1,
            Self::Auto => 2,
        }
    }
}

impl std::str::FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "latest" | "terkini" => Ok(Self::Latest),
            "felt" | "dirasakan" => Ok(Self::Felt),
            "auto" | "autogempa" => Ok(Self::Auto),
            _ => Err(format!("unknown report kind: {s} (expected: latest, felt, auto)")),
        }
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything that can produce reports for a kind.
///
/// The dashboard only talks to this trait, so tests can swap in canned data.
pub trait ReportSource: Send + Sync {
    /// Fetch the current reports for `kind`.
    ///
    /// Latest and Felt yield [`Payload::List`], Auto yields [`Payload::Single`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body has the wrong shape.
    fn fetch(&self, kind: ReportKind) -> Result<Payload, GempaError>;
}

/// Client for the BMKG TEWS API.
pub struct BmkgClient {
    client: Client,
    base_url: String,
}

impl BmkgClient {
    /// Create a client for `base_url`, normally [`BMKG_BASE_URL`] or a mirror
    /// serving the same files.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn with_base_url(base_url: &str) -> Result<Self, GempaError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Full URL for a kind's endpoint.
    #[must_use]
    pub fn url_for(&self, kind: ReportKind) -> String {
        format!("{}/{}", self.base_url, kind.endpoint())
    }
}

impl ReportSource for BmkgClient {
    #[instrument(skip(self), fields(endpoint = kind.endpoint()))]
    fn fetch(&self, kind: ReportKind) -> Result<Payload, GempaError> {
        let url = self.url_for(kind);

        debug!("fetching reports from {}", url);

        let response = self.client.get(&url).send()?;

        // Check status before parsing
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GempaError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text()?;
        let payload = models::parse_payload(kind, &body)?;

        debug!("fetched {} reports", payload.len());
        Ok(payload)
    }
}
