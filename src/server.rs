//! Web server for the gempawatch dashboard.
//!
//! Provides the tabbed earthquake dashboard using:
//! - Axum for HTTP server
//! - SSE (Server-Sent Events) to tell the page a list panel changed
//! - HTMX for tab switching and card selection without custom JavaScript
//! - Leaflet for the selection map
//!
//! The server holds a single dashboard session. Loading `/` re-mounts it,
//! the same way reloading a single-page app resets its state.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        Html, IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio_stream::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, error, info, warn};

use crate::cards::render_panel;
use crate::client::{ReportKind, ReportSource};
use crate::dashboard::{CommitOutcome, Dashboard, FetchTicket, SelectError};
use crate::map::MapView;

/// Buffered refresh signals per SSE subscriber.
const PANEL_CHANNEL_CAPACITY: usize = 16;

/// Refresh signals for one page: the kind whose slot changed.
pub type PanelSignals = Pin<Box<dyn Stream<Item = ReportKind> + Send>>;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The one dashboard session
    dashboard: Arc<Mutex<Dashboard>>,
    /// Where reports come from
    source: Arc<dyn ReportSource>,
    /// Kinds whose slot was committed while their tab was active
    tx: broadcast::Sender<ReportKind>,
}

impl AppState {
    /// Create state around a report source. Nothing is fetched until mount.
    pub fn new(source: Arc<dyn ReportSource>) -> Self {
        let (tx, _rx) = broadcast::channel(PANEL_CHANNEL_CAPACITY);
        Self {
            dashboard: Arc::new(Mutex::new(Dashboard::default())),
            source,
            tx,
        }
    }

    /// Subscribe to panel refresh signals.
    pub fn subscribe(&self) -> broadcast::Receiver<ReportKind> {
        self.tx.subscribe()
    }

    /// Refresh signals for a newly connected page.
    ///
    /// The first item is always the active tab, so a page that read `/panel`
    /// before a commit and connected after it still re-reads the store.
    pub async fn watch_panel(&self) -> PanelSignals {
        let rx = self.subscribe();
        let current = self.dashboard.lock().await.active_tab();
        let updates = BroadcastStream::new(rx).map(move |signal| signal.unwrap_or(current));
        Box::pin(tokio_stream::once(current).chain(updates))
    }

    /// Reset the session and start the initial Latest fetch.
    pub async fn mount(&self) -> JoinHandle<()> {
        let ticket = self.dashboard.lock().await.mount();
        debug!("dashboard mounted");
        self.spawn_fetch(ticket)
    }

    /// Switch tabs, returning the panel to show right away.
    ///
    /// The panel reflects whatever the slot holds now; if a fetch was
    /// started, a refresh signal follows over SSE once it commits.
    pub async fn activate(&self, tab: ReportKind) -> (String, Option<JoinHandle<()>>) {
        let (ticket, panel) = {
            let mut dashboard = self.dashboard.lock().await;
            let ticket = dashboard.activate(tab);
            (ticket, render_panel(&dashboard, Utc::now()))
        };
        (panel, ticket.map(|t| self.spawn_fetch(t)))
    }

    /// Run one fetch in the background and commit its result.
    ///
    /// Failures are logged and leave the slot untouched.
    fn spawn_fetch(&self, ticket: FetchTicket) -> JoinHandle<()> {
        let state = self.clone();
        tokio::spawn(async move {
            let kind = ticket.kind();
            let source = Arc::clone(&state.source);

            let result = match tokio::task::spawn_blocking(move || source.fetch(kind)).await {
                Ok(result) => result,
                Err(e) => {
                    error!(%kind, "fetch task failed: {e}");
                    return;
                }
            };

            let payload = match result {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(%kind, "fetch failed, keeping previous reports: {e}");
                    return;
                }
            };

            let count = payload.len();
            if payload.is_empty() {
                debug!(%kind, seq = ticket.seq(), "source returned no reports");
            }
            let mut dashboard = state.dashboard.lock().await;
            match dashboard.commit(ticket, payload) {
                CommitOutcome::Committed => {
                    info!(%kind, count, "reports updated");
                    // Pages re-read /panel on this signal, so they always
                    // render the tab that is active when they ask.
                    if dashboard.active_tab() == kind {
                        let _ = state.tx.send(kind);
                    }
                }
                CommitOutcome::Superseded => {}
                CommitOutcome::Rejected => {
                    warn!(%kind, "payload shape did not match report kind");
                }
            }
        })
    }
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/panel", get(panel_handler))
        .route("/map", get(map_handler))
        .route("/tabs/{tab}", post(tab_handler))
        .route("/select/{tab}/{index}", post(select_handler))
        .route("/stream", get(sse_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Start the web server.
pub async fn run_server(config: ServerConfig, source: Arc<dyn ReportSource>) -> anyhow::Result<()> {
    let state = AppState::new(source);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("🌍 gempawatch dashboard starting at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Bottom navigation bar; `oob` marks it for an out-of-band HTMX swap.
fn render_nav(active: ReportKind, oob: bool) -> String {
    let mut html = format!(
        r#"<nav id="tab-nav" class="bottom-nav"{}>"#,
        if oob { r#" hx-swap-oob="true""# } else { "" }
    );
    for kind in ReportKind::ALL {
        let icon = match kind {
            ReportKind::Latest => "◷",
            ReportKind::Felt => "∿",
            ReportKind::Auto => "⚡",
        };
        let class = if kind == active { "nav-btn active" } else { "nav-btn" };
        html.push_str(&format!(
            r##"
  <button class="{class}" hx-post="/tabs/{tab}" hx-target="#panel" hx-swap="innerHTML" hx-sync="#panel:replace">
    <span class="nav-icon">{icon}</span><span class="nav-label">{label}</span>
  </button>"##,
            tab = kind.as_str(),
            label = kind.label(),
        ));
    }
    html.push_str("\n</nav>");
    html
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Main page handler. Loading the page re-mounts the dashboard.
async fn index_handler(State(state): State<AppState>) -> Html<String> {
    let _fetch = state.mount().await;
    Html(INDEX_HTML.replace("{{NAV}}", &render_nav(ReportKind::Latest, false)))
}

/// Current list panel for the active tab.
async fn panel_handler(State(state): State<AppState>) -> Html<String> {
    let dashboard = state.dashboard.lock().await;
    Html(render_panel(&dashboard, Utc::now()))
}

/// Current map panel.
async fn map_handler(State(state): State<AppState>) -> Html<String> {
    let dashboard = state.dashboard.lock().await;
    Html(MapView::for_selection(dashboard.state().selected_report.as_ref()).render())
}

/// Tab activation handler.
async fn tab_handler(State(state): State<AppState>, Path(tab): Path<String>) -> Response {
    let tab: ReportKind = match tab.parse() {
        Ok(tab) => tab,
        Err(e) => return (StatusCode::BAD_REQUEST, e).into_response(),
    };

    let (panel, _fetch) = state.activate(tab).await;
    Html(format!("{panel}\n{}", render_nav(tab, true))).into_response()
}

#[derive(Debug, Deserialize)]
struct SelectQuery {
    #[serde(default)]
    rev: u64,
}

/// Card selection handler.
async fn select_handler(
    State(state): State<AppState>,
    Path((tab, index)): Path<(String, usize)>,
    Query(query): Query<SelectQuery>,
) -> Response {
    let tab: ReportKind = match tab.parse() {
        Ok(tab) => tab,
        Err(e) => return (StatusCode::BAD_REQUEST, e).into_response(),
    };

    let mut dashboard = state.dashboard.lock().await;
    match dashboard.select(tab, index, query.rev) {
        Ok(()) => {
            let view = MapView::for_selection(dashboard.state().selected_report.as_ref());
            Html(view.render()).into_response()
        }
        Err(e @ SelectError::OutOfRange { .. }) => {
            debug!(%tab, index, "{e}");
            (StatusCode::NOT_FOUND, e.to_string()).into_response()
        }
        Err(e @ SelectError::Stale { .. }) => {
            debug!(%tab, index, "{e}");
            (StatusCode::CONFLICT, e.to_string()).into_response()
        }
    }
}

/// SSE stream handler for panel refresh signals.
async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = state
        .watch_panel()
        .await
        .map(|kind| Ok(Event::default().event("panel").data(kind.as_str())));

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Health check endpoint.
async fn health_handler() -> &'static str {
    "OK"
}

// ============================================================================
// HTML Template (embedded for single-binary deployment)
// ============================================================================

const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Earthquake Dashboard</title>

    <!-- HTMX + SSE -->
    <script src="https://unpkg.com/htmx.org@1.9.10"></script>
    <script src="https://unpkg.com/htmx.org@1.9.10/dist/ext/sse.js"></script>

    <!-- Leaflet -->
    <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
    <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>

    <style>
        :root {
            --bg: linear-gradient(135deg, #312e81, #581c87);
            --panel: rgba(55, 48, 163, 0.5);
            --card: linear-gradient(90deg, #4338ca, #7e22ce);
            --card-hover: linear-gradient(90deg, #4f46e5, #9333ea);
            --accent: #f472b6;
            --highlight: #fde047;
            --text: #f3f4f6;
            --muted: #9ca3af;
            --radius: 12px;
        }

        * { box-sizing: border-box; }

        body {
            margin: 0;
            min-height: 100vh;
            padding: 16px 16px 96px;
            background: var(--bg);
            color: var(--text);
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
        }

        h1, .panel-title {
            background: linear-gradient(90deg, #ec4899, #eab308);
            -webkit-background-clip: text;
            background-clip: text;
            color: transparent;
        }

        h1 { text-align: center; font-size: 2.25rem; margin: 0 0 24px; }

        .layout {
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(420px, 1fr));
            gap: 24px;
            max-width: 1280px;
            margin: 0 auto;
        }

        .panel {
            background: var(--panel);
            border-radius: var(--radius);
            padding: 24px;
            box-shadow: 0 20px 40px rgba(0, 0, 0, 0.3);
        }

        .panel-title { font-size: 1.75rem; margin: 0 0 16px; }

        .card-list {
            display: flex;
            flex-direction: column;
            gap: 16px;
            max-height: calc(100vh - 350px);
            overflow-y: auto;
            padding-right: 8px;
        }

        .quake-card {
            background: var(--card);
            border-radius: var(--radius);
            padding: 16px;
            cursor: pointer;
            transition: transform 0.15s ease;
            border-left: 4px solid transparent;
        }
        .quake-card:hover { background: var(--card-hover); transform: scale(1.02); }

        .severity-critical { border-left-color: #ef4444; }
        .severity-major { border-left-color: #f97316; }
        .severity-moderate { border-left-color: #06b6d4; }
        .severity-light { border-left-color: #10b981; }
        .severity-minor { border-left-color: #6b7280; }

        .card-title { margin: 0 0 8px; font-size: 1.25rem; }

        .card-fields {
            display: grid;
            grid-template-columns: 1fr 1fr;
            gap: 4px 12px;
            margin: 0;
            font-size: 0.875rem;
        }
        .card-fields div { display: flex; gap: 6px; }
        .card-fields dt { color: var(--accent); font-weight: 600; }
        .card-fields dt::after { content: ':'; }
        .card-fields dd { margin: 0; }

        .card-felt { margin: 8px 0 0; color: var(--highlight); }
        .card-extra { margin-top: 8px; font-size: 0.75rem; color: var(--muted); display: flex; gap: 12px; }
        .card-extra a { color: var(--highlight); }

        .empty-state { font-size: 1.25rem; color: #d1d5db; }

        .map-placeholder {
            display: flex;
            flex-direction: column;
            align-items: center;
            justify-content: center;
            text-align: center;
            background: rgba(67, 56, 202, 0.5);
            border-radius: var(--radius);
            font-size: 1.25rem;
        }
        .map-invalid .map-reason { font-size: 0.875rem; color: var(--muted); }
        .quake-map { border-radius: var(--radius); overflow: hidden; }

        .bottom-nav {
            position: fixed;
            left: 0;
            right: 0;
            bottom: 0;
            display: flex;
            justify-content: space-around;
            padding: 16px;
            background: rgba(49, 46, 129, 0.9);
        }

        .nav-btn {
            display: flex;
            flex-direction: column;
            align-items: center;
            gap: 4px;
            padding: 8px 16px;
            border: none;
            border-radius: 8px;
            background: transparent;
            color: var(--muted);
            cursor: pointer;
            font-size: 0.75rem;
        }
        .nav-btn:hover { color: var(--text); }
        .nav-btn.active { color: #facc15; }
        .nav-icon { font-size: 1.5rem; }
    </style>
</head>
<body>
    <h1>Earthquake Dashboard</h1>

    <div class="layout">
        <section id="panel"
                 class="panel"
                 hx-ext="sse"
                 sse-connect="/stream"
                 hx-get="/panel"
                 hx-trigger="load, sse:panel"
                 hx-swap="innerHTML">
            <p class="empty-state">Loading earthquake reports...</p>
        </section>

        <section class="panel">
            <h2 class="panel-title">Earthquake Map</h2>
            <div id="map-panel" hx-get="/map" hx-trigger="load" hx-swap="innerHTML"></div>
        </section>
    </div>

    {{NAV}}
</body>
</html>
"##;
