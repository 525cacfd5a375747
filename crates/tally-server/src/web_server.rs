//! HTTP server for the session: WebSocket endpoint, CSV export, JSON views
//! and the browser frontend.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tokio::sync::Mutex;
use tower_http::services::{ServeDir, ServeFile};

use tally_network::IdentityResolver;
use tally_protocol::DisplayAddress;
use tally_state::{export, Session, SessionHub};

use crate::config::ServerConfig;
use crate::ws_channel::{self, WsChannel};

pub const WEB_ROOT_ENV: &str = "TALLY_WEB_ROOT";

#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<Mutex<SessionHub<WsChannel>>>,
    pub resolver: Arc<dyn IdentityResolver>,
    pub port: u16,
}

pub struct WebServer {
    bind_addr: String,
    state: AppState,
    web_root: PathBuf,
}

impl WebServer {
    pub fn new(
        config: &ServerConfig,
        resolver: Arc<dyn IdentityResolver>,
        addresses: Vec<DisplayAddress>,
    ) -> Self {
        let mut session = Session::new(config.session.name.clone());
        session.set_display_addresses(addresses);

        Self {
            bind_addr: config.listen_addr(),
            state: AppState {
                hub: Arc::new(Mutex::new(SessionHub::new(session))),
                resolver,
                port: config.http.port,
            },
            web_root: detect_web_root(config.http.web_root.as_deref()),
        }
    }

    pub fn router(&self) -> Router {
        let index_file = self.web_root.join("index.html");
        let static_service =
            ServeDir::new(self.web_root.clone()).not_found_service(ServeFile::new(index_file));

        Router::new()
            .route("/ws", get(ws_upgrade))
            .route("/export", get(export_csv))
            .route("/api/health", get(api_health))
            .route("/api/state", get(api_state))
            .route("/api/results", get(api_results))
            .fallback_service(static_service)
            .with_state(self.state.clone())
    }

    pub async fn run(self) -> Result<(), anyhow::Error> {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(&self.bind_addr).await?;
        tracing::info!(
            addr = %self.bind_addr,
            web_root = %self.web_root.display(),
            "Grading session server listening"
        );
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
        Ok(())
    }
}

fn detect_web_root(configured: Option<&Path>) -> PathBuf {
    if let Some(path) = configured {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var(WEB_ROOT_ENV) {
        return PathBuf::from(path);
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let candidates = [
        cwd.join("public"),
        cwd.join("dist"),
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../public"),
    ];

    for c in candidates {
        if c.join("index.html").exists() {
            return c;
        }
    }

    cwd.join("public")
}

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(app): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_channel::run_connection(socket, peer, app))
}

async fn export_csv(State(app): State<AppState>) -> impl IntoResponse {
    let csv = app.hub.lock().await.export_csv();
    let filename = export::export_filename(chrono::Utc::now().date_naive());
    tracing::info!(%filename, bytes = csv.len(), "Results exported");

    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    )
}

async fn api_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"ok": true, "service": "tally-server"}))
}

async fn api_state(State(app): State<AppState>) -> Json<serde_json::Value> {
    let hub = app.hub.lock().await;
    Json(serde_json::json!({
        "state": hub.session().snapshot(),
        "connections": hub.registry().len(),
    }))
}

async fn api_results(State(app): State<AppState>) -> Json<serde_json::Value> {
    let hub = app.hub.lock().await;
    let session = hub.session();
    Json(serde_json::json!({
        "categories": session.categories(),
        "lines": export::aggregate(session.categories(), session.votes()),
    }))
}
