use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use arena_telemetry::MetricsRecorder;

use crate::bus::MatchPublisher;
use crate::connection::{self, ConnId, ConnectQuery, ConnectionEvent};
use crate::dispatcher::Dispatcher;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Outbound frames buffered per connection before events get dropped.
    pub max_send_queue: usize,
    /// Directory of static front-end assets, served at `/`.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_send_queue: 256,
            static_dir: None,
        }
    }
}

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    events: mpsc::Sender<ConnectionEvent>,
    metrics: Arc<MetricsRecorder>,
    max_send_queue: usize,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState, static_dir: Option<&Path>) -> Router {
    let mut router = Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(state);
    if let Some(dir) = static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }
    router.layer(CorsLayer::permissive())
}

/// Create and start the server. The returned handle keeps the dispatcher and
/// listener tasks alive.
pub async fn start(
    config: ServerConfig,
    publisher: Arc<dyn MatchPublisher>,
    metrics: Arc<MetricsRecorder>,
) -> Result<ServerHandle, std::io::Error> {
    let (events_tx, events_rx) = mpsc::channel::<ConnectionEvent>(1024);

    let dispatcher = Dispatcher::new(publisher, Arc::clone(&metrics));
    let dispatcher_handle = dispatcher.spawn(events_rx);

    let state = AppState {
        events: events_tx,
        metrics,
        max_send_queue: config.max_send_queue,
    };
    let router = build_router(state, config.static_dir.as_deref());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(addr = %local_addr, "arena server started");

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    Ok(ServerHandle {
        port: local_addr.port(),
        _server: server_handle,
        _dispatcher: dispatcher_handle,
    })
}

/// Handle returned by `start()` — keeps background tasks alive.
pub struct ServerHandle {
    pub port: u16,
    _server: tokio::task::JoinHandle<()>,
    _dispatcher: tokio::task::JoinHandle<()>,
}

/// WebSocket upgrade handler. The identity binding comes from the query
/// string; a request without a usable identity is refused outright.
async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<ConnectQuery>,
    State(state): State<AppState>,
) -> Response {
    let Some((player, name)) = query.into_binding() else {
        return (StatusCode::BAD_REQUEST, "missing or invalid identity").into_response();
    };
    ws.on_upgrade(move |socket| {
        connection::handle_connection(
            socket,
            ConnId::new(),
            player,
            name,
            state.events,
            state.max_send_queue,
        )
    })
    .into_response()
}

/// Health check HTTP endpoint.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "healthy",
        "connectedPlayers": state.metrics.gauge("connected_players"),
    }))
}
