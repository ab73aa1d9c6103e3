//! HTTP and WebSocket surface.
//!
//! | Route | Serves |
//! |-------|--------|
//! | `GET /` | WebSocket upgrade, otherwise the client page |
//! | `GET /ws` | WebSocket upgrade |
//! | `GET /params` | display parameters for the followed chain |
//! | `GET /blocks.json` | current chain snapshot |
//! | `GET /health` | liveness summary |
//! | `GET /metrics` | Prometheus text format |
//! | anything else | static files from `html_dir` |

use crate::connection::{serve_connection, ConnectionContext};
use crate::domain::{BroadcastError, ServerConfig};
use crate::ports::CatchUpSource;
use crate::registry::SubscriberRegistry;
use axum::{
    extract::{ws::WebSocketUpgrade, ConnectInfo, Request, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use shared_types::NetworkParams;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower::ServiceExt;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SubscriberRegistry>,
    pub catch_up: Arc<dyn CatchUpSource>,
    pub params: NetworkParams,
    pub config: Arc<ServerConfig>,
    pub shutdown: watch::Receiver<bool>,
}

impl AppState {
    pub fn new(
        registry: Arc<SubscriberRegistry>,
        catch_up: Arc<dyn CatchUpSource>,
        params: NetworkParams,
        config: ServerConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            registry,
            catch_up,
            params,
            config: Arc::new(config),
            shutdown,
        }
    }

    fn connection_context(&self) -> ConnectionContext {
        ConnectionContext {
            registry: Arc::clone(&self.registry),
            catch_up: Arc::clone(&self.catch_up),
            config: Arc::clone(&self.config),
            shutdown: self.shutdown.clone(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .route("/", get(root))
        .route("/ws", get(websocket))
        .route("/params", get(params))
        .route("/blocks.json", get(blocks))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .fallback_service(ServeDir::new(&state.config.html_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured address.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, BroadcastError> {
    let addr = config.socket_addr()?;
    Ok(TcpListener::bind(addr).await?)
}

/// Serve until the shutdown flag is raised.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), BroadcastError> {
    let addr = listener.local_addr()?;
    let mut shutdown = state.shutdown.clone();
    info!(addr = %addr, html_dir = %state.config.html_dir.display(), "HTTP server listening");

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = shutdown.wait_for(|stop| *stop).await;
    })
    .await?;

    info!("HTTP server stopped");
    Ok(())
}

fn upgrade(ws: WebSocketUpgrade, state: &AppState, peer: Option<SocketAddr>) -> Response {
    let ctx = state.connection_context();
    ws.on_upgrade(move |socket| serve_connection(socket, ctx, peer))
}

/// The client connects to the page's own path, so `/` does double duty.
async fn root(
    State(state): State<AppState>,
    ws: Option<WebSocketUpgrade>,
    peer: Option<ConnectInfo<SocketAddr>>,
    request: Request,
) -> Response {
    if let Some(ws) = ws {
        return upgrade(ws, &state, peer.map(|ConnectInfo(addr)| addr));
    }
    match ServeDir::new(&state.config.html_dir).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

async fn websocket(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    peer: Option<ConnectInfo<SocketAddr>>,
) -> Response {
    upgrade(ws, &state, peer.map(|ConnectInfo(addr)| addr))
}

async fn params(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.params)
}

async fn blocks(State(state): State<AppState>) -> Response {
    let snapshot = state.catch_up.blocks();
    Json(snapshot.as_ref()).into_response()
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.catch_up.blocks();
    Json(serde_json::json!({
        "status": "healthy",
        "service": "blockclock",
        "version": env!("CARGO_PKG_VERSION"),
        "tip": snapshot.tip().map(|tip| tip.height),
        "blocks": snapshot.len(),
        "subscribers": state.registry.len(),
    }))
}

async fn metrics() -> Response {
    match bc_telemetry::encode_metrics() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
