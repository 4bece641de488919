//! Exporter for the capture client's counters.
//!
//! Routes:
//!
//! | Path       | Body                                     |
//! |------------|------------------------------------------|
//! | `/metrics` | Prometheus text exposition               |
//! | `/status`  | last [`MetricsSnapshot`] as JSON         |
//! | `/health`  | `{"status":"ok","camera":"active"}` etc. |

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use thiserror::Error;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

use crate::metrics::{MetricsRegistry, MetricsSnapshot};

const DEFAULT_PORT: u16 = 9090;
const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Exporter failures.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound.
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        /// Address that was requested.
        addr: SocketAddr,
        /// Underlying socket error.
        source: std::io::Error,
    },

    /// Serving failed after binding.
    #[error("exporter stopped: {0}")]
    Serve(#[from] std::io::Error),
}

/// Where the exporter listens. Loopback only; the kiosk is not a server.
#[derive(Debug, Clone)]
pub struct MetricsServerConfig {
    /// Socket address to listen on.
    pub bind_addr: SocketAddr,
}

impl Default for MetricsServerConfig {
    fn default() -> Self {
        Self::with_port(DEFAULT_PORT)
    }
}

impl MetricsServerConfig {
    /// Listens on loopback at `port`.
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: ([127, 0, 0, 1], port).into(),
        }
    }
}

/// Registry plus the snapshot it was last updated from.
pub struct MetricsState {
    registry: MetricsRegistry,
    last: Option<MetricsSnapshot>,
}

impl MetricsState {
    /// Pushes `snapshot` into the registry and keeps it for `/status`.
    pub fn update(&mut self, snapshot: &MetricsSnapshot) {
        self.registry.update(snapshot);
        self.last = Some(snapshot.clone());
    }

    /// The most recent snapshot, if any was pushed.
    pub fn last(&self) -> Option<&MetricsSnapshot> {
        self.last.as_ref()
    }
}

type SharedState = Arc<RwLock<MetricsState>>;

/// Prometheus exporter for a running capture client.
pub struct MetricsServer {
    config: MetricsServerConfig,
    state: SharedState,
}

impl MetricsServer {
    /// Creates an exporter over `registry`.
    pub fn new(config: MetricsServerConfig, registry: MetricsRegistry) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(MetricsState {
                registry,
                last: None,
            })),
        }
    }

    /// Handle the workflow writes snapshots through.
    pub fn state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    fn router(state: SharedState) -> Router {
        Router::new()
            .route("/metrics", get(prometheus_text))
            .route("/status", get(last_snapshot))
            .route("/health", get(health))
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Serves until the task is dropped or the listener fails.
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.bind_addr;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        tracing::info!(%addr, "Metrics exporter listening");
        axum::serve(listener, Self::router(self.state)).await?;
        Ok(())
    }
}

async fn prometheus_text(State(state): State<SharedState>) -> impl IntoResponse {
    match state.read().await.registry.encode() {
        Ok(text) => (StatusCode::OK, [("content-type", PROMETHEUS_CONTENT_TYPE)], text),
        Err(e) => {
            tracing::warn!(error = %e, "Metrics encoding failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain; charset=utf-8")],
                e.to_string(),
            )
        }
    }
}

async fn last_snapshot(State(state): State<SharedState>) -> impl IntoResponse {
    match state.read().await.last() {
        Some(snapshot) => (StatusCode::OK, Json(json!(snapshot))),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "no snapshot yet"})),
        ),
    }
}

async fn health(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let camera = match state.read().await.last() {
        Some(snapshot) if snapshot.session_active => "active",
        Some(_) => "idle",
        None => "unknown",
    };
    Json(json!({"status": "ok", "camera": camera}))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> SharedState {
        MetricsServer::new(MetricsServerConfig::default(), MetricsRegistry::new().unwrap()).state()
    }

    #[test]
    fn test_binds_loopback() {
        let config = MetricsServerConfig::default();
        assert_eq!(config.bind_addr.port(), 9090);
        assert!(config.bind_addr.ip().is_loopback());
        assert_eq!(MetricsServerConfig::with_port(9100).bind_addr.port(), 9100);
    }

    #[tokio::test]
    async fn test_update_reaches_registry_and_status() {
        let state = state();
        assert!(state.read().await.last().is_none());

        state.write().await.update(&MetricsSnapshot {
            session_active: true,
            frames_captured: 3,
            ..Default::default()
        });

        let guard = state.read().await;
        let text = guard.registry.encode().unwrap();
        assert!(text.contains("rollcall_frames_captured_total 3"));
        assert_eq!(guard.last().map(|s| s.frames_captured), Some(3));
    }

    #[tokio::test]
    async fn test_health_reports_camera() {
        let state = state();
        assert_eq!(health(State(state.clone())).await.0["camera"], "unknown");

        state.write().await.update(&MetricsSnapshot {
            session_active: true,
            ..Default::default()
        });
        let body = health(State(state)).await.0;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["camera"], "active");
    }

    #[tokio::test]
    async fn test_bind_conflict_is_reported() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let server = MetricsServer::new(
            MetricsServerConfig::with_port(port),
            MetricsRegistry::new().unwrap(),
        );
        assert!(matches!(server.run().await, Err(ServerError::Bind { .. })));
    }
}
