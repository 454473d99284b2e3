//! Axum-based status server.

use std::future::Future;
use std::sync::Arc;

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use prometheus::{Encoder, Registry, TextEncoder};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::info;

use warden_types::ClusterPeerId;

use crate::{NodeStatus, RpcError, StatusBoard};

/// State shared by the status handlers.
pub struct StatusState {
    pub board: Arc<StatusBoard>,
    pub registry: Registry,
}

#[derive(Serialize)]
struct TrustedPeersResponse {
    #[serde(rename = "trustedPeers")]
    trusted_peers: Vec<ClusterPeerId>,
}

/// Read-only HTTP view of the relay:
/// - `GET /status`: the latest [`NodeStatus`]
/// - `GET /trusted-peers`: `{"trustedPeers": [...]}`
/// - `GET /metrics`: Prometheus text format
pub struct StatusServer {
    pub port: u16,
    pub state: Arc<StatusState>,
}

impl StatusServer {
    pub fn new(port: u16, board: Arc<StatusBoard>, registry: Registry) -> Self {
        Self {
            port,
            state: Arc::new(StatusState { board, registry }),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/status", get(get_status))
            .route("/trusted-peers", get(get_trusted_peers))
            .route("/metrics", get(get_metrics))
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Serve until `shutdown` resolves.
    pub async fn start(&self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<(), RpcError> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|source| RpcError::Bind {
                addr: addr.clone(),
                source,
            })?;
        info!(%addr, "status server listening");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))
    }
}

async fn get_status(State(state): State<Arc<StatusState>>) -> Json<NodeStatus> {
    Json(state.board.snapshot().await)
}

async fn get_trusted_peers(State(state): State<Arc<StatusState>>) -> impl IntoResponse {
    Json(TrustedPeersResponse {
        trusted_peers: state.board.snapshot().await.trusted_peers,
    })
}

async fn get_metrics(State(state): State<Arc<StatusState>>) -> Result<impl IntoResponse, RpcError> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&state.registry.gather(), &mut buffer)
        .map_err(|e| RpcError::Metrics(e.to_string()))?;
    Ok(([(CONTENT_TYPE, encoder.format_type().to_string())], buffer))
}
