//! Cluster manager API, run next to the cluster.
//!
//! A relay configured with a manager URL pushes its trusted set here instead
//! of writing the cluster's configuration directly. The manager owns the
//! configuration file and the restart.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::info;

use warden_cluster::{ConfigSurface, RestartTrigger, TrustedPeersBody};
use warden_types::{ClusterPeerId, PeerSet};

use crate::RpcError;

/// State shared by the manager handlers.
pub struct ManagerState {
    surface: Arc<dyn ConfigSurface>,
    restart: Arc<dyn RestartTrigger>,
    /// Serializes updates so two writers never interleave read-compare-write.
    update_lock: Mutex<()>,
    restarts: AtomicU64,
    last_restart_ok: AtomicBool,
}

impl ManagerState {
    pub fn new(surface: Arc<dyn ConfigSurface>, restart: Arc<dyn RestartTrigger>) -> Self {
        Self {
            surface,
            restart,
            update_lock: Mutex::new(()),
            restarts: AtomicU64::new(0),
            last_restart_ok: AtomicBool::new(true),
        }
    }
}

/// The manager API:
/// - `PUT /update-trusted-peers` with `{"trustedPeers": [...]}`
/// - `GET /trusted-peers`
/// - `GET /status`
pub struct ManagerApi {
    pub port: u16,
    pub state: Arc<ManagerState>,
}

impl ManagerApi {
    pub fn new(port: u16, surface: Arc<dyn ConfigSurface>, restart: Arc<dyn RestartTrigger>) -> Self {
        Self {
            port,
            state: Arc::new(ManagerState::new(surface, restart)),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/update-trusted-peers", put(update_trusted_peers))
            .route("/trusted-peers", get(get_trusted_peers))
            .route("/status", get(get_status))
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
        info!(%addr, "cluster manager API listening");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))
    }
}

fn parse_peer_list(body: &[u8]) -> Result<PeerSet, RpcError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| RpcError::InvalidRequest(format!("body is not JSON: {e}")))?;
    let entries = value
        .get("trustedPeers")
        .and_then(Value::as_array)
        .ok_or_else(|| RpcError::InvalidRequest("trustedPeers must be an array".into()))?;

    entries
        .iter()
        .map(|entry| {
            entry
                .as_str()
                .ok_or_else(|| RpcError::InvalidRequest(format!("{entry} is not a peer id")))?
                .parse::<ClusterPeerId>()
                .map_err(|e| RpcError::InvalidRequest(e.to_string()))
        })
        .collect()
}

async fn update_trusted_peers(
    State(state): State<Arc<ManagerState>>,
    body: Bytes,
) -> Result<impl IntoResponse, RpcError> {
    let desired = parse_peer_list(&body)?;
    let _guard = state.update_lock.lock().await;

    let unchanged = match state.surface.trusted_peers().await {
        Ok(current) => current == desired,
        Err(e) => {
            tracing::warn!(error = %e, "current trusted peers unreadable, overwriting");
            false
        }
    };

    if unchanged {
        // The file may already hold this list from a request whose restart
        // failed; the cluster is only up to date once a restart succeeded.
        if state.last_restart_ok.load(Ordering::SeqCst) {
            return Ok((
                StatusCode::OK,
                Json(json!({ "message": "No changes in trusted peers" })),
            ));
        }
        info!(count = desired.len(), "trusted peers unchanged, retrying failed restart");
    } else {
        state.surface.replace_trusted_peers(&desired).await?;
        info!(count = desired.len(), "trusted peers updated, restarting cluster");
    }

    state.restarts.fetch_add(1, Ordering::SeqCst);
    if let Err(e) = state.restart.restart().await {
        state.last_restart_ok.store(false, Ordering::SeqCst);
        return Err(RpcError::Restart(e.to_string()));
    }
    state.last_restart_ok.store(true, Ordering::SeqCst);

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Trusted peers updated and cluster restarted" })),
    ))
}

async fn get_trusted_peers(
    State(state): State<Arc<ManagerState>>,
) -> Result<Json<TrustedPeersBody>, RpcError> {
    let peers = state.surface.trusted_peers().await?;
    Ok(Json(TrustedPeersBody::from_set(&peers)))
}

async fn get_status(State(state): State<Arc<ManagerState>>) -> impl IntoResponse {
    let trusted = state.surface.trusted_peers().await;
    Json(json!({
        "configReadable": trusted.is_ok(),
        "trustedPeers": trusted.map(|p| p.len()).unwrap_or(0),
        "restarts": state.restarts.load(Ordering::SeqCst),
        "lastRestartOk": state.last_restart_ok.load(Ordering::SeqCst),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_array_body_is_rejected() {
        let err = parse_peer_list(br#"{"trustedPeers": "12D3KooW"}"#).unwrap_err();
        assert!(matches!(err, RpcError::InvalidRequest(_)));
        let err = parse_peer_list(br#"{}"#).unwrap_err();
        assert!(matches!(err, RpcError::InvalidRequest(_)));
    }

    #[test]
    fn invalid_entry_is_rejected() {
        let err = parse_peer_list(br#"{"trustedPeers": ["*"]}"#).unwrap_err();
        assert!(matches!(err, RpcError::InvalidRequest(_)));
    }

    #[test]
    fn empty_list_is_accepted() {
        assert!(parse_peer_list(br#"{"trustedPeers": []}"#).unwrap().is_empty());
    }
}
