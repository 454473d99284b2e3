//! HTTP client for the cluster manager API.

use std::time::Duration;

use async_trait::async_trait;

use warden_types::PeerSet;

use crate::{ConfigSurface, SurfaceError, TrustedPeersBody};

/// Default timeout for manager requests. A replace includes the cluster
/// restart on the manager side, so this is generous.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// [`ConfigSurface`] backed by a remote cluster manager.
///
/// `GET {base}/trusted-peers` reads the list, `PUT {base}/update-trusted-peers`
/// replaces it. The manager restarts the cluster itself when the list
/// changes, so callers pair this surface with a no-op restart.
#[derive(Clone)]
pub struct ManagerClient {
    http_client: reqwest::Client,
    base_url: String,
}

fn map_send_error(e: reqwest::Error) -> SurfaceError {
    if e.is_timeout() {
        SurfaceError::Unreachable(format!("request timed out: {e}"))
    } else if e.is_connect() {
        SurfaceError::Unreachable(format!("connection failed: {e}"))
    } else {
        SurfaceError::RequestFailed(e.to_string())
    }
}

impl ManagerClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SurfaceError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SurfaceError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| SurfaceError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ConfigSurface for ManagerClient {
    async fn trusted_peers(&self) -> Result<PeerSet, SurfaceError> {
        let url = format!("{}/trusted-peers", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(map_send_error)?;

        if !response.status().is_success() {
            return Err(SurfaceError::RequestFailed(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        let body: TrustedPeersBody = response.json().await.map_err(|e| {
            SurfaceError::InvalidResponse(format!("failed to parse trusted peers: {e}"))
        })?;
        Ok(body.into_set())
    }

    async fn replace_trusted_peers(&self, peers: &PeerSet) -> Result<(), SurfaceError> {
        let url = format!("{}/update-trusted-peers", self.base_url);
        let body = TrustedPeersBody::from_set(peers);
        let response = self
            .http_client
            .put(&url)
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(SurfaceError::RequestFailed(format!(
                "HTTP status {status}: {detail}"
            )));
        }
        tracing::info!(manager = %self.base_url, count = peers.len(), "pushed trusted peers to cluster manager");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ManagerClient::new("http://127.0.0.1:8080/").unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:8080");
    }

    #[tokio::test]
    async fn unreachable_manager_maps_to_surface_error() {
        let client =
            ManagerClient::with_timeout("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let err = client.trusted_peers().await.unwrap_err();
        assert!(matches!(
            err,
            SurfaceError::Unreachable(_) | SurfaceError::RequestFailed(_)
        ));
    }
}
