//! `service.json`-backed configuration surface.
//!
//! The cluster keeps its trusted peers at `consensus.crdt.trusted_peers` in
//! its service configuration. Only that key is touched; every other setting
//! is preserved. Writes go to a temporary file in the same directory which
//! is then renamed over the original, so readers never see a partial file.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use warden_types::{ClusterPeerId, PeerSet};

use crate::{ConfigSurface, SurfaceError};

/// A cluster `service.json` on the local filesystem.
#[derive(Clone, Debug)]
pub struct ServiceJsonFile {
    path: PathBuf,
}

impl ServiceJsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(path: &Path) -> Result<Value, SurfaceError> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| SurfaceError::InvalidConfig(format!("{}: {e}", path.display())))
    }

    fn read_peers(path: &Path) -> Result<PeerSet, SurfaceError> {
        let document = Self::read_document(path)?;
        let Some(list) = document.pointer("/consensus/crdt/trusted_peers") else {
            return Ok(PeerSet::new());
        };
        let list = list.as_array().ok_or_else(|| {
            SurfaceError::InvalidConfig("consensus.crdt.trusted_peers is not an array".into())
        })?;

        list.iter()
            .map(|entry| {
                let text = entry.as_str().ok_or_else(|| {
                    SurfaceError::InvalidConfig(format!("trusted peer {entry} is not a string"))
                })?;
                text.parse::<ClusterPeerId>()
                    .map_err(|e| SurfaceError::InvalidConfig(format!("trusted peer {text}: {e}")))
            })
            .collect()
    }

    fn write_peers(path: &Path, peers: &PeerSet) -> Result<(), SurfaceError> {
        let mut document = Self::read_document(path)?;
        let crdt = document
            .pointer_mut("/consensus/crdt")
            .and_then(Value::as_object_mut)
            .ok_or_else(|| {
                SurfaceError::InvalidConfig("missing consensus.crdt section".into())
            })?;
        crdt.insert(
            "trusted_peers".to_string(),
            Value::Array(peers.iter().map(|p| Value::String(p.to_base58())).collect()),
        );

        let rendered = serde_json::to_string_pretty(&document)
            .map_err(|e| SurfaceError::Other(format!("failed to render config: {e}")))?;

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(rendered.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| SurfaceError::Io(e.error))?;
        Ok(())
    }
}

#[async_trait]
impl ConfigSurface for ServiceJsonFile {
    async fn trusted_peers(&self) -> Result<PeerSet, SurfaceError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || Self::read_peers(&path))
            .await
            .map_err(|e| SurfaceError::Other(format!("config reader task failed: {e}")))?
    }

    async fn replace_trusted_peers(&self, peers: &PeerSet) -> Result<(), SurfaceError> {
        let path = self.path.clone();
        let count = peers.len();
        let peers = peers.clone();
        tokio::task::spawn_blocking(move || Self::write_peers(&path, &peers))
            .await
            .map_err(|e| SurfaceError::Other(format!("config writer task failed: {e}")))??;
        tracing::info!(path = %self.path.display(), count, "wrote trusted peers to service config");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use warden_types::peer::PEER_ID_LEN;

    fn peer(byte: u8) -> ClusterPeerId {
        ClusterPeerId::from_bytes(vec![byte; PEER_ID_LEN]).unwrap()
    }

    fn write_config(dir: &tempfile::TempDir, value: Value) -> PathBuf {
        let path = dir.path().join("service.json");
        std::fs::write(&path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
        path
    }

    #[tokio::test]
    async fn missing_trusted_peers_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, json!({ "consensus": { "crdt": { "cluster_name": "c" } } }));
        let surface = ServiceJsonFile::new(path);
        assert!(surface.trusted_peers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn replace_preserves_other_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            json!({
                "cluster": { "peername": "relay-1" },
                "consensus": { "crdt": { "cluster_name": "ipfs-cluster", "trusted_peers": ["*"] } }
            }),
        );
        let surface = ServiceJsonFile::new(&path);
        let peers: PeerSet = [peer(2), peer(1)].into_iter().collect();

        surface.replace_trusted_peers(&peers).await.unwrap();

        let doc: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["cluster"]["peername"], "relay-1");
        assert_eq!(doc["consensus"]["crdt"]["cluster_name"], "ipfs-cluster");
        assert_eq!(surface.trusted_peers().await.unwrap(), peers);
    }

    #[tokio::test]
    async fn wildcard_entry_is_reported_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            json!({ "consensus": { "crdt": { "trusted_peers": ["*"] } } }),
        );
        let err = ServiceJsonFile::new(path).trusted_peers().await.unwrap_err();
        assert!(matches!(err, SurfaceError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn replace_without_crdt_section_fails_and_leaves_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, json!({ "consensus": {} }));
        let before = std::fs::read_to_string(&path).unwrap();

        let err = ServiceJsonFile::new(&path)
            .replace_trusted_peers(&[peer(1)].into_iter().collect())
            .await
            .unwrap_err();

        assert!(matches!(err, SurfaceError::InvalidConfig(_)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let surface = ServiceJsonFile::new(dir.path().join("absent.json"));
        assert!(matches!(
            surface.trusted_peers().await.unwrap_err(),
            SurfaceError::Io(_)
        ));
    }
}
