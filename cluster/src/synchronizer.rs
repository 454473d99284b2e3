//! Idempotent push of the trusted set onto a [`ConfigSurface`].

use std::sync::Arc;

use warden_types::{ClusterPeerId, PeerSet};

use crate::ConfigSurface;

/// Remembers the last set successfully written and only writes when the
/// desired set differs from it.
///
/// Before the first write the synchronizer does not know what the surface
/// holds, so it reads it once. A surface that cannot be read, or holds
/// entries that are not peer ids, is treated as different and rewritten.
pub struct ConfigSynchronizer {
    surface: Arc<dyn ConfigSurface>,
    last_applied: Option<PeerSet>,
    always_update: bool,
}

impl ConfigSynchronizer {
    pub fn new(surface: Arc<dyn ConfigSurface>) -> Self {
        Self {
            surface,
            last_applied: None,
            always_update: false,
        }
    }

    /// Write on every call, even when nothing changed.
    pub fn with_always_update(mut self, always_update: bool) -> Self {
        self.always_update = always_update;
        self
    }

    pub fn last_applied(&self) -> Option<&PeerSet> {
        self.last_applied.as_ref()
    }

    /// Push `peers` to the surface if it differs from what was last applied.
    ///
    /// Returns `true` only when a write happened and succeeded; the caller
    /// restarts the cluster on `true`. Order and duplicates in `peers` are
    /// irrelevant. A failed write leaves the last-applied snapshot as it was,
    /// so the next call retries.
    pub async fn sync(&mut self, peers: impl IntoIterator<Item = ClusterPeerId>) -> bool {
        let desired: PeerSet = peers.into_iter().collect();

        if !self.always_update {
            if self.last_applied.is_none() {
                match self.surface.trusted_peers().await {
                    Ok(current) => self.last_applied = Some(current),
                    Err(e) => {
                        tracing::warn!(error = %e, "could not read current trusted peers, rewriting");
                    }
                }
            }
            if self.last_applied.as_ref() == Some(&desired) {
                tracing::debug!(count = desired.len(), "trusted peers already up to date");
                return false;
            }
        }

        match self.surface.replace_trusted_peers(&desired).await {
            Ok(()) => {
                tracing::info!(
                    count = desired.len(),
                    forced = self.always_update,
                    "applied trusted peers"
                );
                self.last_applied = Some(desired);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to replace trusted peers");
                false
            }
        }
    }
}
