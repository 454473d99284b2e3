//! Configuration surface traits.

use async_trait::async_trait;

use warden_types::PeerSet;

use crate::SurfaceError;

/// Where the cluster's trusted-peer list lives.
#[async_trait]
pub trait ConfigSurface: Send + Sync {
    /// The trusted peers currently stored.
    async fn trusted_peers(&self) -> Result<PeerSet, SurfaceError>;

    /// Replace the stored trusted peers. Atomic from the caller's view:
    /// on error nothing has changed.
    async fn replace_trusted_peers(&self, peers: &PeerSet) -> Result<(), SurfaceError>;
}

/// Makes the cluster reload its configuration.
#[async_trait]
pub trait RestartTrigger: Send + Sync {
    async fn restart(&self) -> Result<(), SurfaceError>;
}
