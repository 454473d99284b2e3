//! Nullable cluster configuration: an in-memory trusted-peer list and a
//! restart counter.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use warden_cluster::{ConfigSurface, RestartTrigger, SurfaceError};
use warden_types::PeerSet;

/// In-memory [`ConfigSurface`] that counts writes.
#[derive(Debug, Default)]
pub struct NullConfigSurface {
    peers: Mutex<PeerSet>,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl NullConfigSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface that already holds `peers`.
    pub fn with_peers(peers: PeerSet) -> Self {
        Self {
            peers: Mutex::new(peers),
            ..Self::default()
        }
    }

    /// The list as last written.
    pub fn peers(&self) -> PeerSet {
        self.peers.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of successful writes.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make reads fail as if the stored list were unparseable.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make writes fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConfigSurface for NullConfigSurface {
    async fn trusted_peers(&self) -> Result<PeerSet, SurfaceError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(SurfaceError::InvalidConfig("null surface read failure".into()));
        }
        Ok(self.peers())
    }

    async fn replace_trusted_peers(&self, peers: &PeerSet) -> Result<(), SurfaceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SurfaceError::Other("null surface write failure".into()));
        }
        *self.peers.lock().unwrap_or_else(|e| e.into_inner()) = peers.clone();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// [`RestartTrigger`] that counts invocations.
#[derive(Debug, Default)]
pub struct NullRestart {
    restarts: AtomicUsize,
    fail: AtomicBool,
}

impl NullRestart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of restart attempts, failed ones included.
    pub fn restarts(&self) -> usize {
        self.restarts.load(Ordering::SeqCst)
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RestartTrigger for NullRestart {
    async fn restart(&self) -> Result<(), SurfaceError> {
        self.restarts.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(SurfaceError::RestartFailed("null restart failure".into()));
        }
        Ok(())
    }
}
