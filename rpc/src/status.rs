//! Shared view of the relay's progress, written by the reconcile pipeline
//! and read by the status server.

use serde::Serialize;
use tokio::sync::RwLock;

use warden_types::{BlockHeight, ClusterPeerId, PeerSet, SubnetId};

/// Snapshot served at `/status`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NodeStatus {
    pub subnet: Option<SubnetId>,
    pub leader: Option<ClusterPeerId>,
    /// Last block whose pass completed.
    pub last_block: Option<BlockHeight>,
    pub trusted_peers: Vec<ClusterPeerId>,
    pub tracked_advertisements: usize,
    /// Number of successful configuration writes since startup.
    pub config_writes: u64,
    /// Error of the most recent failed pass, cleared by the next success.
    pub last_error: Option<String>,
}

/// Concurrent holder of the current [`NodeStatus`].
#[derive(Debug, Default)]
pub struct StatusBoard {
    inner: RwLock<NodeStatus>,
}

impl StatusBoard {
    pub fn new(subnet: SubnetId, leader: Option<ClusterPeerId>) -> Self {
        Self {
            inner: RwLock::new(NodeStatus {
                subnet: Some(subnet),
                trusted_peers: leader.iter().cloned().collect(),
                leader,
                ..NodeStatus::default()
            }),
        }
    }

    /// Record a completed pass.
    pub async fn record_pass(
        &self,
        block: BlockHeight,
        trusted: &PeerSet,
        tracked_advertisements: usize,
        wrote_config: bool,
    ) {
        let mut status = self.inner.write().await;
        status.last_block = Some(block);
        status.trusted_peers = trusted.iter().cloned().collect();
        status.tracked_advertisements = tracked_advertisements;
        if wrote_config {
            status.config_writes += 1;
        }
        status.last_error = None;
    }

    /// Record an abandoned pass.
    pub async fn record_failure(&self, error: impl ToString) {
        self.inner.write().await.last_error = Some(error.to_string());
    }

    pub async fn snapshot(&self) -> NodeStatus {
        self.inner.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_types::peer::PEER_ID_LEN;

    fn peer(byte: u8) -> ClusterPeerId {
        ClusterPeerId::from_bytes(vec![byte; PEER_ID_LEN]).unwrap()
    }

    #[tokio::test]
    async fn starts_with_leader_only() {
        let board = StatusBoard::new(SubnetId::new(2), Some(peer(0)));
        let status = board.snapshot().await;
        assert_eq!(status.trusted_peers, vec![peer(0)]);
        assert_eq!(status.last_block, None);
    }

    #[tokio::test]
    async fn success_clears_previous_error() {
        let board = StatusBoard::new(SubnetId::new(2), None);
        board.record_failure("chain request timed out").await;
        assert!(board.snapshot().await.last_error.is_some());

        let trusted: PeerSet = [peer(1)].into_iter().collect();
        board.record_pass(BlockHeight::new(10), &trusted, 3, true).await;

        let status = board.snapshot().await;
        assert_eq!(status.last_error, None);
        assert_eq!(status.last_block, Some(BlockHeight::new(10)));
        assert_eq!(status.tracked_advertisements, 3);
        assert_eq!(status.config_writes, 1);
    }
}
