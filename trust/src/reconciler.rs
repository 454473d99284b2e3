//! The trusted-peer set and its per-block recomputation.

use serde::Serialize;

use warden_chain::{ChainClient, ChainError};
use warden_types::{BlockHeight, ClusterPeerId, PeerSet};

use crate::{AdvertisementBook, TrustEvaluator};

/// Peers that entered and left the trusted set in one pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub added: Vec<ClusterPeerId>,
    pub removed: Vec<ClusterPeerId>,
}

impl ReconcileOutcome {
    pub fn changed(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

/// The set of cluster peers currently trusted.
///
/// A peer id is trusted while at least one tracked advertisement naming it
/// passes evaluation. The pinned leader, if any, is always a member.
#[derive(Clone, Debug, Default)]
pub struct TrustSet {
    peers: PeerSet,
    leader: Option<ClusterPeerId>,
}

impl TrustSet {
    pub fn new(leader: Option<ClusterPeerId>) -> Self {
        let peers = leader.iter().cloned().collect();
        Self { peers, leader }
    }

    pub fn peers(&self) -> &PeerSet {
        &self.peers
    }

    pub fn leader(&self) -> Option<&ClusterPeerId> {
        self.leader.as_ref()
    }

    pub fn contains(&self, peer_id: &ClusterPeerId) -> bool {
        self.peers.contains(peer_id)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Replace the set with the peers of every trusted verdict plus the
    /// leader, and report the difference.
    pub fn apply_verdicts(
        &mut self,
        verdicts: impl IntoIterator<Item = (ClusterPeerId, bool)>,
    ) -> ReconcileOutcome {
        let mut next: PeerSet = verdicts
            .into_iter()
            .filter_map(|(peer_id, trusted)| trusted.then_some(peer_id))
            .collect();
        if let Some(leader) = &self.leader {
            next.insert(leader.clone());
        }

        let outcome = ReconcileOutcome {
            added: next.difference(&self.peers).cloned().collect(),
            removed: self.peers.difference(&next).cloned().collect(),
        };
        for peer_id in &outcome.added {
            tracing::info!(%peer_id, "peer trusted");
        }
        for peer_id in &outcome.removed {
            tracing::info!(%peer_id, "peer no longer trusted");
        }

        self.peers = next;
        outcome
    }

    /// Evaluate every advertisement in `book` at `current` and update the set.
    ///
    /// On a chain error the set is left as it was.
    pub async fn reconcile(
        &mut self,
        book: &AdvertisementBook,
        evaluator: &TrustEvaluator,
        chain: &dyn ChainClient,
        current: BlockHeight,
    ) -> Result<ReconcileOutcome, ChainError> {
        let mut verdicts = Vec::with_capacity(book.len());
        for ad in book.iter() {
            let verdict = evaluator.evaluate(chain, ad, current).await?;
            verdicts.push((ad.peer_id.clone(), verdict.is_trusted()));
        }
        Ok(self.apply_verdicts(verdicts))
    }
}
