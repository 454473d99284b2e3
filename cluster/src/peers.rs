//! The wire body shared with the cluster manager.

use serde::{Deserialize, Serialize};

use warden_types::{ClusterPeerId, PeerSet};

/// `{"trustedPeers": [...]}`: request/response body of the cluster manager API.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedPeersBody {
    #[serde(rename = "trustedPeers")]
    pub trusted_peers: Vec<ClusterPeerId>,
}

impl TrustedPeersBody {
    pub fn from_set(peers: &PeerSet) -> Self {
        Self {
            trusted_peers: peers.iter().cloned().collect(),
        }
    }

    pub fn into_set(self) -> PeerSet {
        self.trusted_peers.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_types::peer::PEER_ID_LEN;

    fn peer(byte: u8) -> ClusterPeerId {
        ClusterPeerId::from_bytes(vec![byte; PEER_ID_LEN]).unwrap()
    }

    #[test]
    fn into_set_ignores_order_and_duplicates() {
        let body = TrustedPeersBody {
            trusted_peers: vec![peer(2), peer(1), peer(2)],
        };
        let expected: PeerSet = [peer(1), peer(2)].into_iter().collect();
        assert_eq!(body.into_set(), expected);
    }

    #[test]
    fn body_uses_camel_case_key() {
        let body = TrustedPeersBody::from_set(&[peer(1)].into_iter().collect());
        let json = serde_json::to_value(&body).unwrap();
        assert!(json["trustedPeers"].is_array());
        assert_eq!(json["trustedPeers"][0], peer(1).to_base58());
    }
}
