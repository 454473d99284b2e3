//! Commitments as stored on chain and advertisements as interpreted by the relay.

use serde::{Deserialize, Serialize};

use crate::{AccountId, BlockHeight, ClusterPeerId};

/// A commitment exactly as the chain stores it: the encoded payload and the
/// block at which it was inscribed. Decoding is the aggregator's job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentRecord {
    /// Encoded commitment info (see `warden_protocol::codec`).
    #[serde(with = "hex_bytes")]
    pub info: Vec<u8>,
    /// Block at which the commitment was inscribed.
    pub block: BlockHeight,
}

/// The latest decoded commitment of one account: a claim that the account
/// operates `peer_id` in the distribution cluster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advertisement {
    pub account: AccountId,
    pub peer_id: ClusterPeerId,
    pub inscribed_at: BlockHeight,
}

impl Advertisement {
    /// Last height (inclusive) at which this advertisement is inside a trust
    /// window of `window_blocks`.
    pub fn expires_at(&self, window_blocks: u64) -> BlockHeight {
        self.inscribed_at.saturating_add(window_blocks)
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.strip_prefix("0x").unwrap_or(&s)).map_err(serde::de::Error::custom)
    }
}
