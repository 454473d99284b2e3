//! Cluster peer identifier.
//!
//! The distribution cluster names its peers with libp2p identity multihashes.
//! For the ed25519 keys the cluster uses this is always 38 bytes:
//! `0x00 0x24` (identity hash, 36-byte digest) followed by the protobuf-wrapped
//! public key. Textual form is base58btc, e.g. `12D3KooW…`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// Byte length of every peer identifier the relay accepts.
pub const PEER_ID_LEN: usize = 38;

/// An unordered, duplicate-free set of peer identifiers.
pub type PeerSet = BTreeSet<ClusterPeerId>;

/// A cluster peer identifier, always exactly [`PEER_ID_LEN`] bytes.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClusterPeerId(Vec<u8>);

impl ClusterPeerId {
    /// Build an identifier from raw multihash bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, TypesError> {
        let bytes = bytes.into();
        if bytes.len() != PEER_ID_LEN {
            return Err(TypesError::PeerIdLength {
                expected: PEER_ID_LEN,
                actual: bytes.len(),
            });
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Base58btc text form.
    pub fn to_base58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }
}

impl fmt::Display for ClusterPeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for ClusterPeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClusterPeerId({})", self.to_base58())
    }
}

impl FromStr for ClusterPeerId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s.trim())
            .into_vec()
            .map_err(|e| TypesError::InvalidPeerId(format!("{s}: {e}")))?;
        Self::from_bytes(bytes)
    }
}

impl Serialize for ClusterPeerId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for ClusterPeerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PEER_A: &str = "12D3KooWMmZqkk1Ek8vonm3FE3rNMLqqxwspRiKwx5ZD5yn4tPLG";

    #[test]
    fn parses_cluster_peer_id() {
        let peer: ClusterPeerId = PEER_A.parse().expect("valid peer id");
        assert_eq!(peer.as_bytes().len(), PEER_ID_LEN);
        assert_eq!(peer.to_string(), PEER_A);
    }

    #[test]
    fn rejects_wrong_length() {
        let err = ClusterPeerId::from_bytes(vec![0u8; 32]).unwrap_err();
        assert_eq!(
            err,
            TypesError::PeerIdLength {
                expected: PEER_ID_LEN,
                actual: 32
            }
        );
    }

    #[test]
    fn rejects_non_base58() {
        assert!("0OIl-not-base58".parse::<ClusterPeerId>().is_err());
    }

    #[test]
    fn serde_uses_base58_string() {
        let peer: ClusterPeerId = PEER_A.parse().unwrap();
        let json = serde_json::to_string(&peer).unwrap();
        assert_eq!(json, format!("\"{PEER_A}\""));
        let back: ClusterPeerId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, peer);
    }
}
