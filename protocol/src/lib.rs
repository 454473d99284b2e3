//! Commitment wire format: encoding a cluster peer identifier into the
//! chain's commitment payload and recovering it again.

pub mod codec;
pub mod error;

pub use codec::{decode, decode_peer_id, encode, CommitmentField, CommitmentInfo};
pub use error::CodecError;
