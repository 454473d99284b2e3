//! Fundamental types for warden.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! block heights, chain accounts, subnet identifiers, cluster peer identifiers,
//! stake amounts, commitments/advertisements and the tunable trust parameters.

pub mod account;
pub mod amount;
pub mod commitment;
pub mod error;
pub mod height;
pub mod params;
pub mod peer;
pub mod subnet;

pub use account::AccountId;
pub use amount::StakeAmount;
pub use commitment::{Advertisement, CommitmentRecord};
pub use error::TypesError;
pub use height::BlockHeight;
pub use params::{AnnounceParams, TrustParams};
pub use peer::{ClusterPeerId, PeerSet};
pub use subnet::SubnetId;
