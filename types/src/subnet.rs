//! Subnet identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A logical partition of the chain; scopes whose commitments are relevant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubnetId(u16);

impl SubnetId {
    pub fn new(netuid: u16) -> Self {
        Self(netuid)
    }

    pub fn get(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for SubnetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "netuid {}", self.0)
    }
}

impl From<u16> for SubnetId {
    fn from(netuid: u16) -> Self {
        Self(netuid)
    }
}
