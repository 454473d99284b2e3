//! Block height type used throughout the relay.
//!
//! Heights are finalized block numbers. All arithmetic on them saturates so a
//! window or rate limit larger than the chain's age never underflows.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A finalized block number.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BlockHeight(u64);

impl BlockHeight {
    pub const GENESIS: Self = Self(0);

    pub fn new(number: u64) -> Self {
        Self(number)
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    /// Height `blocks` after this one.
    pub fn saturating_add(self, blocks: u64) -> Self {
        Self(self.0.saturating_add(blocks))
    }

    /// Height `blocks` before this one, clamped at genesis.
    pub fn saturating_sub(self, blocks: u64) -> Self {
        Self(self.0.saturating_sub(blocks))
    }

    /// Number of blocks from `self` until `target` (zero if already reached).
    pub fn blocks_until(&self, target: BlockHeight) -> u64 {
        target.0.saturating_sub(self.0)
    }
}

impl fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for BlockHeight {
    fn from(number: u64) -> Self {
        Self(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturating_sub_clamps_at_genesis() {
        assert_eq!(BlockHeight::new(10).saturating_sub(100), BlockHeight::GENESIS);
        assert_eq!(BlockHeight::new(600).saturating_sub(100), BlockHeight::new(500));
    }

    #[test]
    fn blocks_until_is_zero_once_reached() {
        let now = BlockHeight::new(150);
        assert_eq!(now.blocks_until(BlockHeight::new(150)), 0);
        assert_eq!(now.blocks_until(BlockHeight::new(120)), 0);
        assert_eq!(now.blocks_until(BlockHeight::new(180)), 30);
    }

    #[test]
    fn display_uses_hash_prefix() {
        assert_eq!(BlockHeight::new(42).to_string(), "#42");
    }
}
