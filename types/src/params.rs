//! Tunable parameters for trust evaluation and self-announcement.

use std::time::Duration;

use crate::StakeAmount;

/// Default trust window: an advertisement older than this many blocks is stale.
pub const DEFAULT_TRUST_WINDOW_BLOCKS: u64 = 100;

/// Default on-chain commitment rate limit, in blocks.
pub const DEFAULT_RATE_LIMIT_BLOCKS: u64 = 100;

/// Default target block time of the chain.
pub const DEFAULT_BLOCK_TIME: Duration = Duration::from_secs(12);

/// Default pause after a failed commitment submission.
pub const DEFAULT_FAILURE_BACKOFF: Duration = Duration::from_secs(5);

/// Criteria an advertisement must meet to be trusted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrustParams {
    /// Minimum total stake of the advertising account.
    pub min_stake: StakeAmount,
    /// Number of blocks an advertisement stays valid after inscription.
    pub window_blocks: u64,
}

impl TrustParams {
    pub fn new(min_stake: StakeAmount, window_blocks: u64) -> Self {
        Self {
            min_stake,
            window_blocks,
        }
    }
}

/// Timing of the self-announcement loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnnounceParams {
    /// Minimum block spacing between two commitments of the same account.
    pub rate_limit_blocks: u64,
    /// Wall-clock duration of one block; only used to turn block counts into sleeps.
    pub block_time: Duration,
    /// Fixed pause after a failed submission or chain query.
    pub failure_backoff: Duration,
}

impl AnnounceParams {
    /// Wall-clock duration of `blocks` blocks.
    pub fn blocks_to_duration(&self, blocks: u64) -> Duration {
        let blocks = u32::try_from(blocks).unwrap_or(u32::MAX);
        self.block_time.saturating_mul(blocks)
    }
}

impl Default for AnnounceParams {
    fn default() -> Self {
        Self {
            rate_limit_blocks: DEFAULT_RATE_LIMIT_BLOCKS,
            block_time: DEFAULT_BLOCK_TIME,
            failure_backoff: DEFAULT_FAILURE_BACKOFF,
        }
    }
}
