//! The chain facade trait.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};

use warden_types::{AccountId, BlockHeight, CommitmentRecord, StakeAmount, SubnetId};

use crate::ChainError;

/// Stream of finalized block heights, in order.
pub type HeadStream = BoxStream<'static, Result<BlockHeight, ChainError>>;

/// The key that signs a commitment submission.
///
/// The relay never holds key material: `wallet`/`hotkey` name a key the
/// signing backend knows about, `account` is the address that key controls
/// (needed to look up the account's own commitment).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningIdentity {
    pub account: AccountId,
    pub wallet: String,
    pub hotkey: String,
}

/// Read access to finalized chain state plus commitment submission.
///
/// Implementations must not retry internally; retry policy belongs to the
/// calling loop. The trait is object-safe and `Send + Sync` so a single
/// client can be shared between the reconciliation pipeline and the
/// announcer.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Every commitment entry of the subnet. `None` marks an account whose
    /// storage entry exists but holds no commitment.
    async fn list_commitments(
        &self,
        subnet: SubnetId,
    ) -> Result<Vec<(AccountId, Option<CommitmentRecord>)>, ChainError>;

    /// The current commitment of one account.
    async fn commitment_of(
        &self,
        subnet: SubnetId,
        account: &AccountId,
    ) -> Result<Option<CommitmentRecord>, ChainError>;

    /// The account's participant index (uid) in the subnet, if registered.
    async fn validator_uid(
        &self,
        subnet: SubnetId,
        account: &AccountId,
    ) -> Result<Option<u16>, ChainError>;

    /// Whether `uid` currently holds a validator permit in the subnet.
    async fn has_validator_permit(&self, subnet: SubnetId, uid: u16) -> Result<bool, ChainError>;

    /// Total stake behind the account, in base units.
    async fn total_stake(&self, account: &AccountId) -> Result<StakeAmount, ChainError>;

    /// Height of the latest finalized block.
    async fn current_height(&self) -> Result<BlockHeight, ChainError>;

    /// Subscribe to finalized block heights.
    async fn finalized_heads(&self) -> Result<HeadStream, ChainError>;

    /// Sign and submit a commitment, resolving once it is finalized.
    /// Returns the height of the block that included it.
    async fn submit_commitment(
        &self,
        subnet: SubnetId,
        signer: &SigningIdentity,
        payload: Vec<u8>,
    ) -> Result<BlockHeight, ChainError>;
}
