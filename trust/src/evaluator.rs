//! Whether an advertisement is currently trustworthy.

use std::fmt;

use serde::Serialize;

use warden_chain::{ChainClient, ChainError};
use warden_types::{Advertisement, BlockHeight, StakeAmount, SubnetId, TrustParams};

/// What the chain says about the advertising account.
///
/// Fields after the first failing check are never fetched; they keep their
/// defaults and do not affect the verdict.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ValidatorStanding {
    pub uid: Option<u16>,
    pub has_permit: bool,
    pub stake: StakeAmount,
}

/// Outcome of evaluating one advertisement. Checks run in declaration order
/// and the first failure wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum TrustVerdict {
    Trusted,
    NotRegistered,
    NoValidatorPermit { uid: u16 },
    InsufficientStake { stake: StakeAmount, min: StakeAmount },
    Expired { inscribed_at: BlockHeight, oldest_allowed: BlockHeight },
}

impl TrustVerdict {
    pub fn is_trusted(&self) -> bool {
        matches!(self, TrustVerdict::Trusted)
    }
}

impl fmt::Display for TrustVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrustVerdict::Trusted => f.write_str("trusted"),
            TrustVerdict::NotRegistered => f.write_str("account has no uid in the subnet"),
            TrustVerdict::NoValidatorPermit { uid } => {
                write!(f, "uid {uid} holds no validator permit")
            }
            TrustVerdict::InsufficientStake { stake, min } => {
                write!(f, "stake {stake} below minimum {min}")
            }
            TrustVerdict::Expired {
                inscribed_at,
                oldest_allowed,
            } => write!(
                f,
                "inscribed at {inscribed_at}, older than {oldest_allowed}"
            ),
        }
    }
}

/// Applies [`TrustParams`] to advertisements of one subnet.
#[derive(Clone, Copy, Debug)]
pub struct TrustEvaluator {
    subnet: SubnetId,
    params: TrustParams,
}

impl TrustEvaluator {
    pub fn new(subnet: SubnetId, params: TrustParams) -> Self {
        Self { subnet, params }
    }

    pub fn subnet(&self) -> SubnetId {
        self.subnet
    }

    pub fn params(&self) -> &TrustParams {
        &self.params
    }

    /// Oldest inscription height still inside the window at `current`.
    pub fn oldest_allowed(&self, current: BlockHeight) -> BlockHeight {
        current.saturating_sub(self.params.window_blocks)
    }

    /// Pure verdict from an account's standing and the inscription height.
    pub fn judge(
        &self,
        standing: &ValidatorStanding,
        inscribed_at: BlockHeight,
        current: BlockHeight,
    ) -> TrustVerdict {
        let Some(uid) = standing.uid else {
            return TrustVerdict::NotRegistered;
        };
        if !standing.has_permit {
            return TrustVerdict::NoValidatorPermit { uid };
        }
        if standing.stake < self.params.min_stake {
            return TrustVerdict::InsufficientStake {
                stake: standing.stake,
                min: self.params.min_stake,
            };
        }
        let oldest_allowed = self.oldest_allowed(current);
        if inscribed_at < oldest_allowed {
            return TrustVerdict::Expired {
                inscribed_at,
                oldest_allowed,
            };
        }
        TrustVerdict::Trusted
    }

    /// Fetch the account's standing and judge the advertisement.
    ///
    /// Queries stop at the first failing check, so an unregistered account
    /// costs one request.
    pub async fn evaluate(
        &self,
        chain: &dyn ChainClient,
        ad: &Advertisement,
        current: BlockHeight,
    ) -> Result<TrustVerdict, ChainError> {
        let standing = self.fetch_standing(chain, ad).await?;
        let verdict = self.judge(&standing, ad.inscribed_at, current);

        if verdict.is_trusted() {
            let expires_at = ad.expires_at(self.params.window_blocks);
            tracing::debug!(
                account = %ad.account,
                peer_id = %ad.peer_id,
                expires_at = %expires_at,
                blocks_left = current.blocks_until(expires_at),
                "advertisement trusted"
            );
        } else {
            tracing::debug!(
                account = %ad.account,
                peer_id = %ad.peer_id,
                reason = %verdict,
                "advertisement not trusted"
            );
        }
        Ok(verdict)
    }

    async fn fetch_standing(
        &self,
        chain: &dyn ChainClient,
        ad: &Advertisement,
    ) -> Result<ValidatorStanding, ChainError> {
        let mut standing = ValidatorStanding::default();

        standing.uid = chain.validator_uid(self.subnet, &ad.account).await?;
        let Some(uid) = standing.uid else {
            return Ok(standing);
        };

        standing.has_permit = chain.has_validator_permit(self.subnet, uid).await?;
        if !standing.has_permit {
            return Ok(standing);
        }

        standing.stake = chain.total_stake(&ad.account).await?;
        Ok(standing)
    }
}
