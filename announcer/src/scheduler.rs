//! Rate-limited announcement loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use warden_chain::{ChainClient, ChainError, SigningIdentity};
use warden_types::{AnnounceParams, BlockHeight, ClusterPeerId, SubnetId};
use warden_utils::{format_duration, Clock};

/// What the idle state decides after looking at the chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdleDecision {
    /// No previous commitment, or the rate limit has passed.
    SubmitNow,
    /// The rate limit forbids a submission for `blocks` more blocks.
    Wait { blocks: u64, duration: Duration },
}

/// Decide whether to submit given the last inscription height.
pub fn plan(
    last_inscribed: Option<BlockHeight>,
    current: BlockHeight,
    params: &AnnounceParams,
) -> IdleDecision {
    let Some(last) = last_inscribed else {
        return IdleDecision::SubmitNow;
    };
    let next_allowed = last.saturating_add(params.rate_limit_blocks);
    if current >= next_allowed {
        return IdleDecision::SubmitNow;
    }
    let blocks = current.blocks_until(next_allowed);
    IdleDecision::Wait {
        blocks,
        duration: params.blocks_to_duration(blocks),
    }
}

/// Result of one [`Announcer::step`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// A commitment was finalized at `at`.
    Submitted { at: BlockHeight },
    /// Rate-limited; slept for `duration`.
    Waited { blocks: u64, duration: Duration },
    /// A chain query or the submission failed; slept for the backoff.
    BackedOff { error: ChainError, submitting: bool },
}

/// Keeps `peer_id` inscribed on chain for `signer`.
pub struct Announcer {
    chain: Arc<dyn ChainClient>,
    clock: Arc<dyn Clock>,
    subnet: SubnetId,
    signer: SigningIdentity,
    peer_id: ClusterPeerId,
    params: AnnounceParams,
}

impl Announcer {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        clock: Arc<dyn Clock>,
        subnet: SubnetId,
        signer: SigningIdentity,
        peer_id: ClusterPeerId,
        params: AnnounceParams,
    ) -> Self {
        Self {
            chain,
            clock,
            subnet,
            signer,
            peer_id,
            params,
        }
    }

    pub fn peer_id(&self) -> &ClusterPeerId {
        &self.peer_id
    }

    async fn idle(&self) -> Result<IdleDecision, ChainError> {
        let own = self
            .chain
            .commitment_of(self.subnet, &self.signer.account)
            .await?;
        let current = self.chain.current_height().await?;

        if let Some(record) = &own {
            if warden_protocol::decode(&record.info).as_ref() != Some(&self.peer_id) {
                tracing::info!(
                    account = %self.signer.account,
                    block = %record.block,
                    "on-chain commitment does not name this node's peer id"
                );
            }
        }
        Ok(plan(own.map(|r| r.block), current, &self.params))
    }

    async fn back_off(&self, error: ChainError, submitting: bool) -> StepOutcome {
        tracing::warn!(
            error = %error,
            submitting,
            backoff = %format_duration(self.params.failure_backoff),
            "announcement attempt failed, backing off"
        );
        self.clock.sleep(self.params.failure_backoff).await;
        StepOutcome::BackedOff { error, submitting }
    }

    /// Run the idle check and whatever it leads to: a submission, a
    /// rate-limit wait, or a failure backoff.
    pub async fn step(&self) -> StepOutcome {
        let decision = match self.idle().await {
            Ok(decision) => decision,
            Err(e) => return self.back_off(e, false).await,
        };

        match decision {
            IdleDecision::Wait { blocks, duration } => {
                tracing::debug!(
                    blocks,
                    wait = %format_duration(duration),
                    "rate limited, waiting before next announcement"
                );
                self.clock.sleep(duration).await;
                StepOutcome::Waited { blocks, duration }
            }
            IdleDecision::SubmitNow => {
                let payload = warden_protocol::encode(&self.peer_id);
                match self
                    .chain
                    .submit_commitment(self.subnet, &self.signer, payload)
                    .await
                {
                    Ok(at) => {
                        tracing::info!(
                            peer_id = %self.peer_id,
                            block = %at,
                            subnet = %self.subnet,
                            "announced cluster peer id"
                        );
                        StepOutcome::Submitted { at }
                    }
                    Err(e) => self.back_off(e, true).await,
                }
            }
        }
    }

    /// Step until shutdown, reporting each outcome to `observe`.
    pub async fn run(
        &self,
        mut shutdown: broadcast::Receiver<()>,
        mut observe: impl FnMut(&StepOutcome) + Send,
    ) {
        tracing::info!(
            peer_id = %self.peer_id,
            account = %self.signer.account,
            rate_limit_blocks = self.params.rate_limit_blocks,
            "announcer started"
        );
        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("announcer shutting down");
                    break;
                }
                outcome = self.step() => observe(&outcome),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_nullables::{NullChain, NullClock};
    use warden_types::peer::PEER_ID_LEN;
    use warden_types::AccountId;

    const BLOCK_TIME: Duration = Duration::from_secs(12);
    const BACKOFF: Duration = Duration::from_secs(5);

    fn params(rate_limit_blocks: u64) -> AnnounceParams {
        AnnounceParams {
            rate_limit_blocks,
            block_time: BLOCK_TIME,
            failure_backoff: BACKOFF,
        }
    }

    fn signer() -> SigningIdentity {
        SigningIdentity {
            account: AccountId::new("relay-validator"),
            wallet: "default".into(),
            hotkey: "relay".into(),
        }
    }

    fn own_peer() -> ClusterPeerId {
        ClusterPeerId::from_bytes(vec![0x42; PEER_ID_LEN]).unwrap()
    }

    fn announcer(chain: Arc<NullChain>, clock: Arc<NullClock>, rate_limit: u64) -> Announcer {
        Announcer::new(
            chain,
            clock,
            SubnetId::new(40),
            signer(),
            own_peer(),
            params(rate_limit),
        )
    }

    #[test]
    fn plan_without_prior_commitment_submits() {
        assert_eq!(
            plan(None, BlockHeight::new(100), &params(50)),
            IdleDecision::SubmitNow
        );
    }

    #[test]
    fn plan_within_rate_limit_waits_remaining_blocks() {
        assert_eq!(
            plan(Some(BlockHeight::new(100)), BlockHeight::new(120), &params(50)),
            IdleDecision::Wait {
                blocks: 30,
                duration: BLOCK_TIME * 30
            }
        );
    }

    #[test]
    fn plan_at_next_allowed_height_submits() {
        assert_eq!(
            plan(Some(BlockHeight::new(100)), BlockHeight::new(150), &params(50)),
            IdleDecision::SubmitNow
        );
        assert_eq!(
            plan(Some(BlockHeight::new(100)), BlockHeight::new(149), &params(50)),
            IdleDecision::Wait {
                blocks: 1,
                duration: BLOCK_TIME
            }
        );
    }

    #[tokio::test]
    async fn first_announcement_is_immediate() {
        let chain = Arc::new(NullChain::at_height(100));
        let clock = Arc::new(NullClock::new());

        let outcome = announcer(chain.clone(), clock.clone(), 50).step().await;

        assert_eq!(
            outcome,
            StepOutcome::Submitted {
                at: BlockHeight::new(101)
            }
        );
        let submissions = chain.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(
            warden_protocol::decode(&submissions[0].payload),
            Some(own_peer())
        );
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn rate_limited_announcement_sleeps_without_submitting() {
        let chain = Arc::new(NullChain::at_height(120));
        chain.advertise(&signer().account, &own_peer(), 100);
        let clock = Arc::new(NullClock::new());

        let outcome = announcer(chain.clone(), clock.clone(), 50).step().await;

        assert_eq!(
            outcome,
            StepOutcome::Waited {
                blocks: 30,
                duration: BLOCK_TIME * 30
            }
        );
        assert!(chain.submissions().is_empty());
        assert_eq!(clock.sleeps(), vec![BLOCK_TIME * 30]);
    }

    #[tokio::test]
    async fn failed_submission_backs_off_then_retries() {
        let chain = Arc::new(NullChain::at_height(100));
        chain.fail_next_submissions(1);
        let clock = Arc::new(NullClock::new());
        let announcer = announcer(chain.clone(), clock.clone(), 50);

        let first = announcer.step().await;
        assert!(matches!(
            first,
            StepOutcome::BackedOff {
                submitting: true,
                ..
            }
        ));
        assert_eq!(clock.sleeps(), vec![BACKOFF]);

        let second = announcer.step().await;
        assert!(matches!(second, StepOutcome::Submitted { .. }));
        assert_eq!(chain.submissions().len(), 2);
    }

    #[tokio::test]
    async fn chain_query_failure_backs_off() {
        let chain = Arc::new(NullChain::at_height(100));
        chain.set_query_failure(Some(ChainError::Timeout));
        let clock = Arc::new(NullClock::new());

        let outcome = announcer(chain.clone(), clock.clone(), 50).step().await;

        assert_eq!(
            outcome,
            StepOutcome::BackedOff {
                error: ChainError::Timeout,
                submitting: false
            }
        );
        assert_eq!(clock.sleeps(), vec![BACKOFF]);
        assert!(chain.submissions().is_empty());
    }

    #[tokio::test]
    async fn submission_then_wait_for_full_rate_limit() {
        let chain = Arc::new(NullChain::at_height(100));
        let clock = Arc::new(NullClock::new());
        let announcer = announcer(chain.clone(), clock.clone(), 50);

        announcer.step().await;
        let outcome = announcer.step().await;

        assert_eq!(
            outcome,
            StepOutcome::Waited {
                blocks: 50,
                duration: BLOCK_TIME * 50
            }
        );
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let chain = Arc::new(NullChain::at_height(100));
        chain.advertise(&signer().account, &own_peer(), 99);
        let clock = Arc::new(NullClock::new());
        let announcer = announcer(chain.clone(), clock.clone(), 50);
        let (tx, rx) = broadcast::channel(1);

        let mut seen = 0usize;
        let run = announcer.run(rx, |_| {
            seen += 1;
            if seen == 3 {
                let _ = tx.send(());
            }
        });
        tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .expect("announcer stops after shutdown");

        assert!(seen >= 3);
        assert!(chain.submissions().is_empty());
    }
}
