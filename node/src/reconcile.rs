//! The per-block reconciliation pipeline.
//!
//! Every finalized head runs one pass: refresh advertisements, recompute the
//! trusted set, push it to the cluster configuration, restart the cluster
//! if the configuration was written. Blocks are processed strictly one
//! after another.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::broadcast;

use warden_chain::ChainClient;
use warden_cluster::{ConfigSynchronizer, RestartTrigger};
use warden_rpc::StatusBoard;
use warden_trust::{AdvertisementBook, ReconcileOutcome, RefreshSummary, TrustEvaluator, TrustSet};
use warden_types::{BlockHeight, PeerSet};
use warden_utils::{format_duration, Clock};

use crate::{NodeError, NodeMetrics};

/// What one pass did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PassReport {
    pub block: BlockHeight,
    pub refresh: RefreshSummary,
    pub outcome: ReconcileOutcome,
    /// The trusted peers were written to the cluster configuration.
    pub wrote_config: bool,
    /// A restart was triggered and succeeded.
    pub restarted: bool,
}

/// Owns all reconciliation state and drives it from finalized heads.
pub struct ReconcileService {
    chain: Arc<dyn ChainClient>,
    evaluator: TrustEvaluator,
    book: AdvertisementBook,
    trust: TrustSet,
    synchronizer: ConfigSynchronizer,
    restart: Arc<dyn RestartTrigger>,
    metrics: Arc<NodeMetrics>,
    board: Arc<StatusBoard>,
    clock: Arc<dyn Clock>,
    resubscribe_backoff: Duration,
}

impl ReconcileService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chain: Arc<dyn ChainClient>,
        evaluator: TrustEvaluator,
        trust: TrustSet,
        synchronizer: ConfigSynchronizer,
        restart: Arc<dyn RestartTrigger>,
        metrics: Arc<NodeMetrics>,
        board: Arc<StatusBoard>,
        clock: Arc<dyn Clock>,
        resubscribe_backoff: Duration,
    ) -> Self {
        Self {
            chain,
            evaluator,
            book: AdvertisementBook::new(),
            trust,
            synchronizer,
            restart,
            metrics,
            board,
            clock,
            resubscribe_backoff,
        }
    }

    pub fn trusted_peers(&self) -> &PeerSet {
        self.trust.peers()
    }

    pub fn advertisements(&self) -> &AdvertisementBook {
        &self.book
    }

    /// Run one full pass for `block`.
    ///
    /// A chain error abandons the pass before anything is written; the next
    /// head retries.
    pub async fn process_block(&mut self, block: BlockHeight) -> Result<PassReport, NodeError> {
        let refresh = self
            .book
            .refresh(self.chain.as_ref(), self.evaluator.subnet())
            .await?;
        let outcome = self
            .trust
            .reconcile(&self.book, &self.evaluator, self.chain.as_ref(), block)
            .await?;

        // Sync when the set moved, or when an earlier write has not landed yet.
        let pending = self.synchronizer.last_applied() != Some(self.trust.peers());
        let wrote_config = if outcome.changed() || pending {
            self.synchronizer.sync(self.trust.peers().iter().cloned()).await
        } else {
            false
        };

        let mut restarted = false;
        if wrote_config {
            self.metrics.config_writes.inc();
            self.metrics.restarts.inc();
            match self.restart.restart().await {
                Ok(()) => restarted = true,
                Err(e) => tracing::error!(error = %e, %block, "cluster restart failed"),
            }
        }

        self.metrics.blocks_processed.inc();
        self.metrics.last_block.set(block.get() as i64);
        self.metrics.trusted_peers.set(self.trust.len() as i64);
        self.metrics.advertisements.set(self.book.len() as i64);
        self.board
            .record_pass(block, self.trust.peers(), self.book.len(), wrote_config)
            .await;

        tracing::info!(
            %block,
            trusted = self.trust.len(),
            tracked = refresh.tracked,
            added = outcome.added.len(),
            removed = outcome.removed.len(),
            wrote_config,
            "processed block"
        );

        Ok(PassReport {
            block,
            refresh,
            outcome,
            wrote_config,
            restarted,
        })
    }

    async fn handle_head(&mut self, block: BlockHeight) {
        if let Err(e) = self.process_block(block).await {
            self.metrics.pass_failures.inc();
            self.board.record_failure(&e).await;
            tracing::warn!(error = %e, %block, "reconciliation pass abandoned");
        }
    }

    /// Process finalized heads until shutdown, resubscribing after a
    /// backoff whenever the subscription fails or ends.
    pub async fn run(&mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            subnet = %self.evaluator.subnet(),
            min_stake = %self.evaluator.params().min_stake,
            window_blocks = self.evaluator.params().window_blocks,
            "reconciliation started"
        );

        loop {
            let subscription = tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                subscription = self.chain.finalized_heads() => subscription,
            };

            match subscription {
                Ok(mut heads) => loop {
                    let next = tokio::select! {
                        biased;
                        _ = shutdown.recv() => {
                            tracing::info!("reconciliation shutting down");
                            return;
                        }
                        next = heads.next() => next,
                    };
                    match next {
                        Some(Ok(block)) => self.handle_head(block).await,
                        Some(Err(e)) => tracing::warn!(error = %e, "finalized head error"),
                        None => {
                            tracing::warn!("finalized head stream ended");
                            break;
                        }
                    }
                },
                Err(e) => tracing::warn!(error = %e, "failed to subscribe to finalized heads"),
            }

            tracing::info!(
                backoff = %format_duration(self.resubscribe_backoff),
                "resubscribing to finalized heads"
            );
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                _ = self.clock.sleep(self.resubscribe_backoff) => {}
            }
        }
        tracing::info!("reconciliation shutting down");
    }
}
