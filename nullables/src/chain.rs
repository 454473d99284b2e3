//! Nullable chain: programmable commitments, validator standing and heads.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use warden_chain::{ChainClient, ChainError, HeadStream, SigningIdentity};
use warden_types::{
    AccountId, BlockHeight, ClusterPeerId, CommitmentRecord, StakeAmount, SubnetId,
};

/// A commitment submission the chain accepted or refused.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedSubmission {
    pub subnet: SubnetId,
    pub account: AccountId,
    pub payload: Vec<u8>,
    /// Inclusion height, `None` when the submission failed.
    pub included_at: Option<BlockHeight>,
}

#[derive(Default)]
struct ChainState {
    height: BlockHeight,
    commitments: BTreeMap<AccountId, Option<CommitmentRecord>>,
    uids: HashMap<AccountId, u16>,
    permits: HashMap<u16, bool>,
    stakes: HashMap<AccountId, StakeAmount>,
    query_failure: Option<ChainError>,
    failing_submissions: usize,
    submissions: Vec<RecordedSubmission>,
    calls: HashMap<&'static str, usize>,
}

/// An in-memory [`ChainClient`].
///
/// Reads answer from programmed state. A successful submission finalizes in
/// the next block: the height advances by one and the payload becomes the
/// account's commitment at that height. Finalized heads are pushed by the
/// test and delivered to a single subscriber.
pub struct NullChain {
    state: Mutex<ChainState>,
    head_tx: Mutex<Option<mpsc::UnboundedSender<Result<BlockHeight, ChainError>>>>,
    head_rx: Mutex<Option<mpsc::UnboundedReceiver<Result<BlockHeight, ChainError>>>>,
}

impl NullChain {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state: Mutex::new(ChainState::default()),
            head_tx: Mutex::new(Some(tx)),
            head_rx: Mutex::new(Some(rx)),
        }
    }

    pub fn at_height(height: u64) -> Self {
        let chain = Self::new();
        chain.set_height(BlockHeight::new(height));
        chain
    }

    fn state(&self) -> std::sync::MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record_call(&self, method: &'static str) -> Result<(), ChainError> {
        let mut state = self.state();
        *state.calls.entry(method).or_default() += 1;
        match &state.query_failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    pub fn height(&self) -> BlockHeight {
        self.state().height
    }

    pub fn set_height(&self, height: BlockHeight) {
        self.state().height = height;
    }

    /// Set or clear the raw commitment entry of `account`.
    pub fn set_commitment(&self, account: &AccountId, record: Option<CommitmentRecord>) {
        self.state().commitments.insert(account.clone(), record);
    }

    /// Store `peer_id` as `account`'s commitment inscribed at `block`.
    pub fn advertise(&self, account: &AccountId, peer_id: &ClusterPeerId, block: u64) {
        self.set_commitment(
            account,
            Some(CommitmentRecord {
                info: warden_protocol::encode(peer_id),
                block: BlockHeight::new(block),
            }),
        );
    }

    /// Give `account` a uid with the given permit and stake.
    pub fn register_validator(&self, account: &AccountId, uid: u16, permit: bool, stake: StakeAmount) {
        let mut state = self.state();
        state.uids.insert(account.clone(), uid);
        state.permits.insert(uid, permit);
        state.stakes.insert(account.clone(), stake);
    }

    pub fn deregister(&self, account: &AccountId) {
        self.state().uids.remove(account);
    }

    pub fn set_permit(&self, uid: u16, permit: bool) {
        self.state().permits.insert(uid, permit);
    }

    pub fn set_stake(&self, account: &AccountId, stake: StakeAmount) {
        self.state().stakes.insert(account.clone(), stake);
    }

    /// Make every read fail with `err` until cleared with `None`.
    pub fn set_query_failure(&self, err: Option<ChainError>) {
        self.state().query_failure = err;
    }

    /// Reject the next `count` submissions.
    pub fn fail_next_submissions(&self, count: usize) {
        self.state().failing_submissions = count;
    }

    pub fn submissions(&self) -> Vec<RecordedSubmission> {
        self.state().submissions.clone()
    }

    /// How often `method` (a [`ChainClient`] method name) was called.
    pub fn calls(&self, method: &str) -> usize {
        self.state().calls.get(method).copied().unwrap_or(0)
    }

    /// Deliver a finalized head to the subscriber and move the chain to it.
    pub fn push_head(&self, height: u64) {
        {
            let mut state = self.state();
            state.height = state.height.max(BlockHeight::new(height));
        }
        if let Some(tx) = self.head_tx.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
            let _ = tx.send(Ok(BlockHeight::new(height)));
        }
    }

    /// Deliver an error on the head stream.
    pub fn push_head_error(&self, err: ChainError) {
        if let Some(tx) = self.head_tx.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
            let _ = tx.send(Err(err));
        }
    }

    /// End the head stream once queued heads are consumed.
    pub fn close_heads(&self) {
        self.head_tx.lock().unwrap_or_else(|e| e.into_inner()).take();
    }
}

impl Default for NullChain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainClient for NullChain {
    async fn list_commitments(
        &self,
        _subnet: SubnetId,
    ) -> Result<Vec<(AccountId, Option<CommitmentRecord>)>, ChainError> {
        self.record_call("list_commitments")?;
        Ok(self
            .state()
            .commitments
            .iter()
            .map(|(account, record)| (account.clone(), record.clone()))
            .collect())
    }

    async fn commitment_of(
        &self,
        _subnet: SubnetId,
        account: &AccountId,
    ) -> Result<Option<CommitmentRecord>, ChainError> {
        self.record_call("commitment_of")?;
        Ok(self.state().commitments.get(account).cloned().flatten())
    }

    async fn validator_uid(
        &self,
        _subnet: SubnetId,
        account: &AccountId,
    ) -> Result<Option<u16>, ChainError> {
        self.record_call("validator_uid")?;
        Ok(self.state().uids.get(account).copied())
    }

    async fn has_validator_permit(&self, _subnet: SubnetId, uid: u16) -> Result<bool, ChainError> {
        self.record_call("has_validator_permit")?;
        Ok(self.state().permits.get(&uid).copied().unwrap_or(false))
    }

    async fn total_stake(&self, account: &AccountId) -> Result<StakeAmount, ChainError> {
        self.record_call("total_stake")?;
        Ok(self.state().stakes.get(account).copied().unwrap_or_default())
    }

    async fn current_height(&self) -> Result<BlockHeight, ChainError> {
        self.record_call("current_height")?;
        Ok(self.state().height)
    }

    async fn finalized_heads(&self) -> Result<HeadStream, ChainError> {
        self.record_call("finalized_heads")?;
        let rx = self
            .head_rx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .ok_or(ChainError::SubscriptionClosed)?;
        let stream = futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        Ok(Box::pin(stream))
    }

    async fn submit_commitment(
        &self,
        subnet: SubnetId,
        signer: &SigningIdentity,
        payload: Vec<u8>,
    ) -> Result<BlockHeight, ChainError> {
        let mut state = self.state();
        *state.calls.entry("submit_commitment").or_default() += 1;

        if state.failing_submissions > 0 {
            state.failing_submissions -= 1;
            state.submissions.push(RecordedSubmission {
                subnet,
                account: signer.account.clone(),
                payload,
                included_at: None,
            });
            return Err(ChainError::SubmissionRejected(
                "null chain rejected submission".into(),
            ));
        }

        let included_at = state.height.saturating_add(1);
        state.height = included_at;
        state.commitments.insert(
            signer.account.clone(),
            Some(CommitmentRecord {
                info: payload.clone(),
                block: included_at,
            }),
        );
        state.submissions.push(RecordedSubmission {
            subnet,
            account: signer.account.clone(),
            payload,
            included_at: Some(included_at),
        });
        Ok(included_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use warden_types::peer::PEER_ID_LEN;

    fn signer() -> SigningIdentity {
        SigningIdentity {
            account: AccountId::new("relay"),
            wallet: "default".into(),
            hotkey: "default".into(),
        }
    }

    #[tokio::test]
    async fn submission_finalizes_in_next_block() {
        let chain = NullChain::at_height(100);
        let peer = ClusterPeerId::from_bytes(vec![9; PEER_ID_LEN]).unwrap();
        let payload = warden_protocol::encode(&peer);

        let at = chain
            .submit_commitment(SubnetId::new(1), &signer(), payload.clone())
            .await
            .unwrap();

        assert_eq!(at, BlockHeight::new(101));
        let record = chain
            .commitment_of(SubnetId::new(1), &signer().account)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.info, payload);
        assert_eq!(record.block, at);
    }

    #[tokio::test]
    async fn failing_submission_is_recorded() {
        let chain = NullChain::at_height(10);
        chain.fail_next_submissions(1);
        assert!(chain
            .submit_commitment(SubnetId::new(1), &signer(), vec![0])
            .await
            .is_err());
        assert_eq!(chain.submissions()[0].included_at, None);
        assert_eq!(chain.height(), BlockHeight::new(10));
    }

    #[tokio::test]
    async fn query_failure_applies_to_reads() {
        let chain = NullChain::new();
        chain.set_query_failure(Some(ChainError::Timeout));
        assert_eq!(chain.current_height().await, Err(ChainError::Timeout));
        chain.set_query_failure(None);
        assert!(chain.current_height().await.is_ok());
        assert_eq!(chain.calls("current_height"), 2);
    }

    #[tokio::test]
    async fn heads_reach_a_single_subscriber() {
        let chain = NullChain::new();
        chain.push_head(5);
        chain.push_head(6);
        chain.close_heads();

        let heads: Vec<_> = chain.finalized_heads().await.unwrap().collect().await;
        assert_eq!(
            heads,
            vec![Ok(BlockHeight::new(5)), Ok(BlockHeight::new(6))]
        );
        assert!(matches!(
            chain.finalized_heads().await,
            Err(ChainError::SubscriptionClosed)
        ));
    }
}
