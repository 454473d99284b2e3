//! JSON-RPC client for the chain gateway.
//!
//! The gateway is a sidecar that keeps the chain connection, decodes storage
//! and signs extrinsics with keys from its own keystore. Every facade call is
//! one JSON-RPC 2.0 request over HTTP:
//!
//! | method                     | params                         | result                     |
//! |----------------------------|--------------------------------|----------------------------|
//! | `commitments_list`         | `[netuid]`                     | `[{account, commitment}]`  |
//! | `commitments_get`          | `[netuid, account]`            | `{info, block}` or `null`  |
//! | `subnet_uid`               | `[netuid, account]`            | `u16` or `null`            |
//! | `subnet_validatorPermit`   | `[netuid, uid]`                | `bool`                     |
//! | `stake_total`              | `[account]`                    | base units (`u64`)         |
//! | `chain_finalizedHeight`    | `[]`                           | `u64`                      |
//! | `commitments_submit`       | `[netuid, signer, "0x…"]`      | `{block}` once finalized   |
//!
//! Finalized heads are derived by polling `chain_finalizedHeight`.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::MissedTickBehavior;

use warden_types::{AccountId, BlockHeight, CommitmentRecord, StakeAmount, SubnetId};

use crate::{ChainClient, ChainError, HeadStream, SigningIdentity};

/// Default timeout for read requests.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for a submission, which waits for finalization.
const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default interval between finalized-height polls (half a block).
const DEFAULT_HEAD_POLL_INTERVAL: Duration = Duration::from_secs(6);

/// Connection settings for [`GatewayClient`].
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub url: String,
    pub request_timeout: Duration,
    pub submit_timeout: Duration,
    pub head_poll_interval: Duration,
}

impl GatewayConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
            head_poll_interval: DEFAULT_HEAD_POLL_INTERVAL,
        }
    }
}

/// [`ChainClient`] backed by the chain gateway.
#[derive(Clone)]
pub struct GatewayClient {
    http_client: reqwest::Client,
    config: GatewayConfig,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct CommitmentEntry {
    account: AccountId,
    commitment: Option<CommitmentRecord>,
}

#[derive(Debug, Deserialize)]
struct SubmitResult {
    block: BlockHeight,
}

/// JSON-RPC error code the gateway uses for a rejected or failed extrinsic.
const SUBMISSION_REJECTED_CODE: i64 = 1010;

impl GatewayClient {
    pub fn new(config: GatewayConfig) -> Result<Self, ChainError> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ChainError::Unreachable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<T, ChainError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let result = self.exchange(method, &body, timeout).await;
        if let Err(e) = &result {
            tracing::debug!(method, error = %e, "gateway request failed");
        }
        result
    }

    async fn exchange<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<T, ChainError> {
        let response = self
            .http_client
            .post(&self.config.url)
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChainError::Timeout
                } else if e.is_connect() {
                    ChainError::Unreachable(format!("connection failed: {e}"))
                } else {
                    ChainError::RequestFailed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(ChainError::RequestFailed(format!(
                "{method}: HTTP status {}",
                response.status()
            )));
        }

        let rpc: RpcResponse = response.json().await.map_err(|e| {
            ChainError::InvalidResponse(format!("{method}: failed to parse response: {e}"))
        })?;

        if let Some(err) = rpc.error {
            return Err(if err.code == SUBMISSION_REJECTED_CODE {
                ChainError::SubmissionRejected(err.message)
            } else {
                ChainError::RequestFailed(format!("{method}: {} ({})", err.message, err.code))
            });
        }

        serde_json::from_value(rpc.result.unwrap_or(Value::Null))
            .map_err(|e| ChainError::InvalidResponse(format!("{method}: {e}")))
    }

    async fn read<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ChainError> {
        self.call(method, params, self.config.request_timeout).await
    }
}

#[async_trait]
impl ChainClient for GatewayClient {
    async fn list_commitments(
        &self,
        subnet: SubnetId,
    ) -> Result<Vec<(AccountId, Option<CommitmentRecord>)>, ChainError> {
        let entries: Vec<CommitmentEntry> = self
            .read("commitments_list", json!([subnet.get()]))
            .await?;
        Ok(entries
            .into_iter()
            .map(|e| (e.account, e.commitment))
            .collect())
    }

    async fn commitment_of(
        &self,
        subnet: SubnetId,
        account: &AccountId,
    ) -> Result<Option<CommitmentRecord>, ChainError> {
        self.read("commitments_get", json!([subnet.get(), account]))
            .await
    }

    async fn validator_uid(
        &self,
        subnet: SubnetId,
        account: &AccountId,
    ) -> Result<Option<u16>, ChainError> {
        self.read("subnet_uid", json!([subnet.get(), account])).await
    }

    async fn has_validator_permit(&self, subnet: SubnetId, uid: u16) -> Result<bool, ChainError> {
        self.read("subnet_validatorPermit", json!([subnet.get(), uid]))
            .await
    }

    async fn total_stake(&self, account: &AccountId) -> Result<StakeAmount, ChainError> {
        let raw: u64 = self.read("stake_total", json!([account])).await?;
        Ok(StakeAmount::from_base_units(raw))
    }

    async fn current_height(&self) -> Result<BlockHeight, ChainError> {
        let height: u64 = self.read("chain_finalizedHeight", json!([])).await?;
        Ok(BlockHeight::new(height))
    }

    async fn finalized_heads(&self) -> Result<HeadStream, ChainError> {
        let mut interval = tokio::time::interval(self.config.head_poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let state = (self.clone(), interval, None::<BlockHeight>);
        let stream = futures_util::stream::unfold(state, |(client, mut interval, mut last)| async move {
            loop {
                interval.tick().await;
                match client.current_height().await {
                    Ok(height) if last.map_or(true, |l| height > l) => {
                        last = Some(height);
                        return Some((Ok(height), (client, interval, last)));
                    }
                    Ok(height) => {
                        tracing::debug!(%height, "finalized height unchanged");
                        continue;
                    }
                    Err(e) => return Some((Err(e), (client, interval, last))),
                }
            }
        });
        Ok(Box::pin(stream))
    }

    async fn submit_commitment(
        &self,
        subnet: SubnetId,
        signer: &SigningIdentity,
        payload: Vec<u8>,
    ) -> Result<BlockHeight, ChainError> {
        let encoded = format!("0x{}", hex::encode(&payload));
        let result: SubmitResult = self
            .call(
                "commitments_submit",
                json!([subnet.get(), signer, encoded]),
                self.config.submit_timeout,
            )
            .await?;
        Ok(result.block)
    }
}
