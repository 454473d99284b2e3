//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use warden_chain::{GatewayConfig, SigningIdentity};
use warden_types::params::{
    DEFAULT_BLOCK_TIME, DEFAULT_FAILURE_BACKOFF, DEFAULT_RATE_LIMIT_BLOCKS,
    DEFAULT_TRUST_WINDOW_BLOCKS,
};
use warden_types::{AnnounceParams, ClusterPeerId, StakeAmount, SubnetId, TrustParams};
use warden_utils::LogFormat;

use crate::NodeError;

/// Minimum stake as written in the config: `min_stake = 1000` or
/// `min_stake = "1000.5"`, both in display units.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StakeSetting {
    Whole(u64),
    Decimal(String),
}

impl StakeSetting {
    pub fn to_amount(&self) -> Result<StakeAmount, NodeError> {
        match self {
            StakeSetting::Whole(units) => StakeAmount::from_display_units(*units)
                .ok_or_else(|| NodeError::Config(format!("min_stake {units} is too large"))),
            StakeSetting::Decimal(text) => StakeAmount::parse_display(text)
                .map_err(|e| NodeError::Config(format!("min_stake: {e}"))),
        }
    }
}

/// Where the trusted peers are written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SurfaceSelection {
    /// The cluster's `service.json` on this host.
    ServiceJson(PathBuf),
    /// A cluster manager API.
    Manager(String),
}

/// Configuration for a warden relay.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// JSON-RPC endpoint of the chain gateway.
    #[serde(default = "default_chain_url")]
    pub chain_url: String,

    /// Subnet whose commitments are tracked.
    #[serde(default)]
    pub subnet: Option<u16>,

    /// Minimum total stake (display units) of a trusted advertiser.
    #[serde(default)]
    pub min_stake: Option<StakeSetting>,

    /// Blocks an advertisement stays trusted after inscription.
    #[serde(default = "default_trust_window")]
    pub trust_window_blocks: u64,

    /// On-chain commitment rate limit.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_blocks: u64,

    /// Block time used to turn block counts into sleeps.
    #[serde(default = "default_block_time_ms")]
    pub block_time_ms: u64,

    /// Pause after a failed announcement or a dropped head subscription.
    #[serde(default = "default_backoff_ms")]
    pub submit_backoff_ms: u64,

    /// Interval between finalized-height polls.
    #[serde(default = "default_head_poll_ms")]
    pub head_poll_interval_ms: u64,

    /// Peer id that is always trusted.
    #[serde(default)]
    pub leader_peer_id: Option<String>,

    /// Path of the cluster `service.json` to rewrite.
    #[serde(default)]
    pub service_json_path: Option<PathBuf>,

    /// Base URL of a cluster manager API, instead of a local file.
    #[serde(default)]
    pub manager_url: Option<String>,

    /// Command that restarts the cluster after a local config write.
    #[serde(default)]
    pub restart_command: Option<String>,

    /// Write the trusted peers whenever the set changes, even if the
    /// surface already holds them.
    #[serde(default)]
    pub always_update: bool,

    /// Whether to serve `/status`, `/trusted-peers` and `/metrics`.
    #[serde(default = "default_true")]
    pub enable_status: bool,

    #[serde(default = "default_status_port")]
    pub status_port: u16,

    /// Port of the manager API (`warden manager`).
    #[serde(default = "default_manager_port")]
    pub manager_port: u16,

    /// This node's cluster peer id, announced on chain.
    #[serde(default)]
    pub peer_id: Option<String>,

    /// Key that signs announcements.
    #[serde(default)]
    pub signer: Option<SigningIdentity>,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_chain_url() -> String {
    "http://127.0.0.1:9944".to_string()
}

fn default_trust_window() -> u64 {
    DEFAULT_TRUST_WINDOW_BLOCKS
}

fn default_rate_limit() -> u64 {
    DEFAULT_RATE_LIMIT_BLOCKS
}

fn default_block_time_ms() -> u64 {
    DEFAULT_BLOCK_TIME.as_millis() as u64
}

fn default_backoff_ms() -> u64 {
    DEFAULT_FAILURE_BACKOFF.as_millis() as u64
}

fn default_head_poll_ms() -> u64 {
    6_000
}

fn default_true() -> bool {
    true
}

fn default_status_port() -> u16 {
    7080
}

fn default_manager_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(format!("{path}: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn subnet(&self) -> Result<SubnetId, NodeError> {
        self.subnet
            .map(SubnetId::new)
            .ok_or_else(|| NodeError::Config("subnet is required".into()))
    }

    pub fn trust_params(&self) -> Result<TrustParams, NodeError> {
        let min_stake = self
            .min_stake
            .as_ref()
            .ok_or_else(|| NodeError::Config("min_stake is required".into()))?
            .to_amount()?;
        Ok(TrustParams::new(min_stake, self.trust_window_blocks))
    }

    pub fn announce_params(&self) -> AnnounceParams {
        AnnounceParams {
            rate_limit_blocks: self.rate_limit_blocks,
            block_time: Duration::from_millis(self.block_time_ms),
            failure_backoff: self.failure_backoff(),
        }
    }

    pub fn failure_backoff(&self) -> Duration {
        Duration::from_millis(self.submit_backoff_ms)
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        let mut gateway = GatewayConfig::new(&self.chain_url);
        gateway.head_poll_interval = Duration::from_millis(self.head_poll_interval_ms);
        gateway
    }

    pub fn leader(&self) -> Result<Option<ClusterPeerId>, NodeError> {
        self.leader_peer_id
            .as_deref()
            .map(|s| {
                s.parse()
                    .map_err(|e| NodeError::Config(format!("leader_peer_id: {e}")))
            })
            .transpose()
    }

    pub fn own_peer_id(&self) -> Result<ClusterPeerId, NodeError> {
        self.peer_id
            .as_deref()
            .ok_or_else(|| NodeError::Config("peer_id is required to announce".into()))?
            .parse()
            .map_err(|e| NodeError::Config(format!("peer_id: {e}")))
    }

    pub fn signing_identity(&self) -> Result<SigningIdentity, NodeError> {
        self.signer
            .clone()
            .ok_or_else(|| NodeError::Config("[signer] is required to announce".into()))
    }

    pub fn surface(&self) -> Result<SurfaceSelection, NodeError> {
        match (&self.service_json_path, &self.manager_url) {
            (Some(path), None) => Ok(SurfaceSelection::ServiceJson(path.clone())),
            (None, Some(url)) => Ok(SurfaceSelection::Manager(url.clone())),
            (Some(_), Some(_)) => Err(NodeError::Config(
                "set only one of service_json_path and manager_url".into(),
            )),
            (None, None) => Err(NodeError::Config(
                "one of service_json_path or manager_url is required".into(),
            )),
        }
    }

    fn validate_timing(&self) -> Result<(), NodeError> {
        if self.block_time_ms == 0 {
            return Err(NodeError::Config("block_time_ms must be positive".into()));
        }
        if self.head_poll_interval_ms == 0 {
            return Err(NodeError::Config(
                "head_poll_interval_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Check everything the reconciliation pipeline needs.
    pub fn validate_listener(&self) -> Result<(), NodeError> {
        self.validate_timing()?;
        self.subnet()?;
        self.trust_params()?;
        self.leader()?;
        self.surface()?;
        Ok(())
    }

    /// Check everything the announcer needs.
    pub fn validate_announcer(&self) -> Result<(), NodeError> {
        self.validate_timing()?;
        self.subnet()?;
        if self.rate_limit_blocks == 0 {
            return Err(NodeError::Config("rate_limit_blocks must be positive".into()));
        }
        self.own_peer_id()?;
        let signer = self.signing_identity()?;
        if !signer.account.is_valid() {
            return Err(NodeError::Config(format!(
                "signer account {} is not a valid address",
                signer.account
            )));
        }
        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            chain_url: default_chain_url(),
            subnet: None,
            min_stake: None,
            trust_window_blocks: default_trust_window(),
            rate_limit_blocks: default_rate_limit(),
            block_time_ms: default_block_time_ms(),
            submit_backoff_ms: default_backoff_ms(),
            head_poll_interval_ms: default_head_poll_ms(),
            leader_peer_id: None,
            service_json_path: None,
            manager_url: None,
            restart_command: None,
            always_update: false,
            enable_status: default_true(),
            status_port: default_status_port(),
            manager_port: default_manager_port(),
            peer_id: None,
            signer: None,
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}
