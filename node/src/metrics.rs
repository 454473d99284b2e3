//! Prometheus metrics for the warden relay.
//!
//! [`NodeMetrics`] owns a dedicated [`Registry`] that the status server's
//! `/metrics` endpoint encodes into the Prometheus text exposition format.

use prometheus::{IntCounter, IntGauge, Opts, Registry};

use crate::NodeError;

/// Central collection of all relay-level Prometheus metrics.
pub struct NodeMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Finalized blocks whose reconciliation pass completed.
    pub blocks_processed: IntCounter,
    /// Passes abandoned because of a chain error.
    pub pass_failures: IntCounter,
    /// Successful trusted-peer writes to the cluster configuration.
    pub config_writes: IntCounter,
    /// Cluster restarts triggered (failed ones included).
    pub restarts: IntCounter,
    /// Commitments finalized by the announcer.
    pub inscriptions_submitted: IntCounter,
    /// Failed announcer attempts.
    pub inscriptions_failed: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Current size of the trusted set.
    pub trusted_peers: IntGauge,
    /// Advertisements currently tracked.
    pub advertisements: IntGauge,
    /// Height of the last processed block.
    pub last_block: IntGauge,
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter, NodeError> {
    let counter = IntCounter::with_opts(Opts::new(name, help))?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

fn gauge(registry: &Registry, name: &str, help: &str) -> Result<IntGauge, NodeError> {
    let gauge = IntGauge::with_opts(Opts::new(name, help))?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

impl NodeMetrics {
    /// Create a fresh set of metrics, all registered under a new [`Registry`].
    pub fn new() -> Result<Self, NodeError> {
        let registry = Registry::new();

        Ok(Self {
            blocks_processed: counter(
                &registry,
                "warden_blocks_processed_total",
                "Finalized blocks reconciled",
            )?,
            pass_failures: counter(
                &registry,
                "warden_pass_failures_total",
                "Reconciliation passes abandoned on chain errors",
            )?,
            config_writes: counter(
                &registry,
                "warden_config_writes_total",
                "Trusted-peer writes to the cluster configuration",
            )?,
            restarts: counter(&registry, "warden_restarts_total", "Cluster restarts triggered")?,
            inscriptions_submitted: counter(
                &registry,
                "warden_inscriptions_submitted_total",
                "Peer id commitments finalized on chain",
            )?,
            inscriptions_failed: counter(
                &registry,
                "warden_inscriptions_failed_total",
                "Failed announcement attempts",
            )?,
            trusted_peers: gauge(&registry, "warden_trusted_peers", "Size of the trusted set")?,
            advertisements: gauge(
                &registry,
                "warden_advertisements",
                "Advertisements currently tracked",
            )?,
            last_block: gauge(&registry, "warden_last_block", "Last reconciled block height")?,
            registry,
        })
    }
}
