//! Warden relay node: orchestrates the trust pipeline and the announcer.
//!
//! The node is the central coordinator that:
//! - Follows finalized heads and reconciles the trusted-peer set each block
//! - Writes the set to the cluster configuration and restarts the cluster
//! - Keeps this node's own peer id inscribed on chain
//! - Serves status and Prometheus metrics

pub mod config;
pub mod error;
pub mod metrics;
pub mod node;
pub mod reconcile;
pub mod shutdown;

pub use config::{NodeConfig, StakeSetting, SurfaceSelection};
pub use error::NodeError;
pub use metrics::NodeMetrics;
pub use node::{Roles, WardenNode};
pub use reconcile::{PassReport, ReconcileService};
pub use shutdown::ShutdownController;
