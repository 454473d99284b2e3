//! HTTP surfaces of the relay.
//!
//! Provides:
//! - The status server run by the relay: current trusted peers, the last
//!   processed block and Prometheus metrics
//! - The manager API run next to the cluster: accepts a new trusted-peer
//!   list, writes it to the cluster configuration and restarts the cluster

pub mod error;
pub mod manager;
pub mod server;
pub mod status;

pub use error::RpcError;
pub use manager::{ManagerApi, ManagerState};
pub use server::{StatusServer, StatusState};
pub use status::{NodeStatus, StatusBoard};
