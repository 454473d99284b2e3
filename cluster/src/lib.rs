//! The distribution cluster's configuration surface.
//!
//! The relay converges the cluster's trusted-peer list onto the trusted set it
//! derives from the chain. This crate holds the boundary:
//! - [`ConfigSurface`]: read / atomically replace the trusted peers, backed by
//!   the cluster's `service.json` ([`ServiceJsonFile`]) or the cluster
//!   manager's HTTP API ([`ManagerClient`]).
//! - [`RestartTrigger`]: make the cluster pick up a new list.
//! - [`ConfigSynchronizer`]: idempotent push: no I/O when nothing changed.

pub mod error;
pub mod manager_client;
pub mod peers;
pub mod restart;
pub mod service_json;
pub mod surface;
pub mod synchronizer;

pub use error::SurfaceError;
pub use manager_client::ManagerClient;
pub use peers::TrustedPeersBody;
pub use restart::{CommandRestart, NoopRestart};
pub use service_json::ServiceJsonFile;
pub use surface::{ConfigSurface, RestartTrigger};
pub use synchronizer::ConfigSynchronizer;
