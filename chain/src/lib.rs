//! Chain query facade.
//!
//! The relay reads finalized chain state and submits its own commitments
//! through the [`ChainClient`] trait. The trait is the only thing the trust
//! pipeline and the announcer know about the chain; the production
//! implementation is [`GatewayClient`], a JSON-RPC client for a chain gateway
//! that owns the websocket connection, extrinsic decoding and key material.

pub mod client;
pub mod error;
pub mod gateway;

pub use client::{ChainClient, HeadStream, SigningIdentity};
pub use error::ChainError;
pub use gateway::{GatewayClient, GatewayConfig};
