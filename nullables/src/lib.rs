//! Nullable infrastructure for deterministic testing.
//!
//! Inspired by the "A-frame architecture" pattern from RsNano.
//! Every external dependency of the relay (chain, clock, cluster
//! configuration, restart) sits behind a trait. This crate provides
//! test-friendly implementations that:
//! - Return programmed values
//! - Record what was asked of them for later assertions
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod chain;
pub mod clock;
pub mod surface;

pub use chain::{NullChain, RecordedSubmission};
pub use clock::NullClock;
pub use surface::{NullConfigSurface, NullRestart};
