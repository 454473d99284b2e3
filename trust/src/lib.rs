//! Trust derivation: from on-chain advertisements to the trusted-peer set.
//!
//! Each finalized block runs one pass through three stages:
//! - [`AdvertisementBook`] re-reads every commitment of the subnet and keeps
//!   the latest decoded advertisement per account
//! - [`TrustEvaluator`] checks an advertisement against the account's
//!   validator standing and the trust window
//! - [`TrustSet`] recomputes the trusted peers from the verdicts and reports
//!   what was added or removed
//!
//! A chain error anywhere in a pass abandons it; the trusted set only moves
//! after every advertisement has been evaluated.

pub mod aggregator;
pub mod evaluator;
pub mod reconciler;

pub use aggregator::{AdvertisementBook, RefreshSummary};
pub use evaluator::{TrustEvaluator, TrustVerdict, ValidatorStanding};
pub use reconciler::{ReconcileOutcome, TrustSet};
