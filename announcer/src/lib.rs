//! Self-announcement: keeps this node's cluster peer id on chain.
//!
//! The chain accepts one commitment per account every `rate_limit_blocks`.
//! The [`Announcer`] reads its own last commitment, submits a fresh one as
//! soon as the rate limit allows, and otherwise sleeps until it does.
//! Failures back off for a fixed interval and never stop the loop.

pub mod scheduler;

pub use scheduler::{plan, Announcer, IdleDecision, StepOutcome};
