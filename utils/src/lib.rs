//! Shared utilities for warden.

pub mod logging;
pub mod time;

pub use logging::{init_logging, LogFormat};
pub use time::{format_duration, Clock, TokioClock};
