use thiserror::Error;

/// Failures talking to the chain.
///
/// Every variant is transient from the relay's point of view: the current
/// loop iteration is abandoned and the next trigger retries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("chain unreachable: {0}")]
    Unreachable(String),

    #[error("chain request timed out")]
    Timeout,

    #[error("chain request failed: {0}")]
    RequestFailed(String),

    #[error("invalid response from chain: {0}")]
    InvalidResponse(String),

    #[error("commitment rejected: {0}")]
    SubmissionRejected(String),

    #[error("finalized head subscription closed")]
    SubscriptionClosed,
}
