//! Parse and validation errors for the shared types.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid account id: {0}")]
    InvalidAccount(String),

    #[error("invalid cluster peer id: {0}")]
    InvalidPeerId(String),

    #[error("cluster peer id must be {expected} bytes, got {actual}")]
    PeerIdLength { expected: usize, actual: usize },

    #[error("invalid stake amount: {0}")]
    InvalidAmount(String),
}
