use thiserror::Error;

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid cluster config: {0}")]
    InvalidConfig(String),

    #[error("cluster manager request failed: {0}")]
    RequestFailed(String),

    #[error("cluster manager unreachable: {0}")]
    Unreachable(String),

    #[error("invalid response from cluster manager: {0}")]
    InvalidResponse(String),

    #[error("restart failed: {0}")]
    RestartFailed(String),

    #[error("{0}")]
    Other(String),
}
