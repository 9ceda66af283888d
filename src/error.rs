use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Transport error: {0}")]
    TransportError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Why a single handler failed to produce an opinion.
///
/// Handler faults never reach the requester; the dispatcher logs them and
/// treats the handler as non-approving.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    #[error("handler failed: {0}")]
    Failed(String),
    #[error("handler panicked")]
    Panicked,
    #[error("handler did not settle within {0:?}")]
    TimedOut(std::time::Duration),
    #[error("handler was abandoned before producing an opinion")]
    Abandoned,
}

pub type Result<T> = std::result::Result<T, BrokerError>;
pub type HandlerResult<T> = std::result::Result<T, HandlerError>;
