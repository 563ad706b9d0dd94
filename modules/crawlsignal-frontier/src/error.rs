use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontierError {
    #[error("malformed url: {0}")]
    MalformedUrl(String),

    #[error("frontier is draining, no new enqueues accepted")]
    Draining,

    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, FrontierError>;
