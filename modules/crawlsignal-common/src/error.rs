use thiserror::Error;

/// Top-level error taxonomy shared across the crawl pipeline.
///
/// Stage-local errors are caught at stage boundaries and reported as
/// telemetry; only process-level errors (database unavailable, invariant
/// violation in the scheduler) are allowed to abort a job.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("transient network error: {0}")]
    TransientNetwork(String),

    #[error("rate limited (429): retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("permanent http error {status} for {url}")]
    PermanentHttp { status: u16, url: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("database conflict: {0}")]
    DatabaseConflict(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("gazetteer lookup failure: {0}")]
    GazetteerLookup(String),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CrawlError>;
