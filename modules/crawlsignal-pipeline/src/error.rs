use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("http request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("body could not be classified: {0}")]
    Classify(String),

    #[error("body extraction failed: {0}")]
    Extraction(String),

    #[error(transparent)]
    Store(#[from] crawlsignal_store::StoreError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
