use thiserror::Error;

#[derive(Debug, Error)]
pub enum GazetteerError {
    #[error("malformed NDJSON record in {table}: {source}")]
    MalformedRecord { table: &'static str, source: serde_json::Error },

    #[error("foreign-key violation in {table}: {detail}")]
    ForeignKeyViolation { table: &'static str, detail: String },

    #[error("gazetteer lookup failure: {0}")]
    LookupFailure(String),
}

pub type Result<T> = std::result::Result<T, GazetteerError>;
