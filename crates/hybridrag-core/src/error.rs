use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Retrieval timed out in {stage} after {after:?}")]
    RetrievalTimeout { stage: &'static str, after: Duration },

    #[error("Index unavailable: no corpus generation has been loaded")]
    IndexUnavailable,

    #[error("Reranker unavailable: {0}")]
    RerankUnavailable(String),

    #[error("Corrupt cache entry {key}: {reason}")]
    CacheCorrupt { key: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Lexical index error: {0}")]
    Lexical(String),

    #[error("Vector retriever failed: {0}")]
    Retriever(String),

    #[error("Operation failed: {0}")]
    Operation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
