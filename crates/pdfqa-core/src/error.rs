use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No storage area for `id`. `available` lists known identifiers
    /// (capped by `retrieval.max_available`) for the client to recover.
    #[error("Document not found: {id}")]
    DocumentNotFound { id: String, available: Vec<String> },

    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Language model call failed: {0}")]
    Model(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure classes reported by external capabilities (embedding service,
/// vector store, model server). Adapters wrap these in `anyhow::Error` so
/// callers can `downcast_ref` to decide how to degrade.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Network failure, refused connection, timeout, non-success status.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("index missing: {0}")]
    MissingIndex(String),

    #[error("corrupt data: {0}")]
    Corrupt(String),

    /// Wrong model name, unknown collection, bad endpoint URL.
    #[error("misconfigured: {0}")]
    Misconfigured(String),
}
