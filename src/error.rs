use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not authenticated: no acting user was provided")]
    NotAuthenticated,

    #[error("Not allowed: record belongs to another user")]
    Forbidden,

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Invoice store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
