//! Shared error taxonomy for the ingestion pipeline.

use thiserror::Error;

/// Errors surfaced by wikivec components.
///
/// Fatal classes (archive structure, embedding provider) abort the run;
/// `Storage` instances may be tolerated row-by-row depending on the
/// pipeline's [`CommitPolicy`](crate::pipeline::CommitPolicy).
#[derive(Debug, Error)]
pub enum WikivecError {
    /// The dump archive could not be opened or its XML structure is invalid.
    #[error("dump error: {0}")]
    Dump(String),

    /// The target-article filter file could not be parsed.
    #[error("filter error: {0}")]
    Filter(String),

    /// The embedding provider failed or broke its batch contract.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// A storage operation failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem error outside the storage layer.
    #[error("i/o error: {0}")]
    Io(String),

    /// Export input did not line up with the stored documents.
    #[error("export error: {0}")]
    Export(String),
}

impl From<std::io::Error> for WikivecError {
    fn from(err: std::io::Error) -> Self {
        WikivecError::Io(err.to_string())
    }
}

impl From<quick_xml::Error> for WikivecError {
    fn from(err: quick_xml::Error) -> Self {
        WikivecError::Dump(err.to_string())
    }
}

impl From<csv::Error> for WikivecError {
    fn from(err: csv::Error) -> Self {
        WikivecError::Filter(err.to_string())
    }
}

impl From<tokio_rusqlite::Error> for WikivecError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        WikivecError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for WikivecError {
    fn from(err: serde_json::Error) -> Self {
        WikivecError::Storage(err.to_string())
    }
}
