use rewind_diff::DiffError;
use rewind_repo::RepoError;
use rewind_types::DocumentId;

/// Errors produced by the history engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HistoryError {
    /// Another writer claimed the same version for this document. Retryable
    /// by the caller; never retried here.
    #[error("version {version} already recorded for {collection_tag}/{content_id}")]
    VersionConflict {
        collection_tag: String,
        content_id: DocumentId,
        version: u64,
    },

    /// The referenced document has neither live state nor history.
    #[error("document {id} not found in `{collection}`")]
    NotFound {
        collection: String,
        id: DocumentId,
    },

    /// A stored version sequence is not strictly increasing.
    #[error("broken version chain for {collection_tag}/{content_id}: {reason}")]
    BrokenVersionChain {
        collection_tag: String,
        content_id: DocumentId,
        reason: String,
    },

    /// Applying a stored patch failed. Not expected for an internally
    /// consistent history chain.
    #[error("diff application failed: {0}")]
    Diff(#[from] DiffError),

    /// A record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The underlying store failed.
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl From<RepoError> for HistoryError {
    fn from(error: RepoError) -> Self {
        match error {
            RepoError::NotFound { collection, id } => HistoryError::NotFound { collection, id },
            other => HistoryError::Persistence(other.to_string()),
        }
    }
}

/// Convenience alias for history results.
pub type HistoryResult<T> = Result<T, HistoryError>;
