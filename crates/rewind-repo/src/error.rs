use rewind_types::DocumentId;

/// Errors produced by repository operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepoError {
    #[error("document {id} not found in collection `{collection}`")]
    NotFound {
        collection: String,
        id: DocumentId,
    },

    #[error("document has no identity field or it is not a string")]
    MissingId,

    #[error("document must be a JSON object")]
    NotAnObject,

    #[error("uniqueness conflict in `{collection}` on keys [{}]", keys.join(", "))]
    Conflict {
        collection: String,
        keys: Vec<String>,
    },

    #[error("persistence failure: {0}")]
    Persistence(String),
}

/// Convenience alias for repository results.
pub type RepoResult<T> = Result<T, RepoError>;
