//! Error types for the diff crate.

/// Errors that can occur while applying or decoding a patch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiffError {
    /// The value does not have the shape the patch expects (e.g. the patch
    /// descends into an object but the value is a scalar).
    #[error("patch shape mismatch at `{context}`: expected {expected}")]
    ShapeMismatch {
        context: String,
        expected: &'static str,
    },

    /// An array entry index is outside the array being patched.
    #[error("array index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// The wire form encodes an array move, which this engine never emits.
    #[error("array moves are not supported (kind code {0})")]
    UnsupportedMove(u64),

    /// The wire form could not be decoded into a patch.
    #[error("malformed patch: {0}")]
    MalformedPatch(String),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
