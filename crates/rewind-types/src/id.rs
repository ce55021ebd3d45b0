use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The reserved identity field inside stored documents.
///
/// The store may regenerate or alias this field across saves, so the diff
/// engine strips it before comparison: identity churn is never a content
/// change.
pub const ID_KEY: &str = "_id";

/// Stable identifier for a versioned document.
///
/// Freshly generated ids are UUID v7 strings, so lexicographic order follows
/// creation time. Ids read back from an external store are kept verbatim.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Generate a new time-ordered document id (UUID v7).
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    /// Parse an id from an externally supplied string.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        if s.is_empty() {
            return Err(TypeError::EmptyId);
        }
        Ok(Self(s.to_string()))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short representation (first 8 characters).
    pub fn short_id(&self) -> String {
        self.0.chars().take(8).collect()
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.short_id())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
