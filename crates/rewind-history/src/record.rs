use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use rewind_diff::Patch;
use rewind_types::DocumentId;

/// The kind of mutation a history record captures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HistoryAction {
    /// A direct-instance save over existing state.
    Update,
    /// One document of a query-based bulk update.
    BulkUpdate,
    /// A removal; the post-image is the empty object.
    Delete,
}

/// One immutable ledger entry for a single document mutation.
///
/// Records are append-only and never rewritten. For a fixed
/// `(collection_tag, content_id)` pair, versions are strictly increasing
/// starting at 0; a version is only consumed when a non-empty diff exists.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    /// The mutated document's type name.
    pub collection_tag: String,
    /// The mutated document's id.
    pub content_id: DocumentId,
    /// Every id this record covers. Currently always the singleton
    /// `[content_id]`; kept as a set for future multi-document records.
    pub content_ids: Vec<DocumentId>,
    /// Structural patch from the state immediately before the mutation to
    /// the state immediately after.
    pub diff: Patch,
    /// Full snapshot of the state before the mutation.
    pub original: Value,
    /// Full snapshot of the state after the mutation.
    pub updated: Value,
    /// Free-form identity of whoever made the change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
    /// Stable actor id, when the caller supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<DocumentId>,
    /// Free-text reason supplied with the mutation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Generated human-readable summary of the change.
    pub description: String,
    /// The mutation kind.
    pub action: HistoryAction,
    /// Position in this document's history, starting at 0.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
