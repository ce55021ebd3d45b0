//! Versioned append-only storage for history records.
//!
//! Records are persisted through the generic repository abstraction under a
//! dedicated collection, so the history ledger rides on whatever store the
//! application already uses.

use std::sync::Arc;

use serde_json::Value;

use rewind_repo::{Filter, RepoError, Repository};
use rewind_types::DocumentId;

use crate::error::{HistoryError, HistoryResult};
use crate::record::{HistoryAction, HistoryRecord};

/// The collection holding history records.
pub const HISTORY_COLLECTION: &str = "History";

/// Everything the caller supplies for a new record; the store assigns the
/// version and timestamps.
#[derive(Clone, Debug)]
pub struct NewHistoryEntry {
    pub collection_tag: String,
    pub content_id: DocumentId,
    pub diff: rewind_diff::Patch,
    pub original: Value,
    pub updated: Value,
    pub user: Option<Value>,
    pub actor_id: Option<DocumentId>,
    pub reason: Option<String>,
    pub description: String,
    pub action: HistoryAction,
}

/// Append-only ledger of history records, one per observed mutation.
///
/// Version assignment is read-then-increment and deliberately not wrapped in
/// a transaction; the conditional write on `(collectionTag, contentId,
/// version)` turns a lost race into a [`HistoryError::VersionConflict`]
/// instead of a silent duplicate.
#[derive(Clone)]
pub struct HistoryStore {
    repo: Arc<dyn Repository>,
}

impl HistoryStore {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Append a record, assigning the next version for its document
    /// (`last + 1`, or 0 when no history exists yet).
    pub fn append(&self, entry: NewHistoryEntry) -> HistoryResult<HistoryRecord> {
        let version = self
            .latest_version(&entry.collection_tag, &entry.content_id)?
            .map(|last| last + 1)
            .unwrap_or(0);

        let now = chrono::Utc::now();
        let record = HistoryRecord {
            collection_tag: entry.collection_tag,
            content_id: entry.content_id.clone(),
            content_ids: vec![entry.content_id],
            diff: entry.diff,
            original: entry.original,
            updated: entry.updated,
            user: entry.user,
            actor_id: entry.actor_id,
            reason: entry.reason,
            description: entry.description,
            action: entry.action,
            version,
            created_at: now,
            updated_at: now,
        };

        let document = serde_json::to_value(&record)
            .map_err(|e| HistoryError::Serialization(e.to_string()))?;
        match self.repo.insert_unique(
            HISTORY_COLLECTION,
            document,
            &["collectionTag", "contentId", "version"],
        ) {
            Ok(_) => {
                tracing::debug!(
                    collection_tag = %record.collection_tag,
                    content_id = %record.content_id,
                    version = record.version,
                    action = ?record.action,
                    "appended history record"
                );
                Ok(record)
            }
            Err(RepoError::Conflict { .. }) => Err(HistoryError::VersionConflict {
                collection_tag: record.collection_tag,
                content_id: record.content_id,
                version,
            }),
            Err(other) => Err(other.into()),
        }
    }

    /// All records for a document, ascending by version.
    pub fn records_for(
        &self,
        collection_tag: &str,
        content_id: &DocumentId,
    ) -> HistoryResult<Vec<HistoryRecord>> {
        let filter = Filter::new()
            .eq("collectionTag", collection_tag)
            .eq("contentId", content_id.as_str());
        let documents = self.repo.find_many(HISTORY_COLLECTION, &filter)?;

        let mut records = Vec::with_capacity(documents.len());
        for document in documents {
            let record: HistoryRecord = serde_json::from_value(document)
                .map_err(|e| HistoryError::Serialization(e.to_string()))?;
            records.push(record);
        }
        records.sort_by_key(|record| record.version);
        Ok(records)
    }

    /// The highest version recorded for a document, if any.
    pub fn latest_version(
        &self,
        collection_tag: &str,
        content_id: &DocumentId,
    ) -> HistoryResult<Option<u64>> {
        Ok(self
            .records_for(collection_tag, content_id)?
            .last()
            .map(|record| record.version))
    }

    /// Check that a document's stored version sequence is strictly
    /// increasing with no duplicates.
    pub fn verify_versions(
        &self,
        collection_tag: &str,
        content_id: &DocumentId,
    ) -> HistoryResult<()> {
        let records = self.records_for(collection_tag, content_id)?;
        for pair in records.windows(2) {
            if pair[1].version <= pair[0].version {
                return Err(HistoryError::BrokenVersionChain {
                    collection_tag: collection_tag.to_string(),
                    content_id: content_id.clone(),
                    reason: format!(
                        "version {} follows version {}",
                        pair[1].version, pair[0].version
                    ),
                });
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore").finish_non_exhaustive()
    }
}
