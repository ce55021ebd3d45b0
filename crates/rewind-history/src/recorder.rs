//! The interceptor that turns repository mutations into history records.

use serde_json::{Map, Value};

use rewind_describe::describe;
use rewind_diff::diff;
use rewind_repo::{
    document_id, MutationInterceptor, MutationMeta, RepoError, RepoResult, Repository, UpdateSpec,
};
use rewind_types::DocumentId;

use crate::error::HistoryResult;
use crate::record::{HistoryAction, HistoryRecord};
use crate::store::{HistoryStore, NewHistoryEntry};

/// Observes repository mutations and appends one history record per
/// content-changing mutation.
///
/// Registered as a [`MutationInterceptor`]; the repository fires it before a
/// mutation commits, so the persisted pre-image is still readable. Mutations
/// with an empty diff (identity-only churn included) consume no version and
/// leave no record.
pub struct HistoryRecorder {
    store: HistoryStore,
}

impl HistoryRecorder {
    pub fn new(store: HistoryStore) -> Self {
        Self { store }
    }

    /// Diff, describe, and append. `Ok(None)` when the mutation changed no
    /// content.
    fn record(
        &self,
        collection: &str,
        content_id: DocumentId,
        original: &Value,
        updated: &Value,
        action: HistoryAction,
        meta: &MutationMeta,
    ) -> HistoryResult<Option<HistoryRecord>> {
        let Some(patch) = diff(original, updated) else {
            tracing::debug!(
                collection,
                content_id = %content_id,
                "mutation changed no content; no history record"
            );
            return Ok(None);
        };

        let description = describe(original, updated, &patch);
        let record = self.store.append(NewHistoryEntry {
            collection_tag: collection.to_string(),
            content_id,
            diff: patch,
            original: original.clone(),
            updated: updated.clone(),
            user: meta.user.clone(),
            actor_id: meta.actor_id.clone(),
            reason: meta.reason.clone(),
            description,
            action,
        })?;
        Ok(Some(record))
    }
}

impl std::fmt::Debug for HistoryRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryRecorder").finish_non_exhaustive()
    }
}

impl MutationInterceptor for HistoryRecorder {
    fn before_save(
        &self,
        repo: &dyn Repository,
        collection: &str,
        instance: &Value,
        meta: &MutationMeta,
    ) -> RepoResult<()> {
        // An instance with no id, or no persisted pre-image, is a creation;
        // creations leave no record.
        let Ok(id) = document_id(instance) else {
            return Ok(());
        };
        let Some(pre_image) = repo.find_by_id(collection, &id)? else {
            return Ok(());
        };

        self.record(
            collection,
            id,
            &pre_image,
            instance,
            HistoryAction::Update,
            meta,
        )
        .map(|_| ())
        .map_err(|error| RepoError::Persistence(error.to_string()))
    }

    fn before_update_many(
        &self,
        _repo: &dyn Repository,
        collection: &str,
        matched: &[Value],
        spec: &UpdateSpec,
        meta: &MutationMeta,
    ) -> RepoResult<()> {
        let post_image = spec.as_document();
        for document in matched {
            let id = match document_id(document) {
                Ok(id) => id,
                Err(error) => {
                    tracing::warn!(collection, %error, "skipping history for unidentified document");
                    continue;
                }
            };
            // Diff only the fields the update names, per document.
            let pre_image = spec.subset_of(document);
            if let Err(error) = self.record(
                collection,
                id.clone(),
                &pre_image,
                &post_image,
                HistoryAction::BulkUpdate,
                meta,
            ) {
                tracing::warn!(
                    collection,
                    content_id = %id,
                    %error,
                    "skipping history for one bulk-updated document"
                );
            }
        }
        Ok(())
    }

    fn before_remove(
        &self,
        _repo: &dyn Repository,
        collection: &str,
        instance: &Value,
        meta: &MutationMeta,
    ) -> RepoResult<()> {
        let id = document_id(instance)?;
        // The post-image of a removal is the empty document.
        let post_image = Value::Object(Map::new());
        self.record(
            collection,
            id,
            instance,
            &post_image,
            HistoryAction::Delete,
            meta,
        )
        .map(|_| ())
        .map_err(|error| RepoError::Persistence(error.to_string()))
    }
}
