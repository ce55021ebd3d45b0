use serde_json::Value;

use rewind_types::{DocumentId, ID_KEY};

use crate::error::{RepoError, RepoResult};
use crate::query::{Filter, MutationMeta, UpdateSpec};

/// Read the identity field of a document.
pub fn document_id(document: &Value) -> RepoResult<DocumentId> {
    let raw = document
        .get(ID_KEY)
        .and_then(Value::as_str)
        .ok_or(RepoError::MissingId)?;
    DocumentId::parse(raw).map_err(|_| RepoError::MissingId)
}

/// Storage boundary for versioned documents.
///
/// Documents are JSON objects carrying their id under the reserved identity
/// field. Implementations must:
/// - fire every registered [`MutationInterceptor`] before a `save`,
///   `update_many`, or `remove` commits, and never let an interceptor
///   failure abort the mutation (interceptors are best-effort);
/// - process bulk-update matches sequentially in match order, so derived
///   records keep a single global append order;
/// - reject `insert_unique` when another document matches on all named keys.
pub trait Repository: Send + Sync {
    /// Fetch a document by id. `Ok(None)` when it does not exist.
    fn find_by_id(&self, collection: &str, id: &DocumentId) -> RepoResult<Option<Value>>;

    /// Fetch all documents matching the filter, in the collection's natural
    /// (insertion) order.
    fn find_many(&self, collection: &str, filter: &Filter) -> RepoResult<Vec<Value>>;

    /// Insert a new document, generating an id if it has none. Fires no
    /// interceptors: creation produces no history.
    fn insert(&self, collection: &str, document: Value) -> RepoResult<DocumentId>;

    /// Insert a new document, rejecting the write with
    /// [`RepoError::Conflict`](crate::RepoError::Conflict) when an existing
    /// document matches the new one on every named key. The existence check
    /// and the write are atomic.
    fn insert_unique(
        &self,
        collection: &str,
        document: Value,
        keys: &[&str],
    ) -> RepoResult<DocumentId>;

    /// Persist an in-memory instance over its stored state (upsert by id).
    /// Fires `before_save` on every interceptor first.
    fn save(&self, collection: &str, instance: &Value, meta: &MutationMeta) -> RepoResult<()>;

    /// Apply an update spec to every document matching the filter. Fires
    /// `before_update_many` with the matched pre-images first. Returns the
    /// number of documents updated.
    fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        spec: &UpdateSpec,
        meta: &MutationMeta,
    ) -> RepoResult<u64>;

    /// Remove a document. Fires `before_remove` first. Returns `true` if the
    /// document existed.
    fn remove(&self, collection: &str, instance: &Value, meta: &MutationMeta) -> RepoResult<bool>;
}

/// Pre-commit lifecycle hooks on document mutations.
///
/// Hooks run before the mutation is applied and may read and write other
/// collections through the supplied repository handle. A hook error is
/// logged by the repository and otherwise ignored; the triggering mutation
/// always proceeds.
pub trait MutationInterceptor: Send + Sync {
    /// A direct-instance save is about to commit. `instance` is the pending
    /// post-image; the persisted pre-image can be re-fetched by id.
    fn before_save(
        &self,
        repo: &dyn Repository,
        collection: &str,
        instance: &Value,
        meta: &MutationMeta,
    ) -> RepoResult<()>;

    /// A bulk update is about to commit. `matched` holds the current state
    /// of every document the filter matched, in match order.
    fn before_update_many(
        &self,
        repo: &dyn Repository,
        collection: &str,
        matched: &[Value],
        spec: &UpdateSpec,
        meta: &MutationMeta,
    ) -> RepoResult<()>;

    /// A removal is about to commit. `instance` is the document being
    /// removed.
    fn before_remove(
        &self,
        repo: &dyn Repository,
        collection: &str,
        instance: &Value,
        meta: &MutationMeta,
    ) -> RepoResult<()>;
}
