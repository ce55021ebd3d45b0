use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use rewind_types::{DocumentId, ID_KEY};

use crate::error::{RepoError, RepoResult};
use crate::query::{Filter, MutationMeta, UpdateSpec};
use crate::traits::{document_id, MutationInterceptor, Repository};

/// In-memory repository for tests, local demos, and embedding.
///
/// Collections are vectors in insertion order behind a `RwLock`; documents
/// are cloned on read/write. Interceptors fire before the write lock is
/// taken, so hooks are free to read and write other collections.
pub struct InMemoryRepository {
    collections: RwLock<HashMap<String, Vec<(DocumentId, Value)>>>,
    interceptors: RwLock<Vec<Arc<dyn MutationInterceptor>>>,
}

impl InMemoryRepository {
    /// Create a new empty repository.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            interceptors: RwLock::new(Vec::new()),
        }
    }

    /// Register a pre-commit interceptor. Interceptors fire in registration
    /// order.
    pub fn register_interceptor(&self, interceptor: Arc<dyn MutationInterceptor>) {
        self.interceptors
            .write()
            .expect("lock poisoned")
            .push(interceptor);
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .expect("lock poisoned")
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Returns `true` if the collection is absent or empty.
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn notify(&self, collection: &str, op: &'static str, hook: impl Fn(&dyn MutationInterceptor) -> RepoResult<()>) {
        let interceptors = self.interceptors.read().expect("lock poisoned").clone();
        for interceptor in interceptors {
            if let Err(error) = hook(interceptor.as_ref()) {
                // History is best-effort: the mutation proceeds regardless.
                tracing::warn!(
                    collection,
                    op,
                    %error,
                    "mutation interceptor failed; proceeding with the mutation"
                );
            }
        }
    }

    fn insert_locked(
        state: &mut HashMap<String, Vec<(DocumentId, Value)>>,
        collection: &str,
        mut document: Value,
        unique_keys: &[&str],
    ) -> RepoResult<DocumentId> {
        let obj = document.as_object_mut().ok_or(RepoError::NotAnObject)?;
        let id = match obj.get(ID_KEY).and_then(Value::as_str) {
            Some(raw) => DocumentId::parse(raw).map_err(|_| RepoError::MissingId)?,
            None => {
                let id = DocumentId::new();
                obj.insert(ID_KEY.into(), Value::String(id.to_string()));
                id
            }
        };

        let docs = state.entry(collection.to_string()).or_default();
        if docs.iter().any(|(existing_id, _)| *existing_id == id) {
            return Err(RepoError::Conflict {
                collection: collection.to_string(),
                keys: vec![ID_KEY.to_string()],
            });
        }
        if !unique_keys.is_empty() {
            let clashes = docs.iter().any(|(_, existing)| {
                unique_keys
                    .iter()
                    .all(|key| existing.get(*key) == document.get(*key))
            });
            if clashes {
                return Err(RepoError::Conflict {
                    collection: collection.to_string(),
                    keys: unique_keys.iter().map(|k| k.to_string()).collect(),
                });
            }
        }

        docs.push((id.clone(), document));
        Ok(id)
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.collections.read().expect("lock poisoned");
        let counts: HashMap<&String, usize> =
            state.iter().map(|(name, docs)| (name, docs.len())).collect();
        f.debug_struct("InMemoryRepository")
            .field("collections", &counts)
            .finish()
    }
}

impl Repository for InMemoryRepository {
    fn find_by_id(&self, collection: &str, id: &DocumentId) -> RepoResult<Option<Value>> {
        let state = self.collections.read().expect("lock poisoned");
        Ok(state.get(collection).and_then(|docs| {
            docs.iter()
                .find(|(doc_id, _)| doc_id == id)
                .map(|(_, doc)| doc.clone())
        }))
    }

    fn find_many(&self, collection: &str, filter: &Filter) -> RepoResult<Vec<Value>> {
        let state = self.collections.read().expect("lock poisoned");
        Ok(state
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, doc)| filter.matches(doc))
                    .map(|(_, doc)| doc.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn insert(&self, collection: &str, document: Value) -> RepoResult<DocumentId> {
        let mut state = self.collections.write().expect("lock poisoned");
        Self::insert_locked(&mut state, collection, document, &[])
    }

    fn insert_unique(
        &self,
        collection: &str,
        document: Value,
        keys: &[&str],
    ) -> RepoResult<DocumentId> {
        let mut state = self.collections.write().expect("lock poisoned");
        Self::insert_locked(&mut state, collection, document, keys)
    }

    fn save(&self, collection: &str, instance: &Value, meta: &MutationMeta) -> RepoResult<()> {
        let id = document_id(instance)?;
        self.notify(collection, "save", |interceptor| {
            interceptor.before_save(self, collection, instance, meta)
        });

        let mut state = self.collections.write().expect("lock poisoned");
        let docs = state.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|(doc_id, _)| *doc_id == id) {
            Some((_, slot)) => *slot = instance.clone(),
            None => docs.push((id, instance.clone())),
        }
        Ok(())
    }

    fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        spec: &UpdateSpec,
        meta: &MutationMeta,
    ) -> RepoResult<u64> {
        let matched = self.find_many(collection, filter)?;
        self.notify(collection, "update_many", |interceptor| {
            interceptor.before_update_many(self, collection, &matched, spec, meta)
        });

        let mut state = self.collections.write().expect("lock poisoned");
        let mut updated = 0u64;
        if let Some(docs) = state.get_mut(collection) {
            for (_, doc) in docs.iter_mut() {
                if filter.matches(doc) {
                    spec.apply(doc);
                    updated += 1;
                }
            }
        }
        Ok(updated)
    }

    fn remove(&self, collection: &str, instance: &Value, meta: &MutationMeta) -> RepoResult<bool> {
        let id = document_id(instance)?;
        self.notify(collection, "remove", |interceptor| {
            interceptor.before_remove(self, collection, instance, meta)
        });

        let mut state = self.collections.write().expect("lock poisoned");
        let Some(docs) = state.get_mut(collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|(doc_id, _)| *doc_id != id);
        Ok(docs.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    /// Records every hook invocation, including what the persisted
    /// pre-image looked like at hook time.
    #[derive(Default)]
    struct Probe {
        events: Mutex<Vec<String>>,
    }

    impl Probe {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl MutationInterceptor for Probe {
        fn before_save(
            &self,
            repo: &dyn Repository,
            collection: &str,
            instance: &Value,
            _meta: &MutationMeta,
        ) -> RepoResult<()> {
            let id = document_id(instance)?;
            let stored = repo.find_by_id(collection, &id)?;
            let pre_name = stored
                .as_ref()
                .and_then(|doc| doc.get("name"))
                .and_then(Value::as_str)
                .unwrap_or("<none>")
                .to_string();
            self.events.lock().unwrap().push(format!("save:{pre_name}"));
            Ok(())
        }

        fn before_update_many(
            &self,
            _repo: &dyn Repository,
            _collection: &str,
            matched: &[Value],
            _spec: &UpdateSpec,
            _meta: &MutationMeta,
        ) -> RepoResult<()> {
            for doc in matched {
                let id = document_id(doc)?;
                self.events.lock().unwrap().push(format!("bulk:{id}"));
            }
            Ok(())
        }

        fn before_remove(
            &self,
            _repo: &dyn Repository,
            _collection: &str,
            instance: &Value,
            _meta: &MutationMeta,
        ) -> RepoResult<()> {
            let id = document_id(instance)?;
            self.events.lock().unwrap().push(format!("remove:{id}"));
            Ok(())
        }
    }

    struct AlwaysFails;

    impl MutationInterceptor for AlwaysFails {
        fn before_save(
            &self,
            _repo: &dyn Repository,
            _collection: &str,
            _instance: &Value,
            _meta: &MutationMeta,
        ) -> RepoResult<()> {
            Err(RepoError::Persistence("hook exploded".into()))
        }

        fn before_update_many(
            &self,
            _repo: &dyn Repository,
            _collection: &str,
            _matched: &[Value],
            _spec: &UpdateSpec,
            _meta: &MutationMeta,
        ) -> RepoResult<()> {
            Err(RepoError::Persistence("hook exploded".into()))
        }

        fn before_remove(
            &self,
            _repo: &dyn Repository,
            _collection: &str,
            _instance: &Value,
            _meta: &MutationMeta,
        ) -> RepoResult<()> {
            Err(RepoError::Persistence("hook exploded".into()))
        }
    }

    #[test]
    fn insert_generates_missing_id() {
        let repo = InMemoryRepository::new();
        let id = repo.insert("Course", json!({"name": "Intro"})).unwrap();

        let stored = repo.find_by_id("Course", &id).unwrap().unwrap();
        assert_eq!(stored["name"], json!("Intro"));
        assert_eq!(stored[ID_KEY], json!(id.to_string()));
    }

    #[test]
    fn insert_keeps_supplied_id() {
        let repo = InMemoryRepository::new();
        let id = repo
            .insert("Course", json!({"_id": "course-1", "name": "Intro"}))
            .unwrap();
        assert_eq!(id.as_str(), "course-1");
    }

    #[test]
    fn insert_rejects_duplicate_id() {
        let repo = InMemoryRepository::new();
        repo.insert("Course", json!({"_id": "c1"})).unwrap();
        let err = repo.insert("Course", json!({"_id": "c1"})).unwrap_err();
        assert!(matches!(err, RepoError::Conflict { .. }));
    }

    #[test]
    fn insert_rejects_non_objects() {
        let repo = InMemoryRepository::new();
        let err = repo.insert("Course", json!([1, 2])).unwrap_err();
        assert_eq!(err, RepoError::NotAnObject);
    }

    #[test]
    fn insert_unique_rejects_matching_keys() {
        let repo = InMemoryRepository::new();
        repo.insert_unique(
            "History",
            json!({"contentId": "c1", "version": 0}),
            &["contentId", "version"],
        )
        .unwrap();

        let err = repo
            .insert_unique(
                "History",
                json!({"contentId": "c1", "version": 0}),
                &["contentId", "version"],
            )
            .unwrap_err();
        assert_eq!(
            err,
            RepoError::Conflict {
                collection: "History".into(),
                keys: vec!["contentId".into(), "version".into()],
            }
        );

        // A different version for the same content is fine.
        repo.insert_unique(
            "History",
            json!({"contentId": "c1", "version": 1}),
            &["contentId", "version"],
        )
        .unwrap();
    }

    #[test]
    fn find_many_preserves_insertion_order() {
        let repo = InMemoryRepository::new();
        for n in 0..3 {
            repo.insert("Course", json!({"_id": format!("c{n}"), "n": n}))
                .unwrap();
        }
        let all = repo.find_many("Course", &Filter::new()).unwrap();
        let ns: Vec<_> = all.iter().map(|d| d["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![0, 1, 2]);
    }

    #[test]
    fn find_many_applies_filter() {
        let repo = InMemoryRepository::new();
        repo.insert("Course", json!({"_id": "a", "status": "draft"}))
            .unwrap();
        repo.insert("Course", json!({"_id": "b", "status": "live"}))
            .unwrap();

        let drafts = repo
            .find_many("Course", &Filter::new().eq("status", "draft"))
            .unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0]["_id"], json!("a"));
    }

    #[test]
    fn save_upserts_by_id() {
        let repo = InMemoryRepository::new();
        let meta = MutationMeta::new();
        repo.save("Course", &json!({"_id": "c1", "name": "v1"}), &meta)
            .unwrap();
        repo.save("Course", &json!({"_id": "c1", "name": "v2"}), &meta)
            .unwrap();

        assert_eq!(repo.len("Course"), 1);
        let stored = repo
            .find_by_id("Course", &DocumentId::parse("c1").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(stored["name"], json!("v2"));
    }

    #[test]
    fn save_without_id_is_rejected() {
        let repo = InMemoryRepository::new();
        let err = repo
            .save("Course", &json!({"name": "no id"}), &MutationMeta::new())
            .unwrap_err();
        assert_eq!(err, RepoError::MissingId);
    }

    #[test]
    fn hooks_observe_pre_image_before_save_commits() {
        let repo = InMemoryRepository::new();
        let probe = Arc::new(Probe::default());
        repo.register_interceptor(probe.clone());

        let meta = MutationMeta::new();
        repo.insert("Course", json!({"_id": "c1", "name": "v1"}))
            .unwrap();
        repo.save("Course", &json!({"_id": "c1", "name": "v2"}), &meta)
            .unwrap();

        // The hook saw the persisted state ("v1"), not the pending one.
        assert_eq!(probe.events(), vec!["save:v1"]);
    }

    #[test]
    fn insert_fires_no_hooks() {
        let repo = InMemoryRepository::new();
        let probe = Arc::new(Probe::default());
        repo.register_interceptor(probe.clone());

        repo.insert("Course", json!({"_id": "c1"})).unwrap();
        assert!(probe.events().is_empty());
    }

    #[test]
    fn update_many_updates_matches_and_reports_count() {
        let repo = InMemoryRepository::new();
        let probe = Arc::new(Probe::default());
        repo.register_interceptor(probe.clone());

        repo.insert("Course", json!({"_id": "a", "status": "draft"}))
            .unwrap();
        repo.insert("Course", json!({"_id": "b", "status": "draft"}))
            .unwrap();
        repo.insert("Course", json!({"_id": "c", "status": "live"}))
            .unwrap();

        let updated = repo
            .update_many(
                "Course",
                &Filter::new().eq("status", "draft"),
                &UpdateSpec::new().set("status", "archived"),
                &MutationMeta::new(),
            )
            .unwrap();
        assert_eq!(updated, 2);
        assert_eq!(probe.events(), vec!["bulk:a", "bulk:b"]);

        let archived = repo
            .find_many("Course", &Filter::new().eq("status", "archived"))
            .unwrap();
        assert_eq!(archived.len(), 2);
    }

    #[test]
    fn remove_deletes_and_reports_existence() {
        let repo = InMemoryRepository::new();
        repo.insert("Course", json!({"_id": "c1"})).unwrap();

        let doc = json!({"_id": "c1"});
        assert!(repo.remove("Course", &doc, &MutationMeta::new()).unwrap());
        assert!(!repo.remove("Course", &doc, &MutationMeta::new()).unwrap());
        assert!(repo.is_empty("Course"));
    }

    #[test]
    fn failing_hook_never_aborts_the_mutation() {
        let repo = InMemoryRepository::new();
        repo.register_interceptor(Arc::new(AlwaysFails));

        let meta = MutationMeta::new();
        repo.save("Course", &json!({"_id": "c1", "name": "v1"}), &meta)
            .unwrap();
        assert_eq!(repo.len("Course"), 1);

        repo.update_many(
            "Course",
            &Filter::new(),
            &UpdateSpec::new().set("name", "v2"),
            &meta,
        )
        .unwrap();
        assert!(repo.remove("Course", &json!({"_id": "c1"}), &meta).unwrap());
    }
}
