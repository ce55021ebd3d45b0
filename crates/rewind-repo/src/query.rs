//! Query, update, and attribution inputs for repository operations.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use rewind_types::DocumentId;

/// Field-equality filter over top-level document fields.
///
/// An empty filter matches every document in the collection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    conditions: BTreeMap<String, Value>,
}

impl Filter {
    /// A filter that matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to equal `value`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.insert(field.into(), value.into());
        self
    }

    /// Returns `true` if the document satisfies every condition.
    pub fn matches(&self, document: &Value) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| document.get(field) == Some(expected))
    }

    /// Returns `true` if there are no conditions.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// The fields a bulk update writes, and their new values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateSpec {
    fields: BTreeMap<String, Value>,
}

impl UpdateSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `field` to `value`.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// The named fields, in sorted order.
    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Returns `true` if the spec names no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Write the spec's values onto a document in place.
    pub fn apply(&self, document: &mut Value) {
        if let Some(obj) = document.as_object_mut() {
            for (field, value) in &self.fields {
                obj.insert(field.clone(), value.clone());
            }
        }
    }

    /// The subset of `document`'s current values for the fields this spec
    /// names: the pre-image of a bulk update. Absent fields are skipped.
    pub fn subset_of(&self, document: &Value) -> Value {
        let mut out = Map::new();
        for field in self.fields.keys() {
            if let Some(current) = document.get(field) {
                out.insert(field.clone(), current.clone());
            }
        }
        Value::Object(out)
    }

    /// The spec's own values as a document: the post-image of a bulk update.
    pub fn as_document(&self) -> Value {
        let mut out = Map::new();
        for (field, value) in &self.fields {
            out.insert(field.clone(), value.clone());
        }
        Value::Object(out)
    }
}

/// Out-of-band attribution for a mutation, passed through to history
/// records unchanged. Every field is optional.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MutationMeta {
    /// Free-form identity of whoever made the change.
    pub user: Option<Value>,
    /// Stable actor id, when the caller has one.
    pub actor_id: Option<DocumentId>,
    /// Free-text reason for the change.
    pub reason: Option<String>,
}

impl MutationMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: impl Into<Value>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_actor(mut self, actor_id: DocumentId) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
