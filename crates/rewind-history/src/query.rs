//! Flattened human-readable changelog over a document's history.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use rewind_diff::Patch;
use rewind_types::DocumentId;

use crate::error::HistoryResult;
use crate::store::HistoryStore;

/// One changelog row, shaped for direct display.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSummary {
    /// Who made the change, as recorded at mutation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed_by: Option<Value>,
    /// When the record was created.
    pub changed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// The generated prose description, possibly empty.
    pub description: String,
    /// Field-level summary derived from the diff, e.g.
    /// `"modified status from draft to live, name"`.
    pub comment: String,
}

/// Read-side changelog queries. Never mutates history.
pub struct HistoryQueryService {
    store: HistoryStore,
}

impl HistoryQueryService {
    pub fn new(store: HistoryStore) -> Self {
        Self { store }
    }

    /// One summary per history record, oldest first.
    ///
    /// Fields named in `expandable_fields` whose diff is a plain value
    /// change render as `"{field} from {old} to {new}"`; every other changed
    /// top-level field contributes its bare name. Non-expanded names come
    /// before expanded phrases, matching diff key order within each group.
    pub fn list_changes(
        &self,
        collection_tag: &str,
        content_id: &DocumentId,
        expandable_fields: &[&str],
    ) -> HistoryResult<Vec<ChangeSummary>> {
        let records = self.store.records_for(collection_tag, content_id)?;
        Ok(records
            .into_iter()
            .map(|record| ChangeSummary {
                changed_by: record.user,
                changed_at: record.created_at,
                updated_at: record.updated_at,
                description: record.description,
                comment: summarize_diff(&record.diff, expandable_fields),
            })
            .collect())
    }
}

impl std::fmt::Debug for HistoryQueryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryQueryService").finish_non_exhaustive()
    }
}

fn summarize_diff(diff: &Patch, expandable_fields: &[&str]) -> String {
    let mut names = Vec::new();
    let mut phrases = Vec::new();
    if let Some(fields) = diff.as_object() {
        for (field, change) in fields {
            if expandable_fields.contains(&field.as_str()) {
                if let Some((old, new)) = change.as_changed() {
                    phrases.push(format!("{field} from {} to {}", render(old), render(new)));
                    continue;
                }
            }
            names.push(field.clone());
        }
    }
    format!(
        "modified {}",
        names.into_iter().chain(phrases).collect::<Vec<_>>().join(", ")
    )
}

/// Strings render bare; everything else renders as JSON.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
