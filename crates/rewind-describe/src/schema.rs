//! Field names and accessors for the course -> section -> card content tree.
//!
//! This shape belongs to the content being versioned, not to the history
//! engine itself; only the description heuristics depend on it.

use serde_json::Value;

pub const CONTENT: &str = "content";
pub const NAME: &str = "name";
pub const DESCRIPTION: &str = "description";
pub const CHILDREN: &str = "children";
pub const DURATION: &str = "duration";
pub const UPDATED_AT: &str = "updatedAt";
pub const MODEL_TYPE: &str = "modelType";

pub const MODEL_SECTION: &str = "section";
pub const MODEL_CARD: &str = "card";

/// Render a JSON value for prose. String content is trimmed; everything
/// else falls back to its JSON rendering.
pub fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// `node.content.name`, trimmed. Empty when absent.
pub fn content_name(node: &Value) -> String {
    node.get(CONTENT)
        .and_then(|content| content.get(NAME))
        .map(text)
        .unwrap_or_default()
}

/// `node.children[index]`.
pub fn child(node: &Value, index: usize) -> Option<&Value> {
    node.get(CHILDREN)?.get(index)
}

/// `node.content.modelType == tag`.
pub fn has_model_type(node: &Value, tag: &str) -> bool {
    node.get(CONTENT)
        .and_then(|content| content.get(MODEL_TYPE))
        .and_then(Value::as_str)
        .map(|model| model == tag)
        .unwrap_or(false)
}
