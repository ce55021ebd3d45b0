//! Patch computation and application.
//!
//! `diff` normalizes both inputs by stripping the identity field before
//! comparison, so identity churn introduced by the store never shows up as a
//! content change. `unpatch` is the exact left inverse of `diff`; `patch`
//! replays a computed patch forward.

use serde_json::{Map, Value};

use rewind_types::ID_KEY;

use crate::error::{DiffError, DiffResult};
use crate::patch::{ArrayPatch, Patch};

/// Compute the structural diff between two values.
///
/// Returns `None` when `before` and `after` are deeply equal after identity
/// stripping, in which case no history record should be written.
pub fn diff(before: &Value, after: &Value) -> Option<Patch> {
    diff_values(&strip_identity(before), &strip_identity(after))
}

/// Recursively remove the identity field from every object in the tree.
pub fn strip_identity(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, nested) in map {
                if key != ID_KEY {
                    out.insert(key.clone(), strip_identity(nested));
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(strip_identity).collect()),
        other => other.clone(),
    }
}

fn diff_values(old: &Value, new: &Value) -> Option<Patch> {
    if old == new {
        return None;
    }
    match (old, new) {
        (Value::Object(a), Value::Object(b)) => diff_objects(a, b),
        (Value::Array(a), Value::Array(b)) => diff_arrays(a, b),
        _ => Some(Patch::Changed(old.clone(), new.clone())),
    }
}

fn diff_objects(old: &Map<String, Value>, new: &Map<String, Value>) -> Option<Patch> {
    let mut changes = std::collections::BTreeMap::new();

    for (key, old_val) in old {
        match new.get(key) {
            Some(new_val) => {
                if let Some(nested) = diff_values(old_val, new_val) {
                    changes.insert(key.clone(), nested);
                }
            }
            None => {
                changes.insert(key.clone(), Patch::Removed(old_val.clone()));
            }
        }
    }
    for (key, new_val) in new {
        if !old.contains_key(key) {
            changes.insert(key.clone(), Patch::Added(new_val.clone()));
        }
    }

    if changes.is_empty() {
        None
    } else {
        Some(Patch::Object(changes))
    }
}

/// Sequence diff: trim the equal head and tail, then pair the remaining
/// items positionally. Paired items are diffed in place; surplus old items
/// become removals keyed by their original index, surplus new items become
/// additions keyed by their new index. At most one of the two surplus groups
/// is non-empty.
fn diff_arrays(old: &[Value], new: &[Value]) -> Option<Patch> {
    let max_trim = old.len().min(new.len());

    let mut head = 0;
    while head < max_trim && old[head] == new[head] {
        head += 1;
    }
    let mut tail = 0;
    while tail < max_trim - head
        && old[old.len() - 1 - tail] == new[new.len() - 1 - tail]
    {
        tail += 1;
    }

    let old_middle = old.len() - head - tail;
    let new_middle = new.len() - head - tail;
    let paired = old_middle.min(new_middle);

    let mut out = ArrayPatch::default();
    for offset in 0..paired {
        let index = head + offset;
        if let Some(nested) = diff_values(&old[index], &new[index]) {
            out.entries.insert(index, nested);
        }
    }
    for index in (head + paired)..(old.len() - tail) {
        out.removed.insert(index, old[index].clone());
    }
    for index in (head + paired)..(new.len() - tail) {
        out.entries.insert(index, Patch::Added(new[index].clone()));
    }

    if out.is_empty() {
        None
    } else {
        Some(Patch::Array(out))
    }
}

/// Apply a patch forward, transforming the pre-change value into the
/// post-change value in place.
pub fn patch(value: &mut Value, patch: &Patch) -> DiffResult<()> {
    apply(value, patch, "$")
}

fn apply(value: &mut Value, patch: &Patch, context: &str) -> DiffResult<()> {
    match patch {
        Patch::Changed(_, new) => {
            *value = new.clone();
            Ok(())
        }
        Patch::Added(_) | Patch::Removed(_) => Err(DiffError::ShapeMismatch {
            context: context.to_string(),
            expected: "a keyed position for addition/removal entries",
        }),
        Patch::Object(map) => {
            let obj = value.as_object_mut().ok_or_else(|| DiffError::ShapeMismatch {
                context: context.to_string(),
                expected: "an object",
            })?;
            for (key, nested) in map {
                match nested {
                    Patch::Added(new) | Patch::Changed(_, new) => {
                        obj.insert(key.clone(), new.clone());
                    }
                    Patch::Removed(_) => {
                        obj.remove(key);
                    }
                    _ => {
                        let slot = obj.get_mut(key).ok_or_else(|| DiffError::ShapeMismatch {
                            context: format!("{context}.{key}"),
                            expected: "an existing field to descend into",
                        })?;
                        apply(slot, nested, &format!("{context}.{key}"))?;
                    }
                }
            }
            Ok(())
        }
        Patch::Array(ap) => {
            let arr = value.as_array_mut().ok_or_else(|| DiffError::ShapeMismatch {
                context: context.to_string(),
                expected: "an array",
            })?;
            // Removals first (original indices, descending), then additions
            // and in-place changes (new indices, ascending).
            for (&index, _) in ap.removed.iter().rev() {
                if index >= arr.len() {
                    return Err(DiffError::IndexOutOfBounds {
                        index,
                        len: arr.len(),
                    });
                }
                arr.remove(index);
            }
            for (&index, nested) in &ap.entries {
                match nested {
                    Patch::Added(new) => {
                        if index > arr.len() {
                            return Err(DiffError::IndexOutOfBounds {
                                index,
                                len: arr.len(),
                            });
                        }
                        arr.insert(index, new.clone());
                    }
                    _ => {
                        let len = arr.len();
                        let slot =
                            arr.get_mut(index)
                                .ok_or(DiffError::IndexOutOfBounds { index, len })?;
                        apply(slot, nested, &format!("{context}[{index}]"))?;
                    }
                }
            }
            Ok(())
        }
    }
}

/// Apply a patch backward, restoring the pre-change value in place.
///
/// Only the keys named by the patch are touched; fields outside the patch
/// (including the identity field) are left as-is.
pub fn unpatch(value: &mut Value, patch: &Patch) -> DiffResult<()> {
    revert(value, patch, "$")
}

fn revert(value: &mut Value, patch: &Patch, context: &str) -> DiffResult<()> {
    match patch {
        Patch::Changed(old, _) => {
            *value = old.clone();
            Ok(())
        }
        Patch::Added(_) | Patch::Removed(_) => Err(DiffError::ShapeMismatch {
            context: context.to_string(),
            expected: "a keyed position for addition/removal entries",
        }),
        Patch::Object(map) => {
            let obj = value.as_object_mut().ok_or_else(|| DiffError::ShapeMismatch {
                context: context.to_string(),
                expected: "an object",
            })?;
            for (key, nested) in map {
                match nested {
                    Patch::Added(_) => {
                        obj.remove(key);
                    }
                    Patch::Removed(old) | Patch::Changed(old, _) => {
                        obj.insert(key.clone(), old.clone());
                    }
                    _ => {
                        let slot = obj.get_mut(key).ok_or_else(|| DiffError::ShapeMismatch {
                            context: format!("{context}.{key}"),
                            expected: "an existing field to descend into",
                        })?;
                        revert(slot, nested, &format!("{context}.{key}"))?;
                    }
                }
            }
            Ok(())
        }
        Patch::Array(ap) => {
            let arr = value.as_array_mut().ok_or_else(|| DiffError::ShapeMismatch {
                context: context.to_string(),
                expected: "an array",
            })?;
            // In-place changes first (their indices are valid in the new
            // array), then drop additions (descending), then reinsert
            // removals at their original indices (ascending).
            for (&index, nested) in &ap.entries {
                if matches!(nested, Patch::Added(_)) {
                    continue;
                }
                let len = arr.len();
                let slot = arr
                    .get_mut(index)
                    .ok_or(DiffError::IndexOutOfBounds { index, len })?;
                revert(slot, nested, &format!("{context}[{index}]"))?;
            }
            for (&index, nested) in ap.entries.iter().rev() {
                if !matches!(nested, Patch::Added(_)) {
                    continue;
                }
                if index >= arr.len() {
                    return Err(DiffError::IndexOutOfBounds {
                        index,
                        len: arr.len(),
                    });
                }
                arr.remove(index);
            }
            for (&index, old) in &ap.removed {
                if index > arr.len() {
                    return Err(DiffError::IndexOutOfBounds {
                        index,
                        len: arr.len(),
                    });
                }
                arr.insert(index, old.clone());
            }
            Ok(())
        }
    }
}
