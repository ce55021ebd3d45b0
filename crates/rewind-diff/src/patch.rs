//! The patch representation and its wire form.
//!
//! A [`Patch`] mirrors the shape of the values it was computed from. On the
//! wire (and therefore in persisted history records) it uses the compact
//! delta encoding the description heuristics were written against:
//!
//! - changed leaf: `[old, new]`
//! - added leaf: `[new]`
//! - removed leaf: `[old, 0, 0]` (trailing zeros = pure removal, no move)
//! - nested object: a JSON object of field name -> patch
//! - sequence: a JSON object with an `"_t": "a"` marker, entries keyed by
//!   new-array index, and removals keyed by the original index behind an
//!   underscore sentinel (`"_2": [old, 0, 0]`)

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};

use crate::error::{DiffError, DiffResult};

/// Marker key identifying a sequence patch on the wire.
const ARRAY_MARKER_KEY: &str = "_t";
const ARRAY_MARKER_VALUE: &str = "a";

/// Kind code for a pure removal in the 3-element wire form.
const KIND_REMOVED: u64 = 0;
/// Kind code for an array move. Never produced by this engine.
const KIND_MOVED: u64 = 3;

/// A structural patch between two tree-shaped values.
#[derive(Clone, Debug, PartialEq)]
pub enum Patch {
    /// A value that exists only in the new state.
    Added(Value),
    /// A leaf whose value changed: `(old, new)`.
    Changed(Value, Value),
    /// A value that exists only in the old state.
    Removed(Value),
    /// Nested changes inside an object, keyed by field name.
    Object(BTreeMap<String, Patch>),
    /// Changes inside an ordered sequence.
    Array(ArrayPatch),
}

/// Changes inside an ordered sequence.
///
/// `entries` are keyed by index into the *new* array and hold either
/// [`Patch::Added`] (an inserted element) or a nested patch (an element
/// modified in place). `removed` is keyed by index into the *original*
/// array.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArrayPatch {
    pub entries: BTreeMap<usize, Patch>,
    pub removed: BTreeMap<usize, Value>,
}

impl ArrayPatch {
    /// Returns `true` if there are no changes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.removed.is_empty()
    }
}

impl Patch {
    /// The added value, if this is an addition.
    pub fn as_added(&self) -> Option<&Value> {
        match self {
            Patch::Added(v) => Some(v),
            _ => None,
        }
    }

    /// The `(old, new)` pair, if this is a leaf change.
    pub fn as_changed(&self) -> Option<(&Value, &Value)> {
        match self {
            Patch::Changed(old, new) => Some((old, new)),
            _ => None,
        }
    }

    /// The removed value, if this is a removal.
    pub fn as_removed(&self) -> Option<&Value> {
        match self {
            Patch::Removed(v) => Some(v),
            _ => None,
        }
    }

    /// The nested field map, if this is an object patch.
    pub fn as_object(&self) -> Option<&BTreeMap<String, Patch>> {
        match self {
            Patch::Object(map) => Some(map),
            _ => None,
        }
    }

    /// The sequence changes, if this is an array patch.
    pub fn as_array(&self) -> Option<&ArrayPatch> {
        match self {
            Patch::Array(ap) => Some(ap),
            _ => None,
        }
    }

    /// Look up a nested patch by field name (object patches only).
    pub fn get(&self, key: &str) -> Option<&Patch> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Encode into the wire form.
    pub fn to_value(&self) -> Value {
        match self {
            Patch::Added(v) => json!([v]),
            Patch::Changed(old, new) => json!([old, new]),
            Patch::Removed(v) => json!([v, KIND_REMOVED, KIND_REMOVED]),
            Patch::Object(map) => {
                let mut out = Map::new();
                for (key, nested) in map {
                    out.insert(key.clone(), nested.to_value());
                }
                Value::Object(out)
            }
            Patch::Array(ap) => {
                let mut out = Map::new();
                out.insert(ARRAY_MARKER_KEY.into(), json!(ARRAY_MARKER_VALUE));
                for (index, nested) in &ap.entries {
                    out.insert(index.to_string(), nested.to_value());
                }
                for (index, removed) in &ap.removed {
                    out.insert(
                        format!("_{index}"),
                        json!([removed, KIND_REMOVED, KIND_REMOVED]),
                    );
                }
                Value::Object(out)
            }
        }
    }

    /// Decode from the wire form.
    pub fn from_value(value: &Value) -> DiffResult<Self> {
        match value {
            Value::Array(items) => Self::from_leaf(items),
            Value::Object(map) => {
                let is_sequence = map
                    .get(ARRAY_MARKER_KEY)
                    .and_then(Value::as_str)
                    .map(|m| m == ARRAY_MARKER_VALUE)
                    .unwrap_or(false);
                if is_sequence {
                    Self::from_sequence(map)
                } else {
                    let mut out = BTreeMap::new();
                    for (key, nested) in map {
                        out.insert(key.clone(), Self::from_value(nested)?);
                    }
                    Ok(Patch::Object(out))
                }
            }
            other => Err(DiffError::MalformedPatch(format!(
                "expected array or object, got {other}"
            ))),
        }
    }

    fn from_leaf(items: &[Value]) -> DiffResult<Self> {
        match items {
            [new] => Ok(Patch::Added(new.clone())),
            [old, new] => Ok(Patch::Changed(old.clone(), new.clone())),
            [old, _, kind] => match kind.as_u64() {
                Some(KIND_REMOVED) => Ok(Patch::Removed(old.clone())),
                Some(KIND_MOVED) => Err(DiffError::UnsupportedMove(KIND_MOVED)),
                Some(other) => Err(DiffError::UnsupportedMove(other)),
                None => Err(DiffError::MalformedPatch(
                    "non-numeric kind code in 3-element entry".into(),
                )),
            },
            _ => Err(DiffError::MalformedPatch(format!(
                "leaf entry must have 1-3 elements, got {}",
                items.len()
            ))),
        }
    }

    fn from_sequence(map: &Map<String, Value>) -> DiffResult<Self> {
        let mut out = ArrayPatch::default();
        for (key, nested) in map {
            if key == ARRAY_MARKER_KEY {
                continue;
            }
            if let Some(raw_index) = key.strip_prefix('_') {
                let index: usize = raw_index.parse().map_err(|_| {
                    DiffError::MalformedPatch(format!("bad removal key `{key}`"))
                })?;
                match Self::from_value(nested)? {
                    Patch::Removed(value) => {
                        out.removed.insert(index, value);
                    }
                    _ => {
                        return Err(DiffError::MalformedPatch(format!(
                            "removal key `{key}` does not hold a removal entry"
                        )))
                    }
                }
            } else {
                let index: usize = key.parse().map_err(|_| {
                    DiffError::MalformedPatch(format!("bad sequence index `{key}`"))
                })?;
                out.entries.insert(index, Self::from_value(nested)?);
            }
        }
        Ok(Patch::Array(out))
    }
}

impl Serialize for Patch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Patch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Patch::from_value(&value).map_err(D::Error::custom)
    }
}
