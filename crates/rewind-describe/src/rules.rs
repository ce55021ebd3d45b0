//! Ordered classification rules for each level of the content tree.
//!
//! Every level is classified into a tagged variant by an ordered rule list
//! (first match wins), then rendered. Keeping classification separate from
//! formatting makes each heuristic testable on its own.

use rewind_diff::Patch;
use serde_json::{json, Value};

use crate::ordinal::ordinal;
use crate::schema::{
    child, content_name, has_model_type, text, CHILDREN, CONTENT, DESCRIPTION, DURATION,
    MODEL_CARD, MODEL_SECTION, NAME, UPDATED_AT,
};

/// Classified change at the course (document) level.
#[derive(Clone, Debug, PartialEq)]
pub enum CourseChange {
    /// The document was written for the first time.
    Created { name: String },
    /// The course name changed.
    Renamed { old: String, new: String },
    /// The course description changed.
    Redescribed { old: String, new: String },
    /// Changes confined to the section list.
    SectionEdits(Vec<SectionChange>),
}

/// Classified change at the section level.
#[derive(Clone, Debug, PartialEq)]
pub enum SectionChange {
    /// A new section was inserted.
    Added { index: usize, name: String },
    /// A section was removed.
    Deleted { index: usize, name: String },
    /// The section name changed.
    Renamed { old: String, new: String },
    /// Changes confined to the section's card list.
    Edited {
        index: usize,
        name: String,
        cards: Vec<CardChange>,
    },
}

/// Classified change at the card level.
///
/// All non-creation card edits collapse into `Updated` regardless of which
/// field changed; per-field card descriptions are deliberately not produced.
#[derive(Clone, Debug, PartialEq)]
pub enum CardChange {
    Added { name: String },
    Deleted { index: usize, name: String },
    Updated { index: usize, name: String },
}

/// Classify a course-level patch. Rules, first match wins:
///
/// 1. fresh `updatedAt` plus a duration added as 0 -> `Created`
/// 2. two-element name change -> `Renamed`
/// 3. two-element description change -> `Redescribed`
/// 4. otherwise descend into `children`
pub fn classify_course(updated: &Value, patch: &Patch) -> CourseChange {
    let content = patch.get(CONTENT);

    let fresh_timestamp = matches!(patch.get(UPDATED_AT), Some(Patch::Added(_)));
    let zero_duration = content
        .and_then(|c| c.get(DURATION))
        .and_then(Patch::as_added)
        == Some(&json!(0));
    if fresh_timestamp && zero_duration {
        return CourseChange::Created {
            name: created_name(updated, content),
        };
    }

    if let Some((old, new)) = content.and_then(|c| c.get(NAME)).and_then(Patch::as_changed) {
        return CourseChange::Renamed {
            old: text(old),
            new: text(new),
        };
    }

    if let Some((old, new)) = content
        .and_then(|c| c.get(DESCRIPTION))
        .and_then(Patch::as_changed)
    {
        return CourseChange::Redescribed {
            old: text(old),
            new: text(new),
        };
    }

    let mut edits = Vec::new();
    if let Some(children) = patch.get(CHILDREN).and_then(Patch::as_array) {
        for (&index, entry) in &children.entries {
            edits.push(classify_section(updated, entry, index));
        }
        for (&index, removed) in &children.removed {
            edits.push(SectionChange::Deleted {
                index,
                name: content_name(removed),
            });
        }
    }
    CourseChange::SectionEdits(edits)
}

/// The name of a freshly created course: prefer the name recorded in the
/// patch, fall back to the updated snapshot.
fn created_name(updated: &Value, content: Option<&Patch>) -> String {
    let from_patch = content.and_then(|c| c.get(NAME)).and_then(|name| {
        name.as_changed()
            .map(|(_, new)| new)
            .or_else(|| name.as_added())
    });
    match from_patch {
        Some(name) => text(name),
        None => content_name(updated),
    }
}

/// Classify a section-level patch. Rules, first match wins:
///
/// 1. one-element addition tagged "section" -> `Added`
/// 2. two-element name change -> `Renamed`
/// 3. otherwise descend into the section's cards
pub fn classify_section(updated: &Value, patch: &Patch, index: usize) -> SectionChange {
    if let Some(value) = patch.as_added() {
        if has_model_type(value, MODEL_SECTION) {
            return SectionChange::Added {
                index,
                name: content_name(value),
            };
        }
    }

    if let Some((old, new)) = patch
        .get(CONTENT)
        .and_then(|c| c.get(NAME))
        .and_then(Patch::as_changed)
    {
        return SectionChange::Renamed {
            old: text(old),
            new: text(new),
        };
    }

    let name = child(updated, index).map(content_name).unwrap_or_default();
    let mut cards = Vec::new();
    if let Some(children) = patch.get(CHILDREN).and_then(Patch::as_array) {
        for (&card_index, entry) in &children.entries {
            cards.push(classify_card(updated, entry, card_index, index));
        }
        for (&card_index, removed) in &children.removed {
            cards.push(CardChange::Deleted {
                index: card_index,
                name: content_name(removed),
            });
        }
    }
    SectionChange::Edited { index, name, cards }
}

/// Classify a card-level patch: a tagged one-element addition is a creation;
/// everything else is an update.
pub fn classify_card(
    updated: &Value,
    patch: &Patch,
    index: usize,
    section_index: usize,
) -> CardChange {
    if let Some(value) = patch.as_added() {
        if has_model_type(value, MODEL_CARD) {
            return CardChange::Added {
                name: content_name(value),
            };
        }
    }

    let name = child(updated, section_index)
        .and_then(|section| child(section, index))
        .map(content_name)
        .unwrap_or_default();
    CardChange::Updated { index, name }
}

impl CourseChange {
    /// Render to prose. Section blocks are each preceded by a blank line;
    /// the caller trims the final result.
    pub fn render(&self) -> String {
        match self {
            CourseChange::Created { name } => {
                format!("New course with name {name} was created.\n")
            }
            CourseChange::Renamed { old, new } => {
                format!("Course name was changed from {old} to {new}.\n")
            }
            CourseChange::Redescribed { old, new } => {
                format!("Course description was changed from {old} to {new}.\n")
            }
            CourseChange::SectionEdits(edits) => {
                let mut out = String::new();
                for edit in edits {
                    out.push('\n');
                    out.push_str(&edit.render());
                }
                out
            }
        }
    }
}

impl SectionChange {
    pub fn render(&self) -> String {
        match self {
            SectionChange::Added { index, name } => {
                format!(
                    "New section added at {} position with name {name}.\n",
                    ordinal(*index)
                )
            }
            SectionChange::Deleted { index, name } => {
                format!(
                    "Section at {} position with name {name} was deleted.\n",
                    ordinal(*index)
                )
            }
            SectionChange::Renamed { old, new } => {
                format!("Section name was changed from {old} to {new}.\n")
            }
            SectionChange::Edited { index, name, cards } => {
                let mut out = format!(
                    "Changes made to {} section with name {name}:\n",
                    ordinal(*index)
                );
                for card in cards {
                    out.push_str(&card.render());
                }
                out
            }
        }
    }
}

impl CardChange {
    pub fn render(&self) -> String {
        match self {
            CardChange::Added { name } => {
                format!("New Card with name {name} was created.\n")
            }
            CardChange::Deleted { index, name } => {
                format!(
                    "Card at {} position with name {name} was deleted.\n",
                    ordinal(*index)
                )
            }
            CardChange::Updated { index, name } => {
                format!(
                    "Card at {} position with name {name} was updated.\n",
                    ordinal(*index)
                )
            }
        }
    }
}
