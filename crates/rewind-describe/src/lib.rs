//! Change description generator for Rewind.
//!
//! Translates a structural diff of the three-level course -> section -> card
//! content tree into prose. Each tree level has an ordered list of
//! classification rules evaluated top to bottom; the first match wins and is
//! rendered by that level's formatter.
//!
//! # Key Types
//!
//! - [`describe`] -- Top-level entry point
//! - [`CourseChange`] / [`SectionChange`] / [`CardChange`] -- Classified changes per level
//! - [`ordinal`] -- 1-based ordinal phrasing for zero-based indices

pub mod ordinal;
pub mod rules;
pub mod schema;

pub use ordinal::ordinal;
pub use rules::{classify_course, CardChange, CourseChange, SectionChange};

use rewind_diff::Patch;
use serde_json::Value;

/// Generate a human-readable description of a document change.
///
/// `updated` is consulted for the current names of sections and cards that
/// were edited in place; everything else is read from the patch itself.
pub fn describe(_original: &Value, updated: &Value, patch: &Patch) -> String {
    classify_course(updated, patch).render().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rewind_diff::diff;
    use serde_json::json;

    fn course(name: &str, sections: Value) -> Value {
        json!({
            "content": {"name": name, "description": "d", "duration": 30, "modelType": "course"},
            "children": sections,
            "updatedAt": "2026-01-01T00:00:00Z",
        })
    }

    fn section(name: &str, cards: Value) -> Value {
        json!({
            "content": {"name": name, "modelType": "section"},
            "children": cards,
        })
    }

    fn card(name: &str) -> Value {
        json!({"content": {"name": name, "modelType": "card"}})
    }

    #[test]
    fn course_rename() {
        let before = course("Intro", json!([]));
        let after = course("Intro 101", json!([]));
        let patch = diff(&before, &after).unwrap();
        assert_eq!(
            describe(&before, &after, &patch),
            "Course name was changed from Intro to Intro 101."
        );
    }

    #[test]
    fn course_description_change() {
        let mut before = course("Intro", json!([]));
        let after = before.clone();
        before["content"]["description"] = json!("old text");
        let patch = diff(&before, &after).unwrap();
        assert_eq!(
            describe(&before, &after, &patch),
            "Course description was changed from old text to d."
        );
    }

    #[test]
    fn course_creation() {
        let before = json!({"content": {"name": "Intro"}});
        let after = json!({
            "content": {"name": "Intro", "duration": 0, "modelType": "course"},
            "updatedAt": "2026-01-01T00:00:00Z",
        });
        let patch = diff(&before, &after).unwrap();
        assert_eq!(
            describe(&before, &after, &patch),
            "New course with name Intro was created."
        );
    }

    #[test]
    fn rename_takes_precedence_over_section_changes() {
        let before = course("Intro", json!([section("s1", json!([]))]));
        let after = course("Advanced", json!([]));
        let patch = diff(&before, &after).unwrap();
        assert_eq!(
            describe(&before, &after, &patch),
            "Course name was changed from Intro to Advanced."
        );
    }

    #[test]
    fn section_deleted_at_second_position() {
        let before = course(
            "C",
            json!([section("s1", json!([])), section("s2", json!([])), section("s3", json!([]))]),
        );
        let after = course("C", json!([section("s1", json!([])), section("s3", json!([]))]));
        let patch = diff(&before, &after).unwrap();
        assert_eq!(
            describe(&before, &after, &patch),
            "Section at 2nd position with name s2 was deleted."
        );
    }

    #[test]
    fn section_added() {
        let before = course("C", json!([section("s1", json!([]))]));
        let after = course("C", json!([section("s1", json!([])), section("s2", json!([]))]));
        let patch = diff(&before, &after).unwrap();
        assert_eq!(
            describe(&before, &after, &patch),
            "New section added at 2nd position with name s2."
        );
    }

    #[test]
    fn section_renamed() {
        let before = course("C", json!([section("s1", json!([]))]));
        let after = course("C", json!([section("s1 new", json!([]))]));
        let patch = diff(&before, &after).unwrap();
        assert_eq!(
            describe(&before, &after, &patch),
            "Section name was changed from s1 to s1 new."
        );
    }

    #[test]
    fn card_added_under_section_header() {
        let before = course("C", json!([section("s1", json!([card("c1")]))]));
        let after = course("C", json!([section("s1", json!([card("c1"), card("c2")]))]));
        let patch = diff(&before, &after).unwrap();
        assert_eq!(
            describe(&before, &after, &patch),
            "Changes made to 1st section with name s1:\nNew Card with name c2 was created."
        );
    }

    #[test]
    fn card_deleted_under_section_header() {
        let before = course("C", json!([section("s1", json!([card("c1"), card("c2")]))]));
        let after = course("C", json!([section("s1", json!([card("c1")]))]));
        let patch = diff(&before, &after).unwrap();
        assert_eq!(
            describe(&before, &after, &patch),
            "Changes made to 1st section with name s1:\nCard at 2nd position with name c2 was deleted."
        );
    }

    #[test]
    fn card_update_collapses_to_single_message() {
        let mut cards_before = json!([card("c1")]);
        cards_before[0]["content"]["body"] = json!("old body");
        let mut cards_after = json!([card("c1")]);
        cards_after[0]["content"]["body"] = json!("new body");

        let before = course("C", json!([section("s1", cards_before)]));
        let after = course("C", json!([section("s1", cards_after)]));
        let patch = diff(&before, &after).unwrap();
        assert_eq!(
            describe(&before, &after, &patch),
            "Changes made to 1st section with name s1:\nCard at 1st position with name c1 was updated."
        );
    }

    #[test]
    fn multiple_section_changes_are_blank_line_separated() {
        let before = course(
            "C",
            json!([section("s1", json!([card("c1")])), section("s2", json!([]))]),
        );
        let after = course(
            "C",
            json!([section("s1", json!([card("c1"), card("c2")])), ]),
        );
        let patch = diff(&before, &after).unwrap();
        let text = describe(&before, &after, &patch);
        assert!(text.contains("Changes made to 1st section with name s1:"));
        assert!(text.contains("New Card with name c2 was created."));
        assert!(text.contains("Section at 2nd position with name s2 was deleted."));
        assert!(text.contains("\n\n"), "section blocks are separated by a blank line: {text}");
    }

    #[test]
    fn names_are_trimmed_in_prose() {
        let before = course("  Intro  ", json!([]));
        let after = course("  Intro 101  ", json!([]));
        let patch = diff(&before, &after).unwrap();
        assert_eq!(
            describe(&before, &after, &patch),
            "Course name was changed from Intro to Intro 101."
        );
    }
}
