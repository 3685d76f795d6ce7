//! Ordered JSON repair pipeline.
//!
//! Each step is a pure `&str -> String` rewrite applied to the output of the
//! previous one. After the raw text and after every step a strict parse is
//! attempted; the first success wins. New steps are added to
//! [`REPAIR_PIPELINE`] without touching any caller.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, trace};

use crate::scan;

/// A named rewrite in the repair pipeline.
#[derive(Clone, Copy)]
pub struct RepairStep {
    pub name: &'static str,
    pub apply: fn(&str) -> String,
}

impl std::fmt::Debug for RepairStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepairStep").field("name", &self.name).finish()
    }
}

/// Repair steps in application order.
pub const REPAIR_PIPELINE: &[RepairStep] = &[
    RepairStep {
        name: "strip_code_fences",
        apply: strip_code_fences,
    },
    RepairStep {
        name: "locate_array",
        apply: locate_array,
    },
    RepairStep {
        name: "normalize_smart_quotes",
        apply: scan::normalize_smart_quotes,
    },
    RepairStep {
        name: "single_quotes",
        apply: scan::single_quotes_to_double,
    },
    RepairStep {
        name: "quote_keys",
        apply: scan::quote_unquoted_keys,
    },
    RepairStep {
        name: "trailing_commas",
        apply: scan::remove_trailing_commas,
    },
];

/// Markdown code fences with an optional language tag.
static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)```[A-Za-z0-9_+-]*[ \t]*").unwrap());

fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").trim().to_string()
}

fn locate_array(text: &str) -> String {
    match scan::find_balanced_array(text) {
        Some((start, end)) => text[start..end].to_string(),
        None => text.to_string(),
    }
}

/// Strictly parse `text` as an array of items.
///
/// An object whose only array-valued field holds the items (for example
/// `{"flashcards": [...]}`) is unwrapped.
fn parse_strict_array(text: &str) -> Option<Vec<Value>> {
    match serde_json::from_str::<Value>(text.trim()).ok()? {
        Value::Array(items) => Some(items),
        Value::Object(map) => {
            let mut arrays = map.into_iter().filter_map(|(_, v)| match v {
                Value::Array(items) => Some(items),
                _ => None,
            });
            let first = arrays.next()?;
            arrays.next().is_none().then_some(first)
        }
        _ => None,
    }
}

/// Extract a JSON array from free-form model output.
///
/// Returns the parsed elements and the name of the step that produced a
/// parseable text (`"raw"` when no repair was needed), or `None` when every
/// step failed.
#[must_use]
pub fn repair_json_array(text: &str) -> Option<(Vec<Value>, &'static str)> {
    if let Some(items) = parse_strict_array(text) {
        trace!(step = "raw", items = items.len(), "Strict parse succeeded");
        return Some((items, "raw"));
    }

    let mut current = text.to_string();
    for step in REPAIR_PIPELINE {
        current = (step.apply)(&current);
        if let Some(items) = parse_strict_array(&current) {
            debug!(step = step.name, items = items.len(), "JSON repaired");
            return Some((items, step.name));
        }
    }

    debug!(chars = text.len(), "No JSON array could be recovered");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clean_json_needs_no_repair() {
        let (items, step) = repair_json_array(r#"[{"term":"A","definition":"B"}]"#).unwrap();
        assert_eq!(step, "raw");
        assert_eq!(items, vec![json!({"term": "A", "definition": "B"})]);
    }

    #[test]
    fn fenced_sloppy_json_is_repaired() {
        let raw = "```json\n[{term:'A',definition:\"B\"},]\n```";
        let (items, step) = repair_json_array(raw).unwrap();
        assert_eq!(items, vec![json!({"term": "A", "definition": "B"})]);
        assert_eq!(step, "trailing_commas");
    }

    #[test]
    fn smart_quotes_are_normalized() {
        let raw = "[{\u{201C}term\u{201D}: \u{201C}Atom\u{201D}, \u{201C}definition\u{201D}: \u{201C}Smallest unit\u{201D}}]";
        let (items, _) = repair_json_array(raw).unwrap();
        assert_eq!(items[0]["term"], "Atom");
    }

    #[test]
    fn smart_quotes_inside_values_survive_other_repairs() {
        let raw = "[{\"term\": \"Newton\u{2019}s law\", \"definition\": \"He said \u{201C}hi\u{201D} loudly\"},]";
        let (items, step) = repair_json_array(raw).unwrap();
        assert_eq!(step, "trailing_commas");
        assert_eq!(
            items,
            vec![json!({
                "term": "Newton\u{2019}s law",
                "definition": "He said \u{201C}hi\u{201D} loudly"
            })]
        );
    }

    #[test]
    fn prose_around_array_is_ignored() {
        let raw = "Here are your flashcards:\n[{\"term\": \"Cell\", \"definition\": \"Unit of life\"}]\nGood luck!";
        let (items, step) = repair_json_array(raw).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(step, "locate_array");
    }

    #[test]
    fn wrapped_array_is_unwrapped() {
        let raw = r#"{"flashcards": [{"term": "A", "definition": "B"}]}"#;
        let (items, _) = repair_json_array(raw).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn plain_prose_is_rejected() {
        assert!(repair_json_array("I could not find enough material.").is_none());
        assert!(repair_json_array("").is_none());
    }
}
