//! Permissive extraction of structured study items from model output.
//!
//! Model responses that are supposed to be JSON arrays arrive wrapped in
//! prose, fenced as markdown, with smart quotes, single quotes, bare keys or
//! trailing commas. [`extract_items`] runs the repair pipeline and converts
//! each element into a typed record, skipping elements that lack required
//! fields.

mod items;
mod lines;
mod merge;
mod repair;
mod scan;

use thiserror::Error;
use tracing::debug;

pub use items::StructuredItem;
pub use lines::{PAIR_SEPARATOR, parse_line_items, parse_line_pairs};
pub use merge::{dedup_items, merge_unique, normalize_identity};
pub use repair::{REPAIR_PIPELINE, RepairStep, repair_json_array};
pub use scan::find_balanced_array;

/// Why no items could be extracted from a response.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("response is empty")]
    Empty,

    #[error("no JSON array could be recovered after {steps} repair steps")]
    NoJsonArray { steps: usize },

    #[error("JSON array held {elements} elements but none was a valid {kind}")]
    NoValidItems { elements: usize, kind: &'static str },
}

/// Extract typed items from a model response.
///
/// Elements that do not convert are dropped; an array with no convertible
/// element is an error so callers can move on to their next fallback.
pub fn extract_items<T: StructuredItem>(text: &str) -> Result<Vec<T>, ExtractError> {
    if text.trim().is_empty() {
        return Err(ExtractError::Empty);
    }
    let (values, step) = repair_json_array(text).ok_or(ExtractError::NoJsonArray {
        steps: REPAIR_PIPELINE.len(),
    })?;

    let elements = values.len();
    let items: Vec<T> = values.iter().filter_map(T::from_value).collect();
    debug!(
        kind = T::KIND,
        step,
        elements,
        items = items.len(),
        "Extracted structured items"
    );
    if items.is_empty() {
        return Err(ExtractError::NoValidItems {
            elements,
            kind: T::KIND,
        });
    }
    Ok(items)
}
