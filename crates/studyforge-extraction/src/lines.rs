use once_cell::sync::Lazy;
use regex::Regex;

use crate::items::StructuredItem;

/// Separator between the two halves of a line-delimited item.
pub const PAIR_SEPARATOR: &str = "||";

/// List markers a model may put in front of each line.
static LIST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[-*•]\s+|\d+[.)]\s+)").unwrap());

/// Split each line on the first `||` into a trimmed `(left, right)` pair.
///
/// Lines without the separator, or with an empty half, are skipped.
#[must_use]
pub fn parse_line_pairs(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter_map(|line| {
            let line = LIST_MARKER.replace(line.trim(), "");
            let (left, right) = line.split_once(PAIR_SEPARATOR)?;
            let (left, right) = (left.trim(), right.trim());
            (!left.is_empty() && !right.is_empty()).then(|| (left.to_string(), right.to_string()))
        })
        .collect()
}

/// Parse line-delimited items of a kind that supports them.
#[must_use]
pub fn parse_line_items<T: StructuredItem>(text: &str) -> Vec<T> {
    parse_line_pairs(text)
        .iter()
        .filter_map(|(l, r)| T::from_line_pair(l, r))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyforge_model::Flashcard;

    #[test]
    fn splits_on_first_separator_only() {
        let pairs = parse_line_pairs("Logic || a || b");
        assert_eq!(pairs, vec![("Logic".to_string(), "a || b".to_string())]);
    }

    #[test]
    fn skips_lines_without_separator_or_halves() {
        let text = "Here are your cards:\nAtom || Smallest unit\n || orphan\nCell ||\n";
        let pairs = parse_line_pairs(text);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0, "Atom");
    }

    #[test]
    fn strips_list_markers() {
        let cards: Vec<Flashcard> = parse_line_items("1. Gene || Unit of heredity\n- DNA || Molecule");
        assert_eq!(cards[0].term, "Gene");
        assert_eq!(cards[1].term, "DNA");
    }
}
