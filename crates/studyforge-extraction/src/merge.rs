use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

use crate::items::StructuredItem;

/// Identity used for duplicate detection: NFC, trimmed, lowercased, inner
/// whitespace collapsed.
#[must_use]
pub fn normalize_identity(text: &str) -> String {
    let nfc: String = text.nfc().collect();
    nfc.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Append items from `incoming` whose identity is not yet in `existing`,
/// stopping once `existing` holds `limit` items. Duplicates within `incoming`
/// are dropped too. Returns how many items were added.
pub fn merge_unique<T: StructuredItem>(existing: &mut Vec<T>, incoming: Vec<T>, limit: usize) -> usize {
    let mut seen: HashSet<String> = existing.iter().map(StructuredItem::identity_key).collect();
    let before = existing.len();
    for item in incoming {
        if existing.len() >= limit {
            break;
        }
        if seen.insert(item.identity_key()) {
            existing.push(item);
        }
    }
    existing.len() - before
}

/// Deduplicate `items` and cap the result at `limit`.
#[must_use]
pub fn dedup_items<T: StructuredItem>(items: Vec<T>, limit: usize) -> Vec<T> {
    let mut out = Vec::with_capacity(items.len().min(limit));
    merge_unique(&mut out, items, limit);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyforge_model::Flashcard;

    fn cards(terms: &[&str]) -> Vec<Flashcard> {
        terms.iter().map(|t| Flashcard::new(*t, "d")).collect()
    }

    #[test]
    fn identity_ignores_case_and_outer_whitespace() {
        assert_eq!(normalize_identity("  Mitosis "), "mitosis");
        assert_eq!(normalize_identity("Cell  Wall"), "cell wall");
        // composed and decomposed e-acute compare equal
        assert_eq!(normalize_identity("Caf\u{e9}"), normalize_identity("Cafe\u{301}"));
    }

    #[test]
    fn merge_skips_existing_and_internal_duplicates() {
        let mut existing = cards(&["Atom", "Cell"]);
        let added = merge_unique(&mut existing, cards(&["atom ", "Gene", "GENE", "Enzyme"]), 10);
        assert_eq!(added, 2);
        let terms: Vec<_> = existing.iter().map(|c| c.term.as_str()).collect();
        assert_eq!(terms, vec!["Atom", "Cell", "Gene", "Enzyme"]);
    }

    #[test]
    fn merge_respects_limit() {
        let mut existing = cards(&["A"]);
        merge_unique(&mut existing, cards(&["B", "C", "D"]), 3);
        assert_eq!(existing.len(), 3);
    }

    #[test]
    fn dedup_caps_and_removes_duplicates() {
        let out = dedup_items(cards(&["A", "a", "B", "C"]), 2);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].term, "B");
    }
}
