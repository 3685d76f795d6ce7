//! Paragraph and sentence segmentation.

use once_cell::sync::Lazy;
use regex::Regex;

/// One or more blank lines (lines holding only whitespace count as blank).
static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n\s*").unwrap());

/// Terminal punctuation followed by whitespace.
static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").unwrap());

/// Split `text` into ordered sentence-level segments.
///
/// Line endings are normalised, paragraphs are separated by blank lines, and
/// each paragraph is split after `.`, `!` or `?` followed by whitespace. A
/// paragraph without terminal punctuation stays one segment. Whitespace-only
/// pieces are dropped and every returned segment is trimmed.
#[must_use]
pub fn segment(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");

    let mut segments = Vec::new();
    for paragraph in PARAGRAPH_BREAK.split(&normalized) {
        let mut start = 0;
        for m in SENTENCE_END.find_iter(paragraph) {
            // Keep the punctuation, drop the whitespace after it.
            push_trimmed(&mut segments, &paragraph[start..=m.start()]);
            start = m.end();
        }
        push_trimmed(&mut segments, &paragraph[start..]);
    }
    segments
}

fn push_trimmed(out: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        out.push(piece.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_sentences_within_paragraph() {
        assert_eq!(segment("A. B! C? D"), vec!["A.", "B!", "C?", "D"]);
    }

    #[test]
    fn splits_paragraphs_on_blank_lines() {
        let text = "First paragraph\nstill first.\n\n  \nSecond one";
        assert_eq!(
            segment(text),
            vec!["First paragraph\nstill first.", "Second one"]
        );
    }

    #[test]
    fn normalizes_carriage_returns() {
        assert_eq!(segment("One.\r\n\r\nTwo.\rThree"), vec!["One.", "Two.", "Three"]);
    }

    #[test]
    fn paragraph_without_punctuation_is_one_segment() {
        assert_eq!(segment("just a heading"), vec!["just a heading"]);
    }

    #[test]
    fn whitespace_only_input_yields_nothing() {
        assert!(segment("").is_empty());
        assert!(segment(" \n\n\t ").is_empty());
    }

    #[test]
    fn decimal_numbers_are_not_split() {
        assert_eq!(segment("Pi is 3.14 roughly."), vec!["Pi is 3.14 roughly."]);
    }
}
