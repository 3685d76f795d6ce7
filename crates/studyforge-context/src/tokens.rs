//! Approximate token accounting.
//!
//! One token is taken to be four characters of trimmed text. The estimate is
//! deliberately cheap and deterministic; it only has to be consistent across
//! the packer and the budgeter, not match any particular tokenizer.

/// Characters per estimated token.
pub const CHARS_PER_TOKEN: usize = 4;

const ELLIPSIS: char = '…';

/// Convert a character count to an estimated token count (rounding up).
#[must_use]
pub const fn tokens_for_chars(chars: usize) -> usize {
    chars.div_ceil(CHARS_PER_TOKEN)
}

/// Estimate the token cost of `text`. Whitespace-only text costs zero.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    tokens_for_chars(text.trim().chars().count())
}

/// Shorten `text` to roughly `max_tokens` tokens.
///
/// Text that already fits is returned unchanged. Otherwise the cut prefers the
/// last sentence end inside the budget when it lies past 60% of the budget,
/// then the last whitespace (with an ellipsis appended), and finally a hard
/// character cut (also with an ellipsis). The result never exceeds the budget.
#[must_use]
pub fn truncate_to_approx_tokens(text: &str, max_tokens: usize) -> String {
    if estimate_tokens(text) <= max_tokens {
        return text.to_string();
    }
    let budget_chars = max_tokens * CHARS_PER_TOKEN;
    if budget_chars == 0 {
        return String::new();
    }

    let prefix_end = byte_offset_of_char(text, budget_chars);
    let prefix = &text[..prefix_end];

    // A sentence end right at the budget edge is only visible with the next char.
    let window_end = byte_offset_of_char(text, budget_chars + 1);
    if let Some(cut) = last_sentence_end(&text[..window_end])
        && cut <= prefix_end
        && text[..cut].chars().count() * 5 > budget_chars * 3
    {
        return text[..cut].trim_end().to_string();
    }

    if let Some(ws) = prefix.rfind(char::is_whitespace) {
        let kept = prefix[..ws].trim_end();
        if !kept.trim().is_empty() {
            return format!("{kept}{ELLIPSIS}");
        }
    }

    let hard_end = byte_offset_of_char(text, budget_chars - 1);
    format!("{}{ELLIPSIS}", text[..hard_end].trim_end())
}

/// Byte offset just past the first `n` characters (or the full length).
fn byte_offset_of_char(text: &str, n: usize) -> usize {
    text.char_indices().nth(n).map_or(text.len(), |(i, _)| i)
}

/// Byte offset just past the punctuation of the last `. `, `! ` or `? `.
fn last_sentence_end(text: &str) -> Option<usize> {
    let mut last = None;
    let mut prev: Option<(usize, char)> = None;
    for (i, c) in text.char_indices() {
        if let Some((pi, pc)) = prev
            && matches!(pc, '.' | '!' | '?')
            && c.is_whitespace()
        {
            last = Some(pi + pc.len_utf8());
        }
        prev = Some((i, c));
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_rounds_up_and_ignores_outer_whitespace() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("   \n\t "), 0);
        assert_eq!(estimate_tokens("hi"), 1);
        assert_eq!(estimate_tokens("hello world"), 3);
        assert_eq!(estimate_tokens("  abcd  "), 1);
    }

    #[test]
    fn estimate_counts_characters_not_bytes() {
        assert_eq!(estimate_tokens("éééé"), 1);
    }

    #[test]
    fn fitting_text_is_unchanged() {
        let text = "Short text.";
        assert_eq!(truncate_to_approx_tokens(text, 100), text);
    }

    #[test]
    fn cuts_at_sentence_end_past_sixty_percent() {
        // budget 5 tokens = 20 chars; sentence ends at char 17
        let text = "The cell is alive. It divides often.";
        let out = truncate_to_approx_tokens(text, 5);
        assert_eq!(out, "The cell is alive.");
    }

    #[test]
    fn early_sentence_end_falls_back_to_whitespace_with_ellipsis() {
        // sentence end at char 3 is well before 60% of 20 chars
        let text = "Hi. photosynthesis converts light energy";
        let out = truncate_to_approx_tokens(text, 5);
        assert!(out.ends_with('…'));
        assert_eq!(out, "Hi. photosynthesis…");
        assert!(estimate_tokens(&out) <= 5);
    }

    #[test]
    fn no_whitespace_uses_hard_cut() {
        let text = "a".repeat(50);
        let out = truncate_to_approx_tokens(&text, 2);
        assert_eq!(out.chars().count(), 8);
        assert!(out.ends_with('…'));
    }

    #[test]
    fn zero_budget_yields_empty() {
        assert_eq!(truncate_to_approx_tokens("something long", 0), "");
    }

    #[test]
    fn truncation_never_exceeds_budget() {
        let text = "word ".repeat(200);
        for max in 1..40 {
            let out = truncate_to_approx_tokens(&text, max);
            assert!(estimate_tokens(&out) <= max, "max={max} out={out:?}");
        }
    }
}
