use serde::{Deserialize, Serialize};

use crate::tokens::tokens_for_chars;

/// Token limits for one context assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextBudget {
    /// Maximum estimated tokens for the whole context.
    pub total_budget_tokens: usize,
    /// Maximum estimated tokens any single document block may use.
    pub per_doc_budget_tokens: usize,
    /// Target chunk size handed to the packer.
    pub chunk_tokens: usize,
    /// Whether each block starts with a `## <name>` heading.
    pub include_headings: bool,
}

impl ContextBudget {
    /// Short context for the session welcome message.
    pub const WELCOME: Self = Self::new(600, 150, 60, true);
    /// Key-topics overview.
    pub const TOPICS: Self = Self::new(3000, 1000, 200, true);
    /// Tutoring chat turn (history is added on top).
    pub const CHAT: Self = Self::new(4000, 1500, 200, true);
    /// Flashcard and quiz generation.
    pub const STRUCTURED: Self = Self::new(6000, 2000, 250, true);

    #[must_use]
    pub const fn new(
        total_budget_tokens: usize,
        per_doc_budget_tokens: usize,
        chunk_tokens: usize,
        include_headings: bool,
    ) -> Self {
        Self {
            total_budget_tokens,
            per_doc_budget_tokens,
            chunk_tokens,
            include_headings,
        }
    }

    /// Remaining global budget below which no further chunk is accepted:
    /// `ceil(0.6 * chunk_tokens)`.
    #[must_use]
    pub const fn soft_floor(&self) -> usize {
        (self.chunk_tokens * 3).div_ceil(5)
    }
}

/// Running character/token usage against a token limit.
///
/// Usage is tracked in characters so that separators and headings are costed
/// exactly as they will appear in the assembled text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenUsage {
    pub chars_used: usize,
    pub max_tokens: usize,
}

impl TokenUsage {
    #[must_use]
    pub const fn new(max_tokens: usize) -> Self {
        Self {
            chars_used: 0,
            max_tokens,
        }
    }

    /// Estimated tokens consumed so far.
    #[must_use]
    pub const fn tokens_used(&self) -> usize {
        tokens_for_chars(self.chars_used)
    }

    /// Tokens still available.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.max_tokens.saturating_sub(self.tokens_used())
    }

    /// Tokens that would remain after adding `chars`, or `None` if adding
    /// them would exceed the limit.
    #[must_use]
    pub const fn remaining_after(&self, chars: usize) -> Option<usize> {
        let tokens = tokens_for_chars(self.chars_used + chars);
        if tokens > self.max_tokens {
            None
        } else {
            Some(self.max_tokens - tokens)
        }
    }

    #[must_use]
    pub const fn would_exceed(&self, chars: usize) -> bool {
        self.remaining_after(chars).is_none()
    }

    pub const fn add_chars(&mut self, chars: usize) {
        self.chars_used += chars;
    }

    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soft_floor_rounds_up() {
        assert_eq!(ContextBudget::new(100, 100, 20, false).soft_floor(), 12);
        assert_eq!(ContextBudget::new(100, 100, 1, false).soft_floor(), 1);
        assert_eq!(ContextBudget::STRUCTURED.soft_floor(), 150);
    }

    #[test]
    fn usage_tracking() {
        let mut usage = TokenUsage::new(10);
        assert_eq!(usage.remaining(), 10);
        assert!(!usage.would_exceed(40));
        assert!(usage.would_exceed(41));

        usage.add_chars(20);
        assert_eq!(usage.tokens_used(), 5);
        assert_eq!(usage.remaining_after(4), Some(4));
        assert!(!usage.is_exhausted());

        usage.add_chars(20);
        assert!(usage.is_exhausted());
    }

    #[test]
    fn presets_keep_per_doc_within_total() {
        for preset in [
            ContextBudget::WELCOME,
            ContextBudget::TOPICS,
            ContextBudget::CHAT,
            ContextBudget::STRUCTURED,
        ] {
            assert!(preset.per_doc_budget_tokens <= preset.total_budget_tokens);
            assert!(preset.chunk_tokens <= preset.per_doc_budget_tokens);
        }
    }
}
