//! Greedy packing of segments into token-bounded chunks.

use serde::Serialize;

use crate::tokens::{estimate_tokens, tokens_for_chars};

/// Separator placed between segments inside a chunk.
const SEGMENT_SEPARATOR: char = ' ';

/// A contiguous run of segments with its estimated token cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub text: String,
    pub tokens: usize,
}

impl Chunk {
    fn from_text(text: String) -> Self {
        let tokens = estimate_tokens(&text);
        Self { text, tokens }
    }

    /// Number of characters in the chunk text.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Pack `segments` in order into chunks of at most `target_tokens`.
///
/// A segment joins the current buffer when the result stays within the
/// target, or when the buffer is empty; an oversized segment therefore forms
/// its own chunk and packing always makes progress. Whitespace-only segments
/// are skipped, so no chunk is ever empty.
#[must_use]
pub fn pack_chunks<S: AsRef<str>>(segments: &[S], target_tokens: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut buffer = String::new();
    let mut buffer_chars = 0usize;

    for segment in segments {
        let segment = segment.as_ref().trim();
        if segment.is_empty() {
            continue;
        }
        let segment_chars = segment.chars().count();

        if buffer.is_empty() {
            buffer.push_str(segment);
            buffer_chars = segment_chars;
            continue;
        }

        let joined_chars = buffer_chars + 1 + segment_chars;
        if tokens_for_chars(joined_chars) <= target_tokens {
            buffer.push(SEGMENT_SEPARATOR);
            buffer.push_str(segment);
            buffer_chars = joined_chars;
        } else {
            chunks.push(Chunk::from_text(std::mem::take(&mut buffer)));
            buffer.push_str(segment);
            buffer_chars = segment_chars;
        }
    }

    if !buffer.is_empty() {
        chunks.push(Chunk::from_text(buffer));
    }
    chunks
}
