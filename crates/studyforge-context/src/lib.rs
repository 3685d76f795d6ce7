//! Token-budgeted document context assembly.
//!
//! Long study documents are broken into sentence segments, packed greedily
//! into chunks of a target token size, and then selected per document under a
//! global budget and a per-document cap so that no single document can starve
//! the others. Semantic units are never split: a sentence is either in the
//! context whole or not at all.

mod budget;
mod builder;
mod pack;
mod segment;
mod tokens;

pub use budget::{ContextBudget, TokenUsage};
pub use builder::{BlockEvidence, ContextBuilder, StudyContext, build_context};
pub use pack::{Chunk, pack_chunks};
pub use segment::segment;
pub use tokens::{CHARS_PER_TOKEN, estimate_tokens, tokens_for_chars, truncate_to_approx_tokens};
