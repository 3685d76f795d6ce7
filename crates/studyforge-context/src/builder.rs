use serde::Serialize;
use studyforge_model::Document;
use tracing::{debug, trace};

use crate::budget::{ContextBudget, TokenUsage};
use crate::pack::pack_chunks;
use crate::segment::segment;

const BLOCK_SEPARATOR: &str = "\n\n";
const CHUNK_SEPARATOR: char = '\n';

/// What one document contributed to an assembled context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockEvidence {
    pub document_id: u64,
    pub name: String,
    pub chunks_total: usize,
    pub chunks_included: usize,
    pub tokens: usize,
}

impl BlockEvidence {
    /// Whether every chunk of the document made it into the context.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.chunks_included == self.chunks_total
    }
}

/// An assembled, budgeted context ready to be embedded in a prompt.
#[derive(Debug, Clone, Serialize)]
pub struct StudyContext {
    /// The context text: blocks joined by blank lines.
    pub content: String,
    /// BLAKE3 hash of `content`, hex encoded.
    pub blake3_hash: String,
    /// One entry per document that was considered, in input order.
    pub evidence: Vec<BlockEvidence>,
    /// Global usage against `total_budget_tokens`.
    pub usage: TokenUsage,
}

impl StudyContext {
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Estimated tokens of the assembled content.
    #[must_use]
    pub const fn tokens_used(&self) -> usize {
        self.usage.tokens_used()
    }
}

/// Selects document chunks under a [`ContextBudget`].
///
/// Documents are visited in input order. Each is segmented and packed, then
/// chunks are accepted while the document's block stays within the per-document
/// cap, the global budget can pay for it, and the global remaining budget stays
/// at or above the soft floor afterwards. Processing stops once nothing remains.
#[derive(Debug, Clone, Copy)]
pub struct ContextBuilder {
    budget: ContextBudget,
}

impl ContextBuilder {
    #[must_use]
    pub const fn new(budget: ContextBudget) -> Self {
        Self { budget }
    }

    #[must_use]
    pub const fn budget(&self) -> &ContextBudget {
        &self.budget
    }

    /// Assemble the context for `documents`.
    #[must_use]
    pub fn build(&self, documents: &[Document]) -> StudyContext {
        let budget = &self.budget;
        let floor = budget.soft_floor();
        let mut global = TokenUsage::new(budget.total_budget_tokens);
        let mut content = String::new();
        let mut evidence = Vec::with_capacity(documents.len());

        for doc in documents {
            if global.is_exhausted() {
                debug!(document = %doc.name, "Context budget exhausted, skipping remaining documents");
                break;
            }
            if !doc.is_ready() {
                debug!(document = %doc.name, status = ?doc.status, "Skipping document that is not ready");
                continue;
            }

            let chunks = pack_chunks(&segment(&doc.content), budget.chunk_tokens);
            let heading = budget
                .include_headings
                .then(|| format!("## {}", doc.name.trim()));
            let separator_chars = if content.is_empty() {
                0
            } else {
                BLOCK_SEPARATOR.len()
            };

            let mut doc_usage = TokenUsage::new(budget.per_doc_budget_tokens);
            let mut block = String::new();
            let mut included = 0usize;

            for chunk in &chunks {
                // The first chunk also pays for the heading and the block separator.
                let (block_chars, global_chars) = if included == 0 {
                    let chars = chunk.char_len()
                        + heading.as_ref().map_or(0, |h| h.chars().count() + 1);
                    (chars, chars + separator_chars)
                } else {
                    let chars = chunk.char_len() + 1;
                    (chars, chars)
                };

                if doc_usage.would_exceed(block_chars) {
                    trace!(document = %doc.name, chunk = included, "Per-document cap reached");
                    break;
                }
                match global.remaining_after(global_chars) {
                    Some(remaining) if remaining >= floor => {}
                    _ => {
                        trace!(
                            document = %doc.name,
                            chunk = included,
                            remaining = global.remaining(),
                            floor,
                            "Global budget floor reached"
                        );
                        break;
                    }
                }

                if included == 0 {
                    if let Some(heading) = &heading {
                        block.push_str(heading);
                        block.push(CHUNK_SEPARATOR);
                    }
                } else {
                    block.push(CHUNK_SEPARATOR);
                }
                block.push_str(&chunk.text);
                doc_usage.add_chars(block_chars);
                global.add_chars(global_chars);
                included += 1;
            }

            if included > 0 {
                if !content.is_empty() {
                    content.push_str(BLOCK_SEPARATOR);
                }
                content.push_str(&block);
            }

            debug!(
                document = %doc.name,
                chunks_total = chunks.len(),
                chunks_included = included,
                tokens = doc_usage.tokens_used(),
                "Document added to context"
            );
            evidence.push(BlockEvidence {
                document_id: doc.id,
                name: doc.name.clone(),
                chunks_total: chunks.len(),
                chunks_included: included,
                tokens: doc_usage.tokens_used(),
            });
        }

        let blake3_hash = blake3::hash(content.as_bytes()).to_hex().to_string();
        StudyContext {
            content,
            blake3_hash,
            evidence,
            usage: global,
        }
    }
}

/// Assemble a budgeted context string for `documents`.
#[must_use]
pub fn build_context(documents: &[Document], budget: ContextBudget) -> String {
    ContextBuilder::new(budget).build(documents).content
}
