//! Property-based tests for the context and extraction layers
//!
//! These properties exercise the public API of the member crates over
//! generated inputs: token estimation, segmentation and packing, budgeted
//! context assembly, JSON repair and duplicate-free merging.
//!
//! ## Configuration
//!
//! - `PROPTEST_CASES`: Number of test cases per property (default: 64)
//! - `PROPTEST_MAX_SHRINK_ITERS`: Max shrinking iterations on failure (default: 1000)
//!
//! ```bash
//! PROPTEST_CASES=256 cargo test --test property_tests
//! ```

use proptest::prelude::*;
use std::collections::HashSet;
use std::env;

use studyforge::context::{ContextBudget, ContextBuilder, estimate_tokens, pack_chunks, segment};
use studyforge::extraction::{StructuredItem, dedup_items, extract_items, merge_unique};
use studyforge::{Document, Flashcard, QuizQuestion};

const DEFAULT_PROPTEST_CASES: u32 = 64;
const DEFAULT_MAX_SHRINK_ITERS: u32 = 1000;

/// ProptestConfig honouring `PROPTEST_CASES` and `PROPTEST_MAX_SHRINK_ITERS`,
/// optionally capped for slower properties.
fn proptest_config(max_cases: Option<u32>) -> ProptestConfig {
    let env_cases = env::var("PROPTEST_CASES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_PROPTEST_CASES);
    let cases = max_cases.map_or(env_cases, |max| env_cases.min(max));
    let max_shrink_iters = env::var("PROPTEST_MAX_SHRINK_ITERS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_MAX_SHRINK_ITERS);

    ProptestConfig {
        cases,
        max_shrink_iters,
        ..ProptestConfig::default()
    }
}

fn non_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Prose made of sentences and paragraphs, with the occasional CRLF.
fn prose() -> impl Strategy<Value = String> {
    let sentence = "[A-Za-z][a-z ]{0,30}[.!?]";
    let paragraph = prop::collection::vec(sentence, 1..6).prop_map(|s| s.join(" "));
    (prop::collection::vec(paragraph, 0..5), any::<bool>()).prop_map(|(paragraphs, crlf)| {
        let text = paragraphs.join("\n\n");
        if crlf { text.replace('\n', "\r\n") } else { text }
    })
}

fn budget() -> impl Strategy<Value = ContextBudget> {
    (50usize..3000)
        .prop_flat_map(|total| (Just(total), 10usize..=total))
        .prop_flat_map(|(total, per_doc)| (Just(total), Just(per_doc), 1usize..=per_doc, any::<bool>()))
        .prop_map(|(total, per_doc, chunk, headings)| {
            ContextBudget::new(total, per_doc, chunk, headings)
        })
}

fn documents() -> impl Strategy<Value = Vec<Document>> {
    prop::collection::vec(("[A-Z][a-z]{0,12}", prose()), 0..5).prop_map(|docs| {
        docs.into_iter()
            .enumerate()
            .map(|(i, (name, content))| Document::new(i as u64 + 1, name, content))
            .collect()
    })
}

/// Terms that collide once case and surrounding whitespace are ignored.
fn term() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "atom", "Atom", "  ATOM ", "cell", "Cell", "gene", "ion", "Ion ", "DNA", "dna", "rna",
    ])
    .prop_map(String::from)
}

proptest! {
    #![proptest_config(proptest_config(None))]

    #[test]
    fn prop_token_estimate_is_monotonic_over_prefixes(text in "\\PC{0,200}", cut in any::<prop::sample::Index>()) {
        let chars: Vec<char> = text.chars().collect();
        let split = cut.index(chars.len() + 1);
        let prefix: String = chars[..split].iter().collect();

        prop_assert!(estimate_tokens(&prefix) <= estimate_tokens(&text));
    }

    #[test]
    fn prop_chunks_cover_all_content_in_order(text in prose(), target in 1usize..120) {
        let segments = segment(&text);
        let chunks = pack_chunks(&segments, target);

        let joined: String = chunks.iter().map(|c| c.text.as_str()).collect();
        prop_assert_eq!(non_whitespace(&joined), non_whitespace(&text));
        prop_assert!(chunks.iter().all(|c| !c.text.trim().is_empty()));
        prop_assert_eq!(chunks.is_empty(), text.trim().is_empty());
    }

    #[test]
    fn prop_packing_is_deterministic(text in prose(), target in 1usize..120) {
        let segments = segment(&text);
        prop_assert_eq!(pack_chunks(&segments, target), pack_chunks(&segments, target));
    }

    #[test]
    fn prop_context_respects_total_budget(docs in documents(), budget in budget()) {
        let context = ContextBuilder::new(budget).build(&docs);

        prop_assert!(
            estimate_tokens(context.content()) <= budget.total_budget_tokens + budget.chunk_tokens,
            "context of {} tokens exceeds {} + {}",
            estimate_tokens(context.content()),
            budget.total_budget_tokens,
            budget.chunk_tokens
        );
        prop_assert!(context.tokens_used() <= budget.total_budget_tokens);
    }

    #[test]
    fn prop_no_document_exceeds_its_cap(docs in documents(), budget in budget()) {
        let context = ContextBuilder::new(budget).build(&docs);

        for block in &context.evidence {
            prop_assert!(
                block.tokens <= budget.per_doc_budget_tokens,
                "{} used {} tokens over a cap of {}",
                block.name,
                block.tokens,
                budget.per_doc_budget_tokens
            );
            prop_assert!(block.chunks_included <= block.chunks_total);
        }
    }

    #[test]
    fn prop_sloppy_json_recovers_the_clean_array(
        cards in prop::collection::vec(("[A-Za-z][A-Za-z0-9 ]{0,15}", "[A-Za-z][A-Za-z0-9 ,.]{0,30}"), 1..6),
        fenced in any::<bool>(),
        trailing_comma in any::<bool>(),
    ) {
        let clean = serde_json::to_string(
            &cards
                .iter()
                .map(|(t, d)| serde_json::json!({ "term": t, "definition": d }))
                .collect::<Vec<_>>(),
        )
        .unwrap();

        let mut sloppy = cards
            .iter()
            .map(|(t, d)| format!("{{term: '{t}', \"definition\": '{d}'}}"))
            .collect::<Vec<_>>()
            .join(",\n");
        if trailing_comma {
            sloppy.push(',');
        }
        let mut sloppy = format!("[\n{sloppy}\n]");
        if fenced {
            sloppy = format!("Here are your cards:\n```json\n{sloppy}\n```");
        }

        let expected: Vec<Flashcard> = extract_items(&clean).unwrap();
        let recovered: Vec<Flashcard> = extract_items(&sloppy).unwrap();
        prop_assert_eq!(recovered, expected);
    }

    #[test]
    fn prop_top_up_merge_never_duplicates_or_overflows(
        first in prop::collection::vec(term(), 0..12),
        second in prop::collection::vec(term(), 0..12),
        count in 1usize..10,
    ) {
        let to_cards = |terms: Vec<String>| -> Vec<Flashcard> {
            terms.into_iter().map(|t| Flashcard::new(t, "definition")).collect()
        };

        let mut items = dedup_items(to_cards(first), count);
        merge_unique(&mut items, to_cards(second), count);

        prop_assert!(items.len() <= count);
        let keys: HashSet<String> = items.iter().map(StructuredItem::identity_key).collect();
        prop_assert_eq!(keys.len(), items.len());
    }
}

#[test]
fn well_formed_quiz_fixtures_list_their_answer() {
    let raw = r#"[
        {"question": "What stores genetic information?", "options": ["DNA", "ATP", "Lipids", "Water"],
         "correctAnswer": "DNA", "explanation": "DNA carries the genome."},
        {"question": "Where is ATP made?", "options": ["Nucleus", "Mitochondria", "Ribosome", "Vacuole"],
         "correctAnswer": "Mitochondria", "explanation": "Cellular respiration."}
    ]"#;

    let quiz: Vec<QuizQuestion> = extract_items(raw).unwrap();
    assert_eq!(quiz.len(), 2);
    assert!(quiz.iter().all(QuizQuestion::answer_is_listed));
}

#[test]
fn malformed_quiz_answers_pass_through_unchanged() {
    let raw = r#"[{"question": "2 + 2?", "options": ["3", "4", "5", "6"],
                  "correctAnswer": "four", "explanation": ""}]"#;

    let quiz: Vec<QuizQuestion> = extract_items(raw).unwrap();
    assert_eq!(quiz[0].correct_answer, "four");
    assert!(!quiz[0].answer_is_listed());
}
