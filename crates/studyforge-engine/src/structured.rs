//! Flashcard and quiz generation with a staged repair cascade.
//!
//! Each stage runs only when the previous ones left the result short:
//!
//! 1. `direct`: ask for a JSON array and extract it permissively
//! 2. `top_up`: some items came back; ask for the missing ones and merge
//! 3. `line_pairs`: nothing parsed; ask for `term || definition` lines
//!    (kinds that support it)
//! 4. `conversion`: feed the first answer back and ask for it as JSON
//! 5. `placeholders`: generic items padded to the requested count
//!
//! A partial result after the top-up is returned as is. A refused or failed
//! call ends the cascade: no later stage sees a failure notice as if it were
//! a model answer. The result never holds more than the requested count or
//! two items with the same normalized identity.

use tracing::{Instrument, debug, info, warn};

use studyforge_context::StudyContext;
use studyforge_extraction::{
    StructuredItem, dedup_items, extract_items, merge_unique, parse_line_items,
};
use studyforge_llm::GenerateOptions;
use studyforge_model::{Document, Flashcard, GradeLevel, QuizQuestion};
use studyforge_prompt_template::{compose_prompt, instructions};
use studyforge_utils::logging::{StageTimer, task_span};

use crate::service::StudyEngine;

/// Stage of the structured cascade, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeStage {
    Direct,
    TopUp,
    LinePairs,
    Conversion,
    Placeholders,
}

impl CascadeStage {
    pub const ORDER: [Self; 5] = [
        Self::Direct,
        Self::TopUp,
        Self::LinePairs,
        Self::Conversion,
        Self::Placeholders,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::TopUp => "top_up",
            Self::LinePairs => "line_pairs",
            Self::Conversion => "conversion",
            Self::Placeholders => "placeholders",
        }
    }
}

/// Items produced by a cascade run and the stage that settled it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredOutcome<T> {
    pub items: Vec<T>,
    pub stage: CascadeStage,
}

/// Inputs shared by every stage of one cascade run.
struct CascadeRun<'a> {
    context: &'a StudyContext,
    grade: GradeLevel,
    model: &'a str,
    count: usize,
}

impl StudyEngine {
    /// Generate up to `count` flashcards from the materials.
    pub async fn generate_flashcards(
        &self,
        documents: &[Document],
        grade: GradeLevel,
        model: &str,
        count: usize,
    ) -> Vec<Flashcard> {
        self.generate_structured(documents, grade, model, count).await
    }

    /// Generate up to `count` multiple-choice questions from the materials.
    pub async fn generate_quiz(
        &self,
        documents: &[Document],
        grade: GradeLevel,
        model: &str,
        count: usize,
    ) -> Vec<QuizQuestion> {
        self.generate_structured(documents, grade, model, count).await
    }

    /// Generate up to `count` items of kind `T`. Never fails; see the module
    /// documentation for the fallback order.
    pub async fn generate_structured<T: StructuredItem>(
        &self,
        documents: &[Document],
        grade: GradeLevel,
        model: &str,
        count: usize,
    ) -> Vec<T> {
        self.run_structured(documents, grade, model, count)
            .await
            .items
    }

    /// Like [`generate_structured`](Self::generate_structured), also
    /// reporting which stage produced the items.
    pub async fn run_structured<T: StructuredItem>(
        &self,
        documents: &[Document],
        grade: GradeLevel,
        model: &str,
        count: usize,
    ) -> StructuredOutcome<T> {
        if count == 0 {
            return StructuredOutcome {
                items: Vec::new(),
                stage: CascadeStage::Direct,
            };
        }

        let context = self.context_for(T::TASK, documents);
        if context.is_empty() {
            info!(kind = T::KIND, count, "No ready study materials, using placeholders");
            return placeholders(count);
        }

        let run = CascadeRun {
            context: &context,
            grade,
            model,
            count,
        };
        let span = task_span(T::TASK.as_str(), model);
        let outcome = self.cascade::<T>(&run).instrument(span).await;
        info!(
            kind = T::KIND,
            requested = count,
            items = outcome.items.len(),
            stage = outcome.stage.as_str(),
            "Structured generation finished"
        );
        outcome
    }

    async fn cascade<T: StructuredItem>(&self, run: &CascadeRun<'_>) -> StructuredOutcome<T> {
        let count = run.count;

        // direct
        let instruction = instructions::structured(T::TASK, count, run.grade);
        let first = self
            .call_stage::<T>(run, CascadeStage::Direct, &compose(run, &instruction), count)
            .await;
        let mut items: Vec<T> = match first.as_deref().map(extract_items::<T>) {
            Some(Ok(found)) => dedup_items(found, count),
            Some(Err(e)) => {
                debug!(stage = CascadeStage::Direct.as_str(), error = %e, "No items extracted");
                Vec::new()
            }
            None => Vec::new(),
        };
        if items.len() >= count {
            return done(items, CascadeStage::Direct);
        }

        if !items.is_empty() {
            let missing = count - items.len();
            let existing: Vec<&str> = items.iter().map(StructuredItem::identity).collect();
            let instruction = instructions::top_up(T::TASK, T::KIND, T::KEYS, &existing, missing);
            let text = self
                .call_stage::<T>(run, CascadeStage::TopUp, &compose(run, &instruction), missing)
                .await;
            match text.as_deref().map(extract_items::<T>) {
                Some(Ok(more)) => {
                    let added = merge_unique(&mut items, more, count);
                    debug!(
                        stage = CascadeStage::TopUp.as_str(),
                        added,
                        items = items.len(),
                        "Merged top-up items"
                    );
                }
                Some(Err(e)) => {
                    debug!(stage = CascadeStage::TopUp.as_str(), error = %e, "No items extracted");
                }
                None => {}
            }
            return done(items, CascadeStage::TopUp);
        }

        // Refused or failed: no further calls.
        let Some(first) = first else {
            return placeholders(count);
        };

        if T::LINE_PAIRS {
            let instruction = instructions::flashcard_lines(count);
            let Some(text) = self
                .call_stage::<T>(run, CascadeStage::LinePairs, &compose(run, &instruction), count)
                .await
            else {
                return placeholders(count);
            };
            let mut found: Vec<T> = parse_line_items(&text);
            if found.is_empty() {
                found = extract_items(&text).unwrap_or_default();
            }
            let items = dedup_items(found, count);
            if !items.is_empty() {
                return done(items, CascadeStage::LinePairs);
            }
        }

        if !first.trim().is_empty() {
            let prompt = instructions::conversion(T::TASK, T::KIND, T::KEYS, count, &first);
            if let Some(text) = self
                .call_stage::<T>(run, CascadeStage::Conversion, &prompt, count)
                .await
            {
                match extract_items::<T>(&text) {
                    Ok(found) => return done(dedup_items(found, count), CascadeStage::Conversion),
                    Err(e) => {
                        debug!(stage = CascadeStage::Conversion.as_str(), error = %e, "No items extracted");
                    }
                }
            }
        }

        placeholders(count)
    }

    /// One gateway call. A safety refusal or a failure notice from the
    /// gateway is logged and reported as `None`.
    async fn call_stage<T: StructuredItem>(
        &self,
        run: &CascadeRun<'_>,
        stage: CascadeStage,
        prompt: &str,
        items: usize,
    ) -> Option<String> {
        let _timer = StageTimer::start(stage.as_str());
        let options = GenerateOptions::new(T::TASK, run.model).with_items(items);
        match self.gateway().generate(prompt, &options).await {
            Ok(result) if result.fallback => {
                warn!(
                    stage = stage.as_str(),
                    kind = T::KIND,
                    "Generation failed, no model answer to extract"
                );
                None
            }
            Ok(result) => Some(result.text),
            Err(refusal) => {
                warn!(
                    stage = stage.as_str(),
                    kind = T::KIND,
                    reason = %refusal.reason,
                    "Structured generation refused by content policy"
                );
                None
            }
        }
    }
}

fn compose(run: &CascadeRun<'_>, instruction: &str) -> String {
    compose_prompt(run.context.content(), run.grade, instruction)
}

fn done<T>(items: Vec<T>, stage: CascadeStage) -> StructuredOutcome<T> {
    StructuredOutcome { items, stage }
}

fn placeholders<T: StructuredItem>(count: usize) -> StructuredOutcome<T> {
    StructuredOutcome {
        items: T::placeholders(count),
        stage: CascadeStage::Placeholders,
    }
}
