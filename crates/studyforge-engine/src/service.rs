use serde::Serialize;
use tracing::{debug, info};

use studyforge_config::Config;
use studyforge_context::{ContextBuilder, StudyContext};
use studyforge_llm::{GenerateOptions, GenerationGateway, LlmError, SafetyError};
use studyforge_model::{ChatTurn, Document, GenerationResult, GradeLevel, Task};
use studyforge_prompt_template::{compose_chat_prompt, compose_prompt, instructions};

use crate::budgets::TaskBudgets;
use crate::texts;

/// Results of opening a study session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudySession {
    pub welcome: GenerationResult,
    pub topics: GenerationResult,
}

/// Entry point for every study operation.
///
/// Each operation assembles a budgeted context from the ready documents,
/// composes the task prompt and calls the gateway. Operations share no
/// mutable state, so one engine can serve concurrent calls.
pub struct StudyEngine {
    gateway: GenerationGateway,
    budgets: TaskBudgets,
}

impl StudyEngine {
    pub fn new(gateway: GenerationGateway) -> Self {
        Self {
            gateway,
            budgets: TaskBudgets::default(),
        }
    }

    /// Build the gateway and budgets described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` when the gateway cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        Ok(Self::new(GenerationGateway::from_config(config)?)
            .with_budgets(TaskBudgets::from_config(config)))
    }

    #[must_use]
    pub fn with_budgets(mut self, budgets: TaskBudgets) -> Self {
        self.budgets = budgets;
        self
    }

    pub fn gateway(&self) -> &GenerationGateway {
        &self.gateway
    }

    pub fn budgets(&self) -> &TaskBudgets {
        &self.budgets
    }

    /// Budgeted context for `task`. Pure; makes no generation call.
    #[must_use]
    pub fn context_for(&self, task: Task, documents: &[Document]) -> StudyContext {
        ContextBuilder::new(self.budgets.for_task(task)).build(documents)
    }

    /// Organised markdown overview of the key topics in the materials.
    ///
    /// # Errors
    ///
    /// `SafetyError` when the provider refuses the materials.
    pub async fn generate_key_topics(
        &self,
        documents: &[Document],
        grade: GradeLevel,
        model: &str,
    ) -> Result<GenerationResult, SafetyError> {
        self.text_task(
            Task::Topics,
            documents,
            grade,
            model,
            &instructions::topics(),
            texts::TOPICS_NO_MATERIALS,
            texts::TOPICS_EMPTY_RESPONSE,
        )
        .await
    }

    /// Friendly welcome that names what the materials cover.
    ///
    /// # Errors
    ///
    /// `SafetyError` when the provider refuses the materials.
    pub async fn generate_welcome(
        &self,
        documents: &[Document],
        grade: GradeLevel,
        model: &str,
    ) -> Result<GenerationResult, SafetyError> {
        self.text_task(
            Task::Welcome,
            documents,
            grade,
            model,
            &instructions::welcome(),
            texts::WELCOME_NO_MATERIALS,
            texts::WELCOME_EMPTY_RESPONSE,
        )
        .await
    }

    /// Generate the welcome and the key topics concurrently.
    ///
    /// # Errors
    ///
    /// `SafetyError` if either generation was refused. Both calls always run
    /// to completion.
    pub async fn start_session(
        &self,
        documents: &[Document],
        grade: GradeLevel,
        model: &str,
    ) -> Result<StudySession, SafetyError> {
        info!(documents = documents.len(), grade = %grade, "Starting study session");
        let (welcome, topics) = tokio::join!(
            self.generate_welcome(documents, grade, model),
            self.generate_key_topics(documents, grade, model),
        );
        Ok(StudySession {
            welcome: welcome?,
            topics: topics?,
        })
    }

    /// Answer one tutoring question given the recent conversation.
    ///
    /// # Errors
    ///
    /// `SafetyError` when the provider refuses the question or materials.
    pub async fn send_message(
        &self,
        history: &[ChatTurn],
        message: &str,
        documents: &[Document],
        grade: GradeLevel,
        model: &str,
    ) -> Result<GenerationResult, SafetyError> {
        let context = self.context_for(Task::Chat, documents);
        if context.is_empty() {
            info!(task = %Task::Chat, "No ready study materials, returning guidance");
            return Ok(GenerationResult::text(texts::CHAT_NO_MATERIALS));
        }
        debug!(
            history = history.len(),
            tokens = context.tokens_used(),
            "Composing chat prompt"
        );

        let prompt = compose_chat_prompt(context.content(), history, message, grade);
        let result = self
            .gateway
            .generate(&prompt, &GenerateOptions::new(Task::Chat, model))
            .await?;
        Ok(or_guidance(result, texts::CHAT_EMPTY_RESPONSE))
    }

    #[allow(clippy::too_many_arguments)]
    async fn text_task(
        &self,
        task: Task,
        documents: &[Document],
        grade: GradeLevel,
        model: &str,
        instruction: &str,
        no_materials: &str,
        empty_response: &str,
    ) -> Result<GenerationResult, SafetyError> {
        let context = self.context_for(task, documents);
        if context.is_empty() {
            info!(task = %task, "No ready study materials, returning guidance");
            return Ok(GenerationResult::text(no_materials));
        }
        debug!(task = %task, tokens = context.tokens_used(), "Context assembled");

        let prompt = compose_prompt(context.content(), grade, instruction);
        let result = self
            .gateway
            .generate(&prompt, &GenerateOptions::new(task, model))
            .await?;
        Ok(or_guidance(result, empty_response))
    }
}

/// Replace a blank generation with fixed guidance.
fn or_guidance(result: GenerationResult, guidance: &str) -> GenerationResult {
    if result.text.trim().is_empty() {
        debug!("Empty generation replaced with guidance text");
        GenerationResult::text(guidance)
    } else {
        result
    }
}
