use tracing::{info, warn};

use studyforge_llm::GenerateOptions;
use studyforge_model::{Document, GradeLevel, QuizQuestion, Task};
use studyforge_prompt_template::instructions::{self, QuestionResult};

use crate::service::StudyEngine;
use crate::texts;

impl StudyEngine {
    /// Written feedback on a completed quiz.
    ///
    /// `answers[i]` is the student's answer to `quiz[i]`; a missing entry or
    /// `None` counts as unanswered. Never fails: a refusal or a blank
    /// response yields a local score summary instead.
    pub async fn analyze_quiz_results(
        &self,
        quiz: &[QuizQuestion],
        answers: &[Option<String>],
        documents: &[Document],
        grade: GradeLevel,
        model: &str,
    ) -> String {
        let results: Vec<QuestionResult<'_>> = quiz
            .iter()
            .enumerate()
            .map(|(i, q)| QuestionResult {
                question: &q.question,
                correct: &q.correct_answer,
                student: answers.get(i).and_then(Option::as_deref),
            })
            .collect();
        let score = results.iter().filter(|r| r.is_correct()).count();
        info!(score, total = results.len(), "Analyzing quiz results");

        let names: Vec<&str> = documents
            .iter()
            .filter(|d| d.is_ready())
            .map(|d| d.name.as_str())
            .collect();
        let prompt = instructions::quiz_analysis(&results, &names, grade);

        match self
            .gateway()
            .generate(&prompt, &GenerateOptions::new(Task::Analysis, model))
            .await
        {
            Ok(result) if !result.text.trim().is_empty() => result.text,
            Ok(_) => texts::analysis_unavailable(score, results.len()),
            Err(refusal) => {
                warn!(reason = %refusal.reason, "Quiz analysis refused by content policy");
                texts::analysis_unavailable(score, results.len())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use studyforge_llm::testing::ScriptedBackend;
    use studyforge_llm::{GenerationGateway, LlmError};
    use studyforge_model::DEFAULT_MODEL_ID;

    fn question(text: &str, answer: &str) -> QuizQuestion {
        QuizQuestion {
            question: text.to_string(),
            options: ["A", "B", "C", "D"].map(String::from).to_vec(),
            correct_answer: answer.to_string(),
            explanation: String::new(),
        }
    }

    fn quiz() -> Vec<QuizQuestion> {
        vec![question("Q1", "A"), question("Q2", "B"), question("Q3", "C")]
    }

    fn engine(backend: Arc<ScriptedBackend>) -> StudyEngine {
        StudyEngine::new(GenerationGateway::new(Box::new(backend)))
    }

    #[tokio::test]
    async fn prompt_lists_results_and_materials() {
        let backend = Arc::new(ScriptedBackend::texts(["Great work on Q1."]));
        let docs = vec![
            Document::new(1, "Chapter 1", "text"),
            Document::new(2, "Chapter 2", "text"),
        ];
        let answers = vec![Some("A".to_string()), Some("D".to_string())];

        let analysis = engine(backend.clone())
            .analyze_quiz_results(&quiz(), &answers, &docs, GradeLevel::default(), DEFAULT_MODEL_ID)
            .await;
        assert_eq!(analysis, "Great work on Q1.");

        let request = &backend.requests()[0];
        assert_eq!(request.task, Task::Analysis);
        assert!(request.prompt.contains("**Quiz Results**: 1/3 correct"));
        assert!(request.prompt.contains("Q: Q3\nCorrect: C\nStudent: Not answered"));
        assert!(request.prompt.contains("Chapter 1, Chapter 2"));
    }

    #[tokio::test]
    async fn refusal_falls_back_to_score_summary() {
        let backend = Arc::new(ScriptedBackend::new([Err(LlmError::ContentBlocked(
            "blocked".to_string(),
        ))]));
        let answers = vec![Some("A".to_string()), Some("B".to_string()), None];

        let analysis = engine(backend)
            .analyze_quiz_results(&quiz(), &answers, &[], GradeLevel::default(), DEFAULT_MODEL_ID)
            .await;
        assert!(analysis.starts_with("# Quiz Analysis"));
        assert!(analysis.contains("Score: 2/3 (67%)"));
    }

    #[tokio::test]
    async fn blank_response_falls_back_to_score_summary() {
        let backend = Arc::new(ScriptedBackend::texts([""]));

        let analysis = engine(backend)
            .analyze_quiz_results(&quiz(), &[], &[], GradeLevel::default(), DEFAULT_MODEL_ID)
            .await;
        assert!(analysis.contains("Score: 0/3 (0%)"));
    }
}
