//! Offline backend used when no proxy is configured.

use async_trait::async_trait;

use studyforge_model::Task;
use studyforge_utils::error::LlmError;

use crate::types::{GenerationRequest, LlmBackend, LlmResult};

const PROVIDER: &str = "demo";

/// Characters of the prompt echoed back in the generic demo answer.
const PROMPT_PREVIEW_CHARS: usize = 200;

pub const DEMO_TOPICS: &str = "# 📚 Key Study Topics

## Main Concepts
- Core subject fundamentals
- Important terminology and definitions
- Key relationships between ideas

## Study Focus
- Review main concepts from your materials
- Practice with examples
- Connect ideas across sections

## Quick Tips
- Break topics into smaller parts
- Use active recall
- Create examples

---
*For personalized analysis of your materials, configure a study proxy (STUDYFORGE_PROXY_URL)*";

pub const DEMO_WELCOME: &str = "# 👋 Welcome to Your Study Session!

**I'm your AI tutor!** I can help you with:

**📖 Study Analysis:**
- Breaking down topics
- Key concepts
- Study guides

**🎯 Learning Support:**
- Answering questions
- Explaining concepts
- Practice materials

**📝 Study Tools:**
- Flashcards
- Practice quizzes
- Study plans

Ready to start? Ask me about your study materials!

---
*This is demo mode - configure a study proxy for full AI analysis*";

/// Serves canned, task-specific text so every command has something to render.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoBackend;

impl DemoBackend {
    fn generic(prompt: &str) -> String {
        let preview: String = prompt.chars().take(PROMPT_PREVIEW_CHARS).collect();
        format!(
            "# 🤖 Demo Mode Response

**Note**: This is a demo response as no study proxy is configured.

**To enable real AI responses:**
1. Set `STUDYFORGE_PROXY_URL` or `[proxy].base_url` in `.studyforge/config.toml`
2. Export your access token as `STUDYFORGE_ACCESS_TOKEN`
3. Run the command again

**Your request**: {preview}...

**Demo Response**: I'd be happy to help you with your study materials! In real mode, I would analyze your specific content and provide detailed, personalized assistance based on your grade level and learning needs."
        )
    }
}

#[async_trait]
impl LlmBackend for DemoBackend {
    async fn invoke(&self, request: GenerationRequest) -> Result<LlmResult, LlmError> {
        let text = match request.task {
            Task::Topics => DEMO_TOPICS.to_string(),
            Task::Welcome => DEMO_WELCOME.to_string(),
            Task::Probe => "ready".to_string(),
            Task::Chat | Task::Flashcards | Task::Quiz | Task::Analysis => {
                Self::generic(&request.prompt)
            }
        };
        Ok(LlmResult::new(text, PROVIDER, request.model))
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}
