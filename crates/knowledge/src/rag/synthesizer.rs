//! Grounded answer synthesis.
//!
//! Renders the system instruction and user turn for the retrieved passages,
//! calls the completion model once and attaches a citation list derived from
//! the passages themselves. Whether the model's `[n]` markers match the list
//! is up to the model; nothing here checks them.

use crate::rag::types::{Answer, Citation};
use crate::retrieval::build_context;
use crate::types::ScoredChunk;
use ragdesk_core::config::LlmSettings;
use ragdesk_core::AppResult;
use ragdesk_llm::{LlmClient, LlmRequest};
use ragdesk_prompt::PromptBuilder;
use std::sync::Arc;
use tracing::instrument;

/// Longest passage preview shown in a citation, in characters.
pub const PREVIEW_CHARS: usize = 180;

/// Marker appended to a shortened preview.
const ELLIPSIS: char = '…';

/// Turns ranked passages and a question into a cited answer.
pub struct AnswerSynthesizer {
    llm: Arc<dyn LlmClient>,
    prompts: PromptBuilder,
    model: String,
    temperature: f32,
    persona: String,
}

impl AnswerSynthesizer {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: PromptBuilder, settings: &LlmSettings) -> Self {
        Self {
            llm,
            prompts,
            model: settings.model.clone(),
            temperature: settings.temperature,
            persona: settings.persona.clone(),
        }
    }

    /// Ask the completion model for an answer grounded in `chunks`.
    ///
    /// `allow_general_knowledge` selects between the permissive and the
    /// documents-only instruction for this request alone.
    #[instrument(skip(self, question, chunks), fields(passages = chunks.len(), model = %self.model))]
    pub async fn answer(
        &self,
        question: &str,
        chunks: &[ScoredChunk],
        allow_general_knowledge: bool,
    ) -> AppResult<Answer> {
        let context = build_context(chunks);
        let prompt = self
            .prompts
            .build(&self.persona, &context, question, allow_general_knowledge)?;

        let request = LlmRequest::new(prompt.user, &self.model)
            .with_system(prompt.system)
            .with_temperature(self.temperature);

        let response = self.llm.complete(&request).await?;

        tracing::info!(
            "Answer from {} ({} chars, {} tokens)",
            self.llm.provider_name(),
            response.content.len(),
            response.usage.total_tokens
        );

        Ok(Answer {
            text: response.content.trim().to_string(),
            citations: build_citations(chunks),
        })
    }
}

/// One citation per passage, in rank order.
pub fn build_citations(chunks: &[ScoredChunk]) -> Vec<Citation> {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| Citation {
            marker: format!("[{}]", i + 1),
            file_name: chunk.record.file_name.clone(),
            preview: preview(&chunk.record.text),
            score: round_score(chunk.score),
        })
        .collect()
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => {
            let mut shortened = text[..cut].to_string();
            shortened.push(ELLIPSIS);
            shortened
        }
        None => text.to_string(),
    }
}

fn round_score(score: f32) -> f32 {
    (score * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChunkRecord;
    use ragdesk_core::AppError;
    use ragdesk_llm::{LlmResponse, LlmUsage};
    use std::sync::Mutex;

    /// Returns a fixed answer and keeps every request it receives.
    struct ScriptedLlm {
        reply: AppResult<String>,
        requests: Mutex<Vec<LlmRequest>>,
    }

    impl ScriptedLlm {
        fn answering(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for ScriptedLlm {
        fn provider_name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.requests.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(text) => Ok(LlmResponse {
                    content: text.clone(),
                    model: request.model.clone(),
                    usage: LlmUsage::new(10, 5),
                }),
                Err(e) => Err(AppError::Llm(e.to_string())),
            }
        }
    }

    fn chunk(file: &str, text: &str, score: f32) -> ScoredChunk {
        ScoredChunk {
            record: ChunkRecord::new(file, text, vec![1.0]),
            score,
        }
    }

    fn synthesizer(llm: Arc<ScriptedLlm>) -> AnswerSynthesizer {
        AnswerSynthesizer::new(
            llm,
            PromptBuilder::with_defaults().unwrap(),
            &LlmSettings::default(),
        )
    }

    #[test]
    fn test_citations_follow_rank_order() {
        let citations = build_citations(&[
            chunk("labs.pdf", "Hemoglobin 13.2", 0.91234),
            chunk("notes.txt", "Follow-up in 2 weeks", 0.4),
        ]);

        assert_eq!(citations[0].marker, "[1]");
        assert_eq!(citations[0].file_name, "labs.pdf");
        assert_eq!(citations[0].score, 0.912);
        assert_eq!(citations[1].marker, "[2]");
        assert_eq!(citations[1].preview, "Follow-up in 2 weeks");
    }

    #[test]
    fn test_preview_is_truncated_with_ellipsis() {
        let exact = "a".repeat(PREVIEW_CHARS);
        assert_eq!(preview(&exact), exact);

        let long = "é".repeat(PREVIEW_CHARS + 20);
        let shortened = preview(&long);
        assert_eq!(shortened.chars().count(), PREVIEW_CHARS + 1);
        assert!(shortened.ends_with('…'));
    }

    #[test]
    fn test_round_score() {
        assert_eq!(round_score(0.87654), 0.877);
        assert_eq!(round_score(-0.0004), 0.0);
        assert_eq!(round_score(1.0), 1.0);
    }

    #[tokio::test]
    async fn test_answer_sends_grounded_prompt() {
        let llm = ScriptedLlm::answering("  Hemoglobin was 13.2 g/dL [1].  ");
        let synthesizer = synthesizer(llm.clone());

        let answer = synthesizer
            .answer(
                "What was the hemoglobin?",
                &[chunk("labs.pdf", "Hemoglobin 13.2 g/dL", 0.8)],
                false,
            )
            .await
            .unwrap();

        assert_eq!(answer.text, "Hemoglobin was 13.2 g/dL [1].");
        assert_eq!(answer.citations.len(), 1);

        let requests = llm.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.temperature, Some(0.2));
        assert!(request
            .system
            .as_deref()
            .unwrap()
            .contains("Do NOT use any knowledge outside the DOCUMENT CONTEXT."));
        assert_eq!(
            request.prompt,
            "DOCUMENT CONTEXT:\n[[1]] Hemoglobin 13.2 g/dL\n\nQUESTION:\nWhat was the hemoglobin?"
        );
    }

    #[tokio::test]
    async fn test_general_knowledge_switch_is_per_request() {
        let llm = ScriptedLlm::answering("ok");
        let synthesizer = synthesizer(llm.clone());
        let chunks = [chunk("a.txt", "text", 0.5)];

        synthesizer.answer("q", &chunks, true).await.unwrap();
        synthesizer.answer("q", &chunks, false).await.unwrap();

        let requests = llm.requests.lock().unwrap();
        assert!(requests[0]
            .system
            .as_deref()
            .unwrap()
            .contains("You MAY add general knowledge"));
        assert!(requests[1]
            .system
            .as_deref()
            .unwrap()
            .contains("Do NOT use any knowledge"));
    }

    #[tokio::test]
    async fn test_completion_failure_propagates() {
        let llm = Arc::new(ScriptedLlm {
            reply: Err(AppError::Llm("upstream 503".to_string())),
            requests: Mutex::new(Vec::new()),
        });

        let err = synthesizer(llm)
            .answer("q", &[chunk("a.txt", "text", 0.5)], true)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Llm(_)));
    }
}
