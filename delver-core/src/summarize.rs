//! Evidence summarization.
//!
//! Two modes: per-iteration evidence summaries over the concatenated
//! page text, and the final synthesis over all iteration summaries in
//! order. An empty or failed generation yields an empty string; the
//! caller decides what that means.

use crate::brain::{LlmProvider, complete_soft};
use crate::types::CompletionRequest;
use std::sync::Arc;

/// Token budget for per-iteration evidence summaries.
const EVIDENCE_MAX_TOKENS: usize = 3000;

/// Token budget for the final synthesis.
const FINAL_MAX_TOKENS: usize = 4000;

/// Generates structured summaries via the LLM provider.
pub struct Summarizer {
    provider: Arc<dyn LlmProvider>,
    temperature: f32,
}

impl Summarizer {
    pub fn new(provider: Arc<dyn LlmProvider>, temperature: f32) -> Self {
        Self {
            provider,
            temperature,
        }
    }

    /// Summarize one iteration's aggregated evidence, anchored on the
    /// topic.
    pub async fn summarize_evidence(&self, content: &str, topic: &str) -> String {
        let prompt = format!(
            "Summarize the following content into an insightful, well-structured \
             overview focused on answering the question '{topic}'.\n\nContent:\n{content}"
        );
        let request = CompletionRequest::new(prompt, EVIDENCE_MAX_TOKENS, self.temperature);
        complete_soft(self.provider.as_ref(), request)
            .await
            .trim()
            .to_string()
    }

    /// Merge all iteration summaries, in iteration order, into one
    /// comprehensive synthesis.
    pub async fn summarize_final(&self, summaries: &[String], topic: &str) -> String {
        let combined = summaries.join("\n");
        let prompt = format!(
            "Based on the following summaries from multiple research iterations:\n\
             {combined}\n\n\
             Generate a final comprehensive summary that captures the key points and \
             insights related to the topic '{topic}'."
        );
        let request = CompletionRequest::new(prompt, FINAL_MAX_TOKENS, self.temperature);
        complete_soft(self.provider.as_ref(), request)
            .await
            .trim()
            .to_string()
    }
}
