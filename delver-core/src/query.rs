//! Search query generation.
//!
//! Produces the next search query for an iteration: an initial query
//! derived from the topic, or a follow-up query conditioned on the
//! previous iteration's summary. The model is instructed to enclose the
//! query in double quotes; the first quoted substring of the response is
//! taken, and anything unparseable degrades to the topic itself.

use crate::brain::{LlmProvider, complete_soft};
use crate::types::CompletionRequest;
use regex::Regex;
use std::sync::Arc;

/// Token budget for query generation responses.
const QUERY_MAX_TOKENS: usize = 100;

/// The outcome of one query-generation call.
///
/// `Fallback` means the generation produced nothing usable and the run
/// continues with the raw topic; it is surfaced for observability, never
/// treated as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// A query extracted from the model response.
    Parsed(String),
    /// The topic itself, substituted for an unusable response.
    Fallback(String),
}

impl QueryOutcome {
    pub fn query(&self) -> &str {
        match self {
            QueryOutcome::Parsed(q) | QueryOutcome::Fallback(q) => q,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, QueryOutcome::Fallback(_))
    }
}

/// Generates search queries via the LLM provider.
pub struct QueryGenerator {
    provider: Arc<dyn LlmProvider>,
    /// Optional stronger model for query generation.
    model: Option<String>,
    temperature: f32,
    quoted: Regex,
}

impl QueryGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, model: Option<String>, temperature: f32) -> Self {
        Self {
            provider,
            model,
            temperature,
            quoted: Regex::new(r#""(.*?)""#).unwrap(),
        }
    }

    /// Generate the opening query for a topic.
    ///
    /// Asks for search terms that maximize information yield rather than
    /// a restatement of the topic.
    pub async fn initial_query(&self, topic: &str) -> QueryOutcome {
        let prompt = format!(
            "Generate a search query for the topic '{topic}'. Think about search terms \
             that will surface as much information as possible about it, not necessarily \
             the wording of the topic itself. Enclose the search query in double quotes."
        );
        let response = self.generate(prompt).await;
        self.extract_query(&response, topic)
    }

    /// Generate a follow-up query from the previous iteration's summary.
    ///
    /// Targets gaps and under-verified claims in the summary rather than
    /// repeating it.
    pub async fn follow_up_query(&self, previous_summary: &str, topic: &str) -> QueryOutcome {
        let prompt = format!(
            "Based on the following summary:\n{previous_summary}\n\n\
             Generate a follow-up search query to further explore the topic '{topic}'. \
             Target the things the summary did not touch on or did not support with \
             enough evidence. Think about search terms that will surface as much \
             information as possible. Enclose the search query in double quotes."
        );
        let response = self.generate(prompt).await;
        self.extract_query(&response, topic)
    }

    async fn generate(&self, prompt: String) -> String {
        let request = CompletionRequest::new(prompt, QUERY_MAX_TOKENS, self.temperature)
            .with_model(self.model.clone());
        complete_soft(self.provider.as_ref(), request).await
    }

    /// Take the first double-quoted substring as the query; fall back to
    /// the topic when none exists.
    fn extract_query(&self, response: &str, topic: &str) -> QueryOutcome {
        if let Some(captures) = self.quoted.captures(response) {
            let candidate = captures[1].trim();
            if !candidate.is_empty() {
                return QueryOutcome::Parsed(candidate.to_string());
            }
        }
        tracing::warn!(topic = topic, "no quoted query in response, using topic");
        QueryOutcome::Fallback(topic.to_string())
    }
}
