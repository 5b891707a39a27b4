//! Relevance filtering of search results.
//!
//! One batched judgment call per result set: the prompt lists every
//! candidate with its index and the response names the relevant indices.
//! If no valid index can be parsed the filter fails open and keeps the
//! whole batch; a parsing miss must not stall the pipeline.

use crate::brain::{LlmProvider, complete_soft};
use crate::types::{CompletionRequest, SearchResult};
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;

/// Token budget for relevance judgment responses.
const RELEVANCE_MAX_TOKENS: usize = 100;

/// Judges which search results are relevant to the run topic.
pub struct RelevanceFilter {
    provider: Arc<dyn LlmProvider>,
    temperature: f32,
    index_re: Regex,
}

impl RelevanceFilter {
    pub fn new(provider: Arc<dyn LlmProvider>, temperature: f32) -> Self {
        Self {
            provider,
            temperature,
            index_re: Regex::new(r"\d+").unwrap(),
        }
    }

    /// Filter a batch of results down to the URLs judged relevant.
    ///
    /// Preserves the candidate order; indices outside the valid range
    /// are silently dropped. An empty input batch returns an empty set
    /// without calling the provider.
    pub async fn filter(&self, results: &[SearchResult], topic: &str) -> Vec<String> {
        if results.is_empty() {
            return Vec::new();
        }

        let prompt = build_judgment_prompt(results, topic);
        let request = CompletionRequest::new(prompt, RELEVANCE_MAX_TOKENS, self.temperature);
        let response = complete_soft(self.provider.as_ref(), request).await;

        let indices = self.parse_indices(&response, results.len());
        if indices.is_empty() {
            tracing::warn!(
                candidates = results.len(),
                "no valid indices in relevance judgment, failing open"
            );
            return results.iter().map(|r| r.url.clone()).collect();
        }

        results
            .iter()
            .enumerate()
            .filter(|(i, _)| indices.contains(i))
            .map(|(_, r)| r.url.clone())
            .collect()
    }

    /// Parse every integer in the response, keeping those in range.
    fn parse_indices(&self, response: &str, candidates: usize) -> HashSet<usize> {
        self.index_re
            .find_iter(response)
            .filter_map(|m| m.as_str().parse::<usize>().ok())
            .filter(|&i| i < candidates)
            .collect()
    }
}

/// List every candidate with its index and title/snippet pair.
fn build_judgment_prompt(results: &[SearchResult], topic: &str) -> String {
    let mut prompt = format!(
        "Decide which of the following search results are relevant to the topic '{topic}'.\n\n"
    );
    for (i, result) in results.iter().enumerate() {
        prompt.push_str(&format!("{}. {}: {}\n", i, result.title, result.snippet));
    }
    prompt.push_str(
        "\nReply with only the numbers of the relevant results, separated by commas.",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::MockLlmProvider;

    fn candidates() -> Vec<SearchResult> {
        vec![
            SearchResult::new("A", "about a", "https://a.example.com"),
            SearchResult::new("B", "about b", "https://b.example.com"),
            SearchResult::new("C", "about c", "https://c.example.com"),
        ]
    }

    fn filter_with(provider: MockLlmProvider) -> (RelevanceFilter, Arc<MockLlmProvider>) {
        let provider = Arc::new(provider);
        (RelevanceFilter::new(provider.clone(), 0.7), provider)
    }

    #[tokio::test]
    async fn test_filter_keeps_named_indices_in_order() {
        let (filter, _) = filter_with(MockLlmProvider::with_response("2, 0"));
        let urls = filter.filter(&candidates(), "topic").await;
        assert_eq!(urls, vec!["https://a.example.com", "https://c.example.com"]);
    }

    #[tokio::test]
    async fn test_filter_drops_out_of_range_indices() {
        let (filter, _) = filter_with(MockLlmProvider::with_response("1, 7, 99"));
        let urls = filter.filter(&candidates(), "topic").await;
        assert_eq!(urls, vec!["https://b.example.com"]);
    }

    #[tokio::test]
    async fn test_filter_fails_open_on_unparseable_response() {
        let (filter, _) = filter_with(MockLlmProvider::with_response(
            "none of these look especially relevant",
        ));
        let urls = filter.filter(&candidates(), "topic").await;
        assert_eq!(urls.len(), 3);
    }

    #[tokio::test]
    async fn test_filter_fails_open_on_empty_generation() {
        let (filter, _) = filter_with(MockLlmProvider::new());
        let urls = filter.filter(&candidates(), "topic").await;
        assert_eq!(urls.len(), 3);
    }

    #[tokio::test]
    async fn test_filter_output_is_subset_of_input() {
        let (filter, _) = filter_with(MockLlmProvider::with_response("0, 2"));
        let batch = candidates();
        let input_urls: Vec<&str> = batch.iter().map(|r| r.url.as_str()).collect();
        let urls = filter.filter(&batch, "topic").await;
        assert!(urls.iter().all(|u| input_urls.contains(&u.as_str())));
    }

    #[tokio::test]
    async fn test_filter_empty_input_skips_provider() {
        let (filter, provider) = filter_with(MockLlmProvider::with_response("0"));
        let urls = filter.filter(&[], "topic").await;
        assert!(urls.is_empty());
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn test_filter_is_one_batched_call() {
        let (filter, provider) = filter_with(MockLlmProvider::with_response("0, 1, 2"));
        let _ = filter.filter(&candidates(), "topic").await;
        assert_eq!(provider.requests().len(), 1);
        // All candidates appear in the single prompt.
        let prompt = &provider.requests()[0].prompt;
        assert!(prompt.contains("0. A"));
        assert!(prompt.contains("1. B"));
        assert!(prompt.contains("2. C"));
    }

    #[tokio::test]
    async fn test_duplicate_indices_do_not_duplicate_urls() {
        let (filter, _) = filter_with(MockLlmProvider::with_response("1, 1, 1"));
        let urls = filter.filter(&candidates(), "topic").await;
        assert_eq!(urls, vec!["https://b.example.com"]);
    }
}
