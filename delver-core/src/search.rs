//! Web search capability.
//!
//! Defines the `SearchProvider` trait plus a DuckDuckGo instant-answer
//! implementation (no API key required). Search failures never abort a
//! run: the iteration controller degrades them to an empty batch.

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::types::{SearchBatch, SearchResult};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// The default DuckDuckGo instant-answer endpoint.
const DEFAULT_BASE_URL: &str = "https://api.duckduckgo.com";

/// Trait for web search providers.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run one search query and return an ordered batch of results.
    async fn search(&self, query: &str) -> Result<SearchBatch, SearchError>;
}

/// Search via the DuckDuckGo instant-answer API.
///
/// Maps the abstract, related topics, and results sections of the
/// response into ordered `SearchResult`s, capped at `max_results`.
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
    base_url: String,
    max_results: usize,
}

impl DuckDuckGoSearch {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("delver/0.1")
            .build()
            .map_err(|e| SearchError::Client {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            max_results: config.max_results,
        })
    }

    /// Map an instant-answer response body into a batch.
    fn parse_batch(body: &Value, max_results: usize) -> SearchBatch {
        let mut results = Vec::new();

        // The abstract is the primary answer when present.
        if let Some(abstract_text) = body["AbstractText"].as_str() {
            if !abstract_text.is_empty() {
                let title = body["Heading"]
                    .as_str()
                    .filter(|h| !h.is_empty())
                    .or_else(|| body["AbstractSource"].as_str())
                    .unwrap_or("Abstract");
                let url = body["AbstractURL"].as_str().unwrap_or("");
                if !url.is_empty() {
                    results.push(SearchResult::new(title, abstract_text, url));
                }
            }
        }

        // Related topics: flat entries plus one level of grouped topics.
        if let Some(topics) = body["RelatedTopics"].as_array() {
            for topic in topics {
                if results.len() >= max_results {
                    break;
                }
                if let Some(inner) = topic["Topics"].as_array() {
                    for entry in inner {
                        if results.len() >= max_results {
                            break;
                        }
                        if let Some(result) = Self::parse_topic(entry) {
                            results.push(result);
                        }
                    }
                } else if let Some(result) = Self::parse_topic(topic) {
                    results.push(result);
                }
            }
        }

        if let Some(entries) = body["Results"].as_array() {
            for entry in entries {
                if results.len() >= max_results {
                    break;
                }
                if let Some(result) = Self::parse_topic(entry) {
                    results.push(result);
                }
            }
        }

        results.truncate(max_results);

        let mut image_urls = Vec::new();
        if let Some(image) = body["Image"].as_str() {
            if !image.is_empty() {
                if image.starts_with('/') {
                    image_urls.push(format!("https://duckduckgo.com{image}"));
                } else {
                    image_urls.push(image.to_string());
                }
            }
        }

        SearchBatch {
            results,
            image_urls,
        }
    }

    /// Map one related-topic entry (`Text` + `FirstURL`) to a result.
    ///
    /// The text is "Title - description"; the part before the first
    /// " - " becomes the title, the whole text stays as the snippet.
    fn parse_topic(entry: &Value) -> Option<SearchResult> {
        let text = entry["Text"].as_str().filter(|t| !t.is_empty())?;
        let url = entry["FirstURL"].as_str().filter(|u| !u.is_empty())?;
        let title = text.split(" - ").next().unwrap_or(text);
        Some(SearchResult::new(title, text, url))
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    async fn search(&self, query: &str) -> Result<SearchBatch, SearchError> {
        let url = format!(
            "{}/?q={}&format=json&no_html=1&skip_disambig=1",
            self.base_url,
            urlencoding::encode(query)
        );

        let response =
            self.client
                .get(&url)
                .send()
                .await
                .map_err(|e| SearchError::Request {
                    message: e.to_string(),
                })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Request {
                message: format!("HTTP {status}"),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::ResponseParse {
                message: e.to_string(),
            })?;

        let batch = Self::parse_batch(&body, self.max_results);
        tracing::debug!(
            query = query,
            results = batch.results.len(),
            images = batch.image_urls.len(),
            "search complete"
        );
        Ok(batch)
    }
}
