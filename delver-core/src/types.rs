//! Fundamental data types shared across the research pipeline.

use serde::{Deserialize, Serialize};

/// Hard cap on extracted page text, in characters.
///
/// Overrun is truncated, never an error; the summarizer receives at most
/// this many characters per page.
pub const MAX_EXTRACT_CHARS: usize = 4000;

/// One web search result, in the order returned by the provider.
///
/// Provider order is significant: relevance judgments are mapped back to
/// results by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

impl SearchResult {
    pub fn new(
        title: impl Into<String>,
        snippet: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            snippet: snippet.into(),
            url: url.into(),
        }
    }
}

/// The outcome of one search call: ordered results plus any image URLs
/// the provider surfaced alongside them.
///
/// Image URLs are carried through to the run output but play no part in
/// relevance filtering. A provider failure degrades to the default
/// (empty) batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchBatch {
    pub results: Vec<SearchResult>,
    pub image_urls: Vec<String>,
}

/// Terminal status of one content-extraction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    /// Page fetched and paragraph text extracted.
    Ok,
    /// Page fetched but contained no paragraph text.
    Empty,
    /// Fetch, decode, or HTTP-level failure.
    Failed,
}

/// The result of one fetch attempt. Failures are represented, not thrown:
/// aggregation skips non-`Ok` entries.
///
/// For non-`Ok` statuses `text` holds a short diagnostic message, never
/// raw page content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub url: String,
    pub text: String,
    pub status: FetchStatus,
}

impl ExtractedContent {
    /// Successful extraction. Text is truncated to [`MAX_EXTRACT_CHARS`]
    /// characters on a char boundary.
    pub fn ok(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: truncate_chars(&text.into(), MAX_EXTRACT_CHARS),
            status: FetchStatus::Ok,
        }
    }

    /// Page fetched but yielded no usable paragraph text.
    pub fn empty(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: "no paragraph content found".to_string(),
            status: FetchStatus::Empty,
        }
    }

    /// Fetch-level failure with a human-readable reason.
    pub fn failed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: reason.into(),
            status: FetchStatus::Failed,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == FetchStatus::Ok
    }
}

/// Truncate a string to at most `max` characters, char-boundary safe.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

/// A single-prompt completion request to an LLM provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    /// Maximum tokens to generate.
    pub max_tokens: usize,
    pub temperature: f32,
    /// Optional per-call model override; `None` uses the provider default.
    pub model: Option<String>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, max_tokens: usize, temperature: f32) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens,
            temperature,
            model: None,
        }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }
}

/// A completed LLM response.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub text: String,
    /// The model that produced the response.
    pub model: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_under_limit() {
        assert_eq!(truncate_chars("short", 4000), "short");
    }

    #[test]
    fn test_truncate_chars_at_limit() {
        let text = "a".repeat(4000);
        assert_eq!(truncate_chars(&text, 4000).chars().count(), 4000);
    }

    #[test]
    fn test_truncate_chars_over_limit() {
        let text = "b".repeat(4001);
        assert_eq!(truncate_chars(&text, 4000).chars().count(), 4000);
    }

    #[test]
    fn test_truncate_chars_multibyte_boundary() {
        // 'é' is 2 bytes; a byte-indexed slice would panic mid-char.
        let text = "é".repeat(4100);
        let truncated = truncate_chars(&text, 4000);
        assert_eq!(truncated.chars().count(), 4000);
    }

    #[test]
    fn test_extracted_content_ok_truncates() {
        let content = ExtractedContent::ok("https://example.com", "x".repeat(9000));
        assert!(content.is_ok());
        assert_eq!(content.text.chars().count(), MAX_EXTRACT_CHARS);
    }

    #[test]
    fn test_extracted_content_failed_is_diagnostic() {
        let content = ExtractedContent::failed("https://example.com", "HTTP 404");
        assert_eq!(content.status, FetchStatus::Failed);
        assert_eq!(content.text, "HTTP 404");
        assert!(!content.is_ok());
    }

    #[test]
    fn test_extracted_content_empty() {
        let content = ExtractedContent::empty("https://example.com");
        assert_eq!(content.status, FetchStatus::Empty);
        assert!(!content.is_ok());
    }

    #[test]
    fn test_search_batch_default_is_empty() {
        let batch = SearchBatch::default();
        assert!(batch.results.is_empty());
        assert!(batch.image_urls.is_empty());
    }
}
