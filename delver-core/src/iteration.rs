//! One research iteration: query -> search -> filter -> extract ->
//! summarize.
//!
//! The controller is a pure pipeline over injected capabilities; all UI
//! concerns go through the `ResearchCallback` so the core stays
//! presentation-agnostic and testable.

use crate::brain::LlmProvider;
use crate::fetch::ContentExtractor;
use crate::query::{QueryGenerator, QueryOutcome};
use crate::relevance::RelevanceFilter;
use crate::search::SearchProvider;
use crate::summarize::Summarizer;
use crate::types::{ExtractedContent, SearchBatch};
use std::sync::Arc;

/// Callback trait for progress reporting during a run.
///
/// Implementations must be cheap and non-blocking; the controller calls
/// them inline between pipeline steps.
pub trait ResearchCallback: Send + Sync {
    /// An iteration is starting (0-based index).
    fn on_iteration_start(&self, index: usize, total: usize);
    /// The search query for this iteration was decided.
    fn on_query_generated(&self, index: usize, query: &str, fallback: bool);
    /// Search finished with this many raw results.
    fn on_search_complete(&self, index: usize, results: usize);
    /// Relevance filtering kept `kept` of `total` results.
    fn on_relevance_filtered(&self, index: usize, kept: usize, total: usize);
    /// Content extraction finished with `ok` successes and `failed`
    /// failures (timeouts, non-200s, empty pages).
    fn on_extraction_complete(&self, index: usize, ok: usize, failed: usize);
    /// The iteration finished, with or without a usable summary.
    fn on_iteration_complete(&self, index: usize, produced_summary: bool);
    /// The whole run finished with a final summary.
    fn on_run_complete(&self, final_summary: &str);
    /// No iteration produced a usable summary.
    fn on_run_failed(&self);
}

/// No-op callback for tests and headless use.
pub struct NoOpCallback;

impl ResearchCallback for NoOpCallback {
    fn on_iteration_start(&self, _index: usize, _total: usize) {}
    fn on_query_generated(&self, _index: usize, _query: &str, _fallback: bool) {}
    fn on_search_complete(&self, _index: usize, _results: usize) {}
    fn on_relevance_filtered(&self, _index: usize, _kept: usize, _total: usize) {}
    fn on_extraction_complete(&self, _index: usize, _ok: usize, _failed: usize) {}
    fn on_iteration_complete(&self, _index: usize, _produced_summary: bool) {}
    fn on_run_complete(&self, _final_summary: &str) {}
    fn on_run_failed(&self) {}
}

/// Output of one completed iteration.
///
/// `summary: None` means the iteration produced no usable evidence
/// (empty search, empty relevant set, all fetches failed, or an aborted
/// summarization); in that case images and source URLs are empty too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationOutcome {
    pub index: usize,
    /// The query actually searched, for observability.
    pub query: String,
    pub summary: Option<String>,
    pub image_urls: Vec<String>,
    /// URLs whose content contributed to the summary.
    pub source_urls: Vec<String>,
}

impl IterationOutcome {
    fn empty(index: usize, query: String) -> Self {
        Self {
            index,
            query,
            summary: None,
            image_urls: Vec::new(),
            source_urls: Vec::new(),
        }
    }
}

/// Runs a single iteration of the research pipeline.
pub struct IterationController {
    queries: QueryGenerator,
    search: Arc<dyn SearchProvider>,
    relevance: RelevanceFilter,
    extractor: Arc<dyn ContentExtractor>,
    summarizer: Summarizer,
}

impl IterationController {
    pub fn new(
        queries: QueryGenerator,
        search: Arc<dyn SearchProvider>,
        relevance: RelevanceFilter,
        extractor: Arc<dyn ContentExtractor>,
        summarizer: Summarizer,
    ) -> Self {
        Self {
            queries,
            search,
            relevance,
            extractor,
            summarizer,
        }
    }

    /// Run one iteration.
    ///
    /// `previous_summary` is the most recent usable iteration summary;
    /// when present, the query is a follow-up conditioned on it,
    /// otherwise the initial query is regenerated from the topic.
    pub async fn run(
        &self,
        topic: &str,
        index: usize,
        total: usize,
        previous_summary: Option<&str>,
        callback: &dyn ResearchCallback,
    ) -> IterationOutcome {
        callback.on_iteration_start(index, total);

        // GenerateQuery
        let outcome = match previous_summary.filter(|s| !s.is_empty()) {
            Some(summary) => self.queries.follow_up_query(summary, topic).await,
            None => self.queries.initial_query(topic).await,
        };
        let query = outcome.query().to_string();
        callback.on_query_generated(index, &query, outcome.is_fallback());
        if let QueryOutcome::Fallback(_) = outcome {
            tracing::info!(iteration = index, "query generation fell back to topic");
        }

        // Search, degrading provider errors to an empty batch.
        let batch = match self.search.search(&query).await {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!(iteration = index, error = %e, "search failed, continuing with empty batch");
                SearchBatch::default()
            }
        };
        callback.on_search_complete(index, batch.results.len());

        // FilterRelevance. An empty batch short-circuits to an empty set.
        let relevant = self.relevance.filter(&batch.results, topic).await;
        callback.on_relevance_filtered(index, relevant.len(), batch.results.len());
        if relevant.is_empty() {
            callback.on_iteration_complete(index, false);
            return IterationOutcome::empty(index, query);
        }

        // ExtractContent: concurrent fan-out, join semantics. One slow
        // or failed URL never cancels the others.
        let fetches = relevant.iter().map(|url| self.extractor.extract(url));
        let extracted: Vec<ExtractedContent> = futures::future::join_all(fetches).await;

        let ok: Vec<&ExtractedContent> = extracted.iter().filter(|c| c.is_ok()).collect();
        callback.on_extraction_complete(index, ok.len(), extracted.len() - ok.len());
        if ok.is_empty() {
            callback.on_iteration_complete(index, false);
            return IterationOutcome::empty(index, query);
        }

        let combined = ok
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let source_urls: Vec<String> = ok.iter().map(|c| c.url.clone()).collect();

        // Summarize
        let summary = self.summarizer.summarize_evidence(&combined, topic).await;
        if summary.is_empty() {
            tracing::warn!(iteration = index, "summarization produced no output");
            callback.on_iteration_complete(index, false);
            return IterationOutcome::empty(index, query);
        }

        callback.on_iteration_complete(index, true);
        IterationOutcome {
            index,
            query,
            summary: Some(summary),
            image_urls: batch.image_urls,
            source_urls,
        }
    }
}
