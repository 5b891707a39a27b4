//! Research engine — drives N iterations and persists the completed
//! run.
//!
//! Iterations run strictly sequentially: iteration i+1's query
//! generation observes iteration i's summary, so there is nothing to
//! parallelize across iterations. Within an iteration the controller
//! fans out page fetches; see `iteration.rs`.

use crate::brain::LlmProvider;
use crate::config::DelverConfig;
use crate::error::EngineError;
use crate::fetch::ContentExtractor;
use crate::iteration::{IterationController, ResearchCallback};
use crate::memory::{MemoryStore, RunRecord};
use crate::query::QueryGenerator;
use crate::relevance::RelevanceFilter;
use crate::search::SearchProvider;
use crate::summarize::Summarizer;
use std::sync::Arc;

/// A completed, persisted research run.
#[derive(Debug, Clone)]
pub struct CompletedRun {
    pub record: RunRecord,
    /// Image URLs collected across all iterations.
    pub image_urls: Vec<String>,
}

/// Orchestrates a full research run over injected capabilities.
pub struct ResearchEngine {
    controller: IterationController,
    summarizer: Summarizer,
    memory: MemoryStore,
}

impl ResearchEngine {
    /// Assemble an engine from its capability providers and config.
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        search: Arc<dyn SearchProvider>,
        extractor: Arc<dyn ContentExtractor>,
        config: &DelverConfig,
        memory: MemoryStore,
    ) -> Self {
        let temperature = config.llm.temperature;
        let controller = IterationController::new(
            QueryGenerator::new(provider.clone(), config.llm.query_model.clone(), temperature),
            search,
            RelevanceFilter::new(provider.clone(), temperature),
            extractor,
            Summarizer::new(provider.clone(), temperature),
        );

        Self {
            controller,
            summarizer: Summarizer::new(provider, temperature),
            memory,
        }
    }

    /// Run `iterations` research iterations over `topic`, then merge
    /// and persist.
    ///
    /// Returns `EngineError::NoUsableSummary` when no iteration yielded
    /// a summary; nothing is persisted in that case.
    pub async fn run(
        &self,
        topic: &str,
        iterations: usize,
        callback: &dyn ResearchCallback,
    ) -> Result<CompletedRun, EngineError> {
        let mut summaries: Vec<String> = Vec::new();
        let mut image_urls: Vec<String> = Vec::new();
        let mut referenced_urls: Vec<String> = Vec::new();
        let mut previous_summary: Option<String> = None;
        let mut last_query: Option<String> = None;

        for index in 0..iterations {
            let outcome = self
                .controller
                .run(topic, index, iterations, previous_summary.as_deref(), callback)
                .await;

            if last_query.as_deref() == Some(outcome.query.as_str()) {
                tracing::warn!(
                    iteration = index,
                    query = %outcome.query,
                    "query repeated from previous iteration"
                );
            }
            last_query = Some(outcome.query.clone());

            if let Some(summary) = outcome.summary {
                // A failed iteration leaves the last usable summary in
                // place for the next follow-up query.
                previous_summary = Some(summary.clone());
                summaries.push(summary);
                image_urls.extend(outcome.image_urls);
                referenced_urls.extend(outcome.source_urls);
            }
        }

        if summaries.is_empty() {
            callback.on_run_failed();
            return Err(EngineError::NoUsableSummary { iterations });
        }

        let mut final_summary = self.summarizer.summarize_final(&summaries, topic).await;
        if final_summary.is_empty() {
            // The evidence still exists even when the final synthesis
            // call fails; fall back to the raw iteration summaries.
            tracing::warn!("final summarization produced no output, joining iteration summaries");
            final_summary = summaries.join("\n");
        }

        let record = RunRecord::new(topic, final_summary, referenced_urls);
        if let Err(e) = self.memory.append(&record) {
            tracing::warn!(error = %e, "failed to persist run record");
        }

        callback.on_run_complete(&record.final_summary);
        Ok(CompletedRun { record, image_urls })
    }
}
