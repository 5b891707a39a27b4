//! # Delver Core
//!
//! Core library for the Delver iterative research assistant.
//! Provides the run engine, iteration controller, query generation,
//! relevance filtering, content extraction, summarization, LLM provider
//! interface, configuration, and the run memory store.

pub mod brain;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod iteration;
pub mod memory;
pub mod providers;
pub mod query;
pub mod relevance;
pub mod search;
pub mod summarize;
pub mod types;

// Re-export commonly used types at the crate root.
pub use brain::{LlmProvider, MockLlmProvider};
pub use config::{DelverConfig, load_config};
pub use engine::{CompletedRun, ResearchEngine};
pub use error::{DelverError, Result};
pub use fetch::{ContentExtractor, HttpContentExtractor};
pub use iteration::{IterationController, IterationOutcome, NoOpCallback, ResearchCallback};
pub use memory::{MemoryStore, RunRecord};
pub use query::{QueryGenerator, QueryOutcome};
pub use relevance::RelevanceFilter;
pub use search::{DuckDuckGoSearch, SearchProvider};
pub use summarize::Summarizer;
pub use types::{
    CompletionRequest, CompletionResponse, ExtractedContent, FetchStatus, SearchBatch,
    SearchResult,
};
