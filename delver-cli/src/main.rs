//! Delver CLI — iterative web research from the terminal.
//!
//! Drives the core engine with a console progress callback: each
//! pipeline step prints one human-readable status line, and the final
//! summary is printed when the run completes.

use anyhow::Context;
use clap::Parser;
use delver_core::config::load_config;
use delver_core::engine::ResearchEngine;
use delver_core::fetch::HttpContentExtractor;
use delver_core::iteration::ResearchCallback;
use delver_core::memory::MemoryStore;
use delver_core::providers;
use delver_core::search::DuckDuckGoSearch;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Delver: iterative AI-powered search and summarization
#[derive(Parser, Debug)]
#[command(name = "delver", version, about, long_about = None)]
struct Cli {
    /// Topic to research
    topic: String,

    /// Number of refine-search-summarize iterations
    #[arg(short = 'n', long)]
    iterations: Option<usize>,

    /// LLM model to use for summarization and relevance
    #[arg(short, long)]
    model: Option<String>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Memory store path (defaults to the platform data directory)
    #[arg(long)]
    memory: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress progress output, print only the final summary
    #[arg(short, long)]
    quiet: bool,
}

/// Prints progress lines for each pipeline step.
struct ConsoleCallback {
    quiet: bool,
}

impl ConsoleCallback {
    fn line(&self, text: String) {
        if !self.quiet {
            println!("{text}");
        }
    }
}

impl ResearchCallback for ConsoleCallback {
    fn on_iteration_start(&self, index: usize, total: usize) {
        self.line(format!("Iteration {}/{}:", index + 1, total));
    }

    fn on_query_generated(&self, _index: usize, query: &str, fallback: bool) {
        if fallback {
            self.line(format!("  Falling back to the topic as query: {query}"));
        } else {
            self.line(format!("  Generated search query: {query}"));
        }
    }

    fn on_search_complete(&self, _index: usize, results: usize) {
        self.line(format!("  Search returned {results} results"));
    }

    fn on_relevance_filtered(&self, _index: usize, kept: usize, total: usize) {
        self.line(format!("  {kept} of {total} results judged relevant"));
    }

    fn on_extraction_complete(&self, _index: usize, ok: usize, failed: usize) {
        if failed > 0 {
            self.line(format!("  Extracted {ok} pages ({failed} failed)"));
        } else {
            self.line(format!("  Extracted {ok} pages"));
        }
    }

    fn on_iteration_complete(&self, index: usize, produced_summary: bool) {
        if produced_summary {
            self.line(format!("  Iteration {} summarized.", index + 1));
        } else {
            self.line(format!(
                "  Iteration {} produced no usable evidence.",
                index + 1
            ));
        }
    }

    fn on_run_complete(&self, _final_summary: &str) {}

    fn on_run_failed(&self) {}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = load_config(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(model) = cli.model {
        config.llm.model = model;
    }
    for warning in config.llm.validate() {
        tracing::warn!("{warning}");
    }

    let iterations = cli
        .iterations
        .unwrap_or(config.research.iterations)
        .max(1);

    let provider =
        providers::create_provider(&config.llm).context("failed to initialize LLM provider")?;
    let search =
        Arc::new(DuckDuckGoSearch::new(&config.search).context("failed to initialize search")?);
    let extractor = Arc::new(
        HttpContentExtractor::new(&config.fetch).context("failed to initialize fetch client")?,
    );

    let memory_path = cli
        .memory
        .unwrap_or_else(|| config.memory.resolve_path());
    let memory = MemoryStore::new(&memory_path);

    let engine = ResearchEngine::new(provider, search, extractor, &config, memory);
    let callback = ConsoleCallback { quiet: cli.quiet };

    match engine.run(&cli.topic, iterations, &callback).await {
        Ok(run) => {
            if !cli.quiet {
                println!();
            }
            println!("{}", run.record.final_summary);
            if !cli.quiet && !run.image_urls.is_empty() {
                println!();
                println!("Images:");
                for url in &run.image_urls {
                    println!("  {url}");
                }
            }
            if !cli.quiet {
                println!();
                println!("Run saved to {}", memory_path.display());
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Research failed: {e}");
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
