//! Error types for the Delver core.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering the LLM, search, memory, configuration, and engine domains.
//!
//! Most failures in the pipeline are recovered locally with a fallback
//! value (empty batch, fallback query, fail-open relevance, failed fetch
//! status) and never surface through these types; the variants below are
//! for the places where a caller genuinely needs to know.

use std::path::PathBuf;

/// Top-level error type for the Delver core library.
#[derive(Debug, thiserror::Error)]
pub enum DelverError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from LLM provider interactions.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API request failed: {message}")]
    ApiRequest { message: String },

    #[error("API response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Provider connection failed: {message}")]
    Connection { message: String },

    #[error("Provider not supported: {provider}")]
    UnsupportedProvider { provider: String },
}

/// Errors from the web search capability.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Search client setup failed: {message}")]
    Client { message: String },

    #[error("Search request failed: {message}")]
    Request { message: String },

    #[error("Search response parse error: {message}")]
    ResponseParse { message: String },
}

/// Errors from the run memory store.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("Failed to persist memory store at {path}: {message}")]
    PersistFailed { path: PathBuf, message: String },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// Errors from the run engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("No iteration out of {iterations} produced a usable summary")]
    NoUsableSummary { iterations: usize },
}

/// A type alias for results using the top-level `DelverError`.
pub type Result<T> = std::result::Result<T, DelverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_llm() {
        let err = DelverError::Llm(LlmError::ApiRequest {
            message: "connection refused".into(),
        });
        assert_eq!(
            err.to_string(),
            "LLM error: API request failed: connection refused"
        );
    }

    #[test]
    fn test_error_display_search() {
        let err = DelverError::Search(SearchError::Request {
            message: "dns failure".into(),
        });
        assert_eq!(
            err.to_string(),
            "Search error: Search request failed: dns failure"
        );
    }

    #[test]
    fn test_error_display_engine() {
        let err = DelverError::Engine(EngineError::NoUsableSummary { iterations: 3 });
        assert_eq!(
            err.to_string(),
            "Engine error: No iteration out of 3 produced a usable summary"
        );
    }

    #[test]
    fn test_error_display_memory() {
        let err = MemoryError::PersistFailed {
            path: PathBuf::from("/tmp/memory.json"),
            message: "disk full".into(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to persist memory store at /tmp/memory.json: disk full"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DelverError = io_err.into();
        assert!(matches!(err, DelverError::Io(_)));
    }

    #[test]
    fn test_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: DelverError = serde_err.into();
        assert!(matches!(err, DelverError::Serialization(_)));
    }

    #[test]
    fn test_llm_error_variants() {
        let err = LlmError::RateLimited {
            retry_after_secs: 60,
        };
        assert_eq!(err.to_string(), "Rate limited by provider, retry after 60s");

        let err = LlmError::UnsupportedProvider {
            provider: "carrier-pigeon".into(),
        };
        assert_eq!(err.to_string(), "Provider not supported: carrier-pigeon");
    }
}
