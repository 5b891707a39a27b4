//! Configuration system for Delver.
//!
//! Uses `figment` for layered configuration: defaults -> config file ->
//! environment. Configuration is loaded from
//! `~/.config/delver/config.toml` (or an explicit `--config` path) and
//! may be overridden with `DELVER_`-prefixed environment variables
//! (nested fields separated by `__`, e.g. `DELVER_LLM__MODEL`).

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Top-level configuration for a research run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DelverConfig {
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub fetch: FetchConfig,
    pub research: ResearchConfig,
    pub memory: MemoryConfig,
}

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name. Currently "anthropic".
    pub provider: String,
    /// Model used for summarization and relevance judgments.
    pub model: String,
    /// Optional stronger model for query generation; falls back to
    /// `model` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_model: Option<String>,
    /// Environment variable name containing the API key.
    pub api_key_env: String,
    /// Optional base URL override for the API endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Default temperature for generation.
    pub temperature: f32,
    /// Request timeout in seconds for provider calls.
    pub request_timeout_secs: u64,
    /// Retry policy for transient provider errors.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-3-haiku-20240307".to_string(),
            query_model: Some("claude-3-opus-20240229".to_string()),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            base_url: None,
            temperature: 0.7,
            request_timeout_secs: 60,
            retry: RetryConfig::default(),
        }
    }
}

impl LlmConfig {
    /// Validate this LLM config and return any warnings.
    ///
    /// Returns human-readable warning messages for problematic values;
    /// an empty Vec means the config is clean.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.temperature < 0.0 || self.temperature > 2.0 {
            warnings.push(format!(
                "temperature ({}) is outside the typical range 0.0-2.0",
                self.temperature
            ));
        }
        if self.request_timeout_secs == 0 {
            warnings.push("request_timeout_secs is 0; provider calls will fail".to_string());
        }
        warnings
    }
}

/// Retry policy for transient LLM provider errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

/// Web search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum results per query.
    pub max_results: usize,
    /// Optional endpoint override (used in tests).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 10,
            base_url: None,
        }
    }
}

/// Page fetch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-fetch timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum redirects to follow.
    pub max_redirects: usize,
    /// User-Agent header for page fetches. Some sites refuse requests
    /// without a browser-like UA.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_redirects: 5,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3"
                .to_string(),
        }
    }
}

/// Research loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Default number of refine-search-summarize iterations per run.
    pub iterations: usize,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self { iterations: 2 }
    }
}

/// Run memory configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Path to the memory store file. Defaults to `memory.json` under
    /// the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl MemoryConfig {
    /// Resolve the memory store path, falling back to the platform data
    /// directory, then the current directory.
    pub fn resolve_path(&self) -> PathBuf {
        if let Some(ref path) = self.path {
            return path.clone();
        }
        directories::ProjectDirs::from("", "", "delver")
            .map(|dirs| dirs.data_dir().join("memory.json"))
            .unwrap_or_else(|| PathBuf::from("memory.json"))
    }
}

/// Load configuration with layered precedence:
/// defaults -> config file -> `DELVER_*` environment variables.
///
/// With no explicit path, `~/.config/delver/config.toml` is merged when
/// it exists; a missing file is not an error.
pub fn load_config(config_path: Option<&Path>) -> Result<DelverConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(DelverConfig::default()));

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    } else if let Some(dirs) = directories::ProjectDirs::from("", "", "delver") {
        let user_config = dirs.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    figment = figment.merge(Env::prefixed("DELVER_").split("__"));

    figment.extract().map_err(|e| ConfigError::ParseError {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DelverConfig::default();
        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.llm.api_key_env, "ANTHROPIC_API_KEY");
        assert_eq!(config.search.max_results, 10);
        assert_eq!(config.fetch.timeout_secs, 10);
        assert_eq!(config.research.iterations, 2);
    }

    #[test]
    fn test_query_model_defaults_to_stronger_tier() {
        let config = LlmConfig::default();
        assert!(config.query_model.is_some());
        assert_ne!(config.query_model.as_deref(), Some(config.model.as_str()));
    }

    #[test]
    fn test_validate_clean_config() {
        assert!(LlmConfig::default().validate().is_empty());
    }

    #[test]
    fn test_validate_bad_temperature() {
        let config = LlmConfig {
            temperature: 3.5,
            ..Default::default()
        };
        let warnings = config.validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("temperature"));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[research]\niterations = 5\n\n[llm]\nmodel = \"claude-3-5-sonnet-latest\"\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.research.iterations, 5);
        assert_eq!(config.llm.model, "claude-3-5-sonnet-latest");
        // Untouched sections keep their defaults.
        assert_eq!(config.search.max_results, 10);
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let config = load_config(Some(Path::new("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config.research.iterations, 2);
    }

    #[test]
    fn test_memory_path_explicit_override() {
        let config = MemoryConfig {
            path: Some(PathBuf::from("/tmp/custom.json")),
        };
        assert_eq!(config.resolve_path(), PathBuf::from("/tmp/custom.json"));
    }
}
