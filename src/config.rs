use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

use crate::pipeline::PipelineSettings;

const DEFAULT_ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";
const DEFAULT_ARXIV_PDF_URL: &str = "https://arxiv.org/pdf";
const DEFAULT_SUMMARIZATION_MODEL: &str = "deepseek-chat";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the arXiv Sage services.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the arXiv Atom query endpoint.
    pub arxiv_api_url: String,
    /// Base URL under which paper PDFs are served (`{base}/{paper_id}`).
    pub arxiv_pdf_url: String,
    /// Backend used to condense extracted paper text.
    pub summarization_provider: SummarizationProvider,
    /// Optional override for the summarization endpoint base URL.
    pub summarization_api_url: Option<String>,
    /// API key sent as a bearer token to hosted summarization providers.
    pub summarization_api_key: Option<String>,
    /// Model identifier passed to the summarization provider.
    pub summarization_model: String,
    /// Upper bound on prompt tokens taken from a paper's text.
    pub summarization_max_input_tokens: usize,
    /// Number of documents processed concurrently by one batch.
    pub pipeline_workers: usize,
    /// Result count used when a request omits `max_results`.
    pub default_max_results: usize,
    /// Hard ceiling applied to caller supplied `max_results`.
    pub max_results_limit: usize,
    /// Summary length budget (characters) used when a request omits one.
    pub default_summary_length: usize,
    /// Deadline after which an in-flight batch is cancelled.
    pub request_timeout_secs: u64,
    /// Timeout applied to each upstream HTTP request.
    pub http_timeout_secs: u64,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

/// Supported summarization backends.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SummarizationProvider {
    /// DeepSeek hosted chat completions API.
    DeepSeek,
    /// Any other OpenAI-compatible chat completions API.
    OpenAI,
    /// Local Ollama runtime.
    Ollama,
}

impl SummarizationProvider {
    /// Whether the provider requires an API key.
    pub fn requires_api_key(self) -> bool {
        !matches!(self, Self::Ollama)
    }

    /// Lowercase label used in logs and diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            Self::DeepSeek => "deepseek",
            Self::OpenAI => "openai",
            Self::Ollama => "ollama",
        }
    }
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let summarization_provider = match load_env_optional("SUMMARIZATION_PROVIDER") {
            Some(value) => value.parse().map_err(|()| {
                ConfigError::InvalidValue("SUMMARIZATION_PROVIDER".to_string())
            })?,
            None => SummarizationProvider::DeepSeek,
        };
        let summarization_api_key = load_env_optional("SUMMARIZATION_API_KEY")
            .or_else(|| load_env_optional("DEEPSEEK_API_KEY"));
        if summarization_provider.requires_api_key() && summarization_api_key.is_none() {
            return Err(ConfigError::MissingVariable(
                "SUMMARIZATION_API_KEY".to_string(),
            ));
        }

        let pipeline_workers = parse_optional("PIPELINE_WORKERS")?.unwrap_or(5);
        if pipeline_workers == 0 {
            return Err(ConfigError::InvalidValue("PIPELINE_WORKERS".to_string()));
        }

        Ok(Self {
            arxiv_api_url: load_env_optional("ARXIV_API_URL")
                .unwrap_or_else(|| DEFAULT_ARXIV_API_URL.to_string()),
            arxiv_pdf_url: load_env_optional("ARXIV_PDF_URL")
                .unwrap_or_else(|| DEFAULT_ARXIV_PDF_URL.to_string()),
            summarization_provider,
            summarization_api_url: load_env_optional("SUMMARIZATION_API_URL"),
            summarization_api_key,
            summarization_model: load_env_optional("SUMMARIZATION_MODEL")
                .unwrap_or_else(|| DEFAULT_SUMMARIZATION_MODEL.to_string()),
            summarization_max_input_tokens: parse_optional("SUMMARIZATION_MAX_INPUT_TOKENS")?
                .unwrap_or(48_000),
            pipeline_workers,
            default_max_results: parse_optional("DEFAULT_MAX_RESULTS")?.unwrap_or(10),
            max_results_limit: parse_optional("MAX_RESULTS_LIMIT")?.unwrap_or(50),
            default_summary_length: parse_optional("DEFAULT_SUMMARY_LENGTH")?.unwrap_or(500),
            request_timeout_secs: parse_optional("REQUEST_TIMEOUT_SECS")?.unwrap_or(300),
            http_timeout_secs: parse_optional("HTTP_TIMEOUT_SECS")?.unwrap_or(60),
            server_port: parse_optional("SERVER_PORT")?,
        })
    }

    /// Derive the orchestrator settings from the process configuration.
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            workers: self.pipeline_workers,
            request_timeout: Some(Duration::from_secs(self.request_timeout_secs)),
        }
    }

    /// Timeout applied to individual upstream HTTP requests.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Defaults and limits applied to caller-supplied request parameters.
    pub fn request_defaults(&self) -> RequestDefaults {
        RequestDefaults {
            max_results: self.default_max_results,
            max_results_limit: self.max_results_limit,
            summary_length: self.default_summary_length,
        }
    }
}

/// Defaults for optional request parameters shared by the HTTP, MCP, and CLI surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestDefaults {
    /// Result count used when the caller omits one.
    pub max_results: usize,
    /// Largest result count a caller may request.
    pub max_results_limit: usize,
    /// Summary length used when the caller omits one.
    pub summary_length: usize,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            max_results: 10,
            max_results_limit: 50,
            summary_length: 500,
        }
    }
}

impl RequestDefaults {
    /// Resolve a requested result count: negative becomes zero, large values are capped.
    pub fn resolve_max_results(&self, requested: Option<i64>) -> usize {
        match requested {
            Some(value) if value <= 0 => 0,
            Some(value) => usize::try_from(value)
                .unwrap_or(usize::MAX)
                .min(self.max_results_limit),
            None => self.max_results.min(self.max_results_limit),
        }
    }

    /// Resolve a requested summary length, falling back to the default.
    pub fn resolve_summary_length(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.summary_length)
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

impl std::str::FromStr for SummarizationProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deepseek" => Ok(Self::DeepSeek),
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        arxiv_api_url = %config.arxiv_api_url,
        provider = config.summarization_provider.label(),
        model = %config.summarization_model,
        workers = config.pipeline_workers,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
