//! Formatting helpers shared across MCP handlers and resources.

use crate::config::{Config, RequestDefaults};
use rmcp::model::ResourceContents;
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Value, json};

pub(crate) const APPLICATION_JSON: &str = "application/json";

/// Serialize a value to JSON, falling back to compact formatting on error.
pub(crate) fn serialize_json<T: Serialize>(value: &T, context_uri: &str) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|error| {
        tracing::warn!(uri = context_uri, %error, "Failed to serialize JSON prettily");
        serde_json::to_string(value).unwrap_or_else(|_| "{}".into())
    })
}

/// Build JSON resource contents for MCP resource responses.
pub(crate) fn json_resource_contents(uri: &str, text: String) -> ResourceContents {
    ResourceContents::TextResourceContents {
        uri: uri.to_string(),
        mime_type: Some(APPLICATION_JSON.into()),
        text,
        meta: None,
    }
}

/// Effective server settings exposed through the `settings` resource.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SettingsSnapshot {
    /// Summarization backend label.
    pub provider: String,
    /// Model used for summaries.
    pub model: String,
    /// Documents processed at once within a batch.
    pub workers: usize,
    /// Deadline applied to each request, in seconds.
    pub request_timeout_secs: u64,
    /// Result count used when callers omit `max_results`.
    pub default_max_results: usize,
    /// Largest accepted `max_results`.
    pub max_results_limit: usize,
    /// Summary length used when callers omit `max_length`.
    pub default_summary_length: usize,
}

impl SettingsSnapshot {
    /// Capture the settings relevant to MCP clients from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            provider: config.summarization_provider.label().to_string(),
            model: config.summarization_model.clone(),
            workers: config.pipeline_workers,
            request_timeout_secs: config.request_timeout_secs,
            default_max_results: config.default_max_results,
            max_results_limit: config.max_results_limit,
            default_summary_length: config.default_summary_length,
        }
    }

    /// Request defaults derived from these settings.
    pub fn request_defaults(&self) -> RequestDefaults {
        RequestDefaults {
            max_results: self.default_max_results,
            max_results_limit: self.max_results_limit,
            summary_length: self.default_summary_length,
        }
    }
}

/// Recommended tool flow returned by the `usage` resource.
pub(crate) fn usage_payload() -> Value {
    json!({
        "title": "arXiv Sage MCP Usage",
        "policy": [
            "Use arXiv query syntax for keywords, e.g. `all:diffusion` or `cat:cs.LG AND ti:graph`.",
            "Keep max_results small; every paper is downloaded and summarized.",
            "Repeated requests are served from cache; call clear-caches to force fresh results.",
            "Papers that fail are listed under `failed` and never abort the batch.",
        ],
        "flows": [
            {
                "name": "Explore a topic",
                "steps": [
                    "search-papers({ keyword, max_results? })",
                    "summarize-paper({ paper_id, max_length? })"
                ]
            },
            {
                "name": "Batch digest",
                "steps": [
                    "summarize-papers({ keyword, max_results?, max_length? })"
                ]
            }
        ]
    })
}
