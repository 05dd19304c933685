//! JSON schema builders for MCP tools.

use crate::mcp::format::SettingsSnapshot;
use serde_json::{Map, Value};

/// Build the schema describing the `summarize-papers` tool input.
pub(crate) fn summarize_papers_input_schema(settings: &SettingsSnapshot) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(
        "keyword".into(),
        string_schema("arXiv search expression, e.g. `all:diffusion` or `cat:cs.LG`"),
    );
    properties.insert("max_results".into(), max_results_schema(settings));
    properties.insert("max_length".into(), max_length_schema(settings));

    finalize_object_schema(properties, &["keyword"])
}

/// Build the schema describing the `search-papers` tool input.
pub(crate) fn search_papers_input_schema(settings: &SettingsSnapshot) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("keyword".into(), string_schema("arXiv search expression"));
    properties.insert("max_results".into(), max_results_schema(settings));

    finalize_object_schema(properties, &["keyword"])
}

/// Build the schema describing the `summarize-paper` tool input.
pub(crate) fn summarize_paper_input_schema(settings: &SettingsSnapshot) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("paper_id".into(), paper_id_schema());
    properties.insert("max_length".into(), max_length_schema(settings));

    finalize_object_schema(properties, &["paper_id"])
}

/// Build the schema for tools taking only a paper identifier.
pub(crate) fn paper_id_input_schema() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("paper_id".into(), paper_id_schema());

    finalize_object_schema(properties, &["paper_id"])
}

/// Schema for tools without arguments.
pub(crate) fn empty_object_schema() -> Map<String, Value> {
    finalize_object_schema(Map::new(), &[])
}

fn paper_id_schema() -> Value {
    string_schema("arXiv identifier, e.g. `2401.00001v2` or `hep-th/9901001`")
}

fn max_results_schema(settings: &SettingsSnapshot) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("integer".into()));
    schema.insert(
        "description".into(),
        Value::String(format!(
            "Number of papers to process (0 to {}); negative values are treated as 0.",
            settings.max_results_limit
        )),
    );
    schema.insert(
        "default".into(),
        Value::Number(settings.default_max_results.into()),
    );
    schema.insert(
        "maximum".into(),
        Value::Number(settings.max_results_limit.into()),
    );
    Value::Object(schema)
}

fn max_length_schema(settings: &SettingsSnapshot) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("integer".into()));
    schema.insert(
        "description".into(),
        Value::String("Summary length budget in characters (must be > 0)".into()),
    );
    schema.insert(
        "default".into(),
        Value::Number(settings.default_summary_length.into()),
    );
    schema.insert("minimum".into(), Value::Number(1.into()));
    Value::Object(schema)
}

fn string_schema(description: &str) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("string".into()));
    schema.insert("description".into(), Value::String(description.into()));
    Value::Object(schema)
}

fn finalize_object_schema(properties: Map<String, Value>, required: &[&str]) -> Map<String, Value> {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("object".into()));
    schema.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert(
            "required".into(),
            Value::Array(
                required
                    .iter()
                    .map(|&key| Value::String(key.into()))
                    .collect(),
            ),
        );
    }
    schema.insert("additionalProperties".into(), Value::Bool(false));
    schema
}
