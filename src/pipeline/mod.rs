//! Keyword-to-summary pipeline: search, bounded-parallel extraction and summarization, and the
//! single-flight caches shared by every entry point.

pub mod cache;
mod fingerprint;
mod service;
mod types;

pub use cache::{CacheLayer, CacheStats, ComputeCache, StoreStats};
pub use fingerprint::fingerprint;
pub use service::{PipelineApi, SummaryPipeline};
pub use types::{
    BatchOutcome, DocumentFailure, DocumentOutcome, ExtractedText, FailureStage, InputError,
    PipelineError, PipelineResult, PipelineSettings, SummarizeRequest, validate_document_id,
    validate_length_budget,
};
