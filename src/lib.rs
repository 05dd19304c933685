#![deny(missing_docs)]

//! Core library for arXiv Sage: keyword search over arXiv, PDF text extraction, and cached,
//! bounded-parallel summarization exposed over HTTP, MCP, and a CLI.

/// HTTP routing and REST handlers.
pub mod api;
/// arXiv search and metadata lookup.
pub mod arxiv;
/// Environment-driven configuration management.
pub mod config;
/// PDF download and text extraction.
pub mod extraction;
/// Structured logging and tracing setup.
pub mod logging;
/// Model Context Protocol server implementation.
pub mod mcp;
/// Pipeline metrics helpers.
pub mod metrics;
/// Search, extraction, and summarization orchestration with shared caches.
pub mod pipeline;
/// Summarization client abstraction and adapters.
pub mod summarization;
