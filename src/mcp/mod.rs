//! Model Context Protocol (MCP) integration for arXiv Sage.
//!
//! This module wires the summarization pipeline into an MCP server so editors and agent hosts can
//! search and summarize papers over stdio. The surface area consists of:
//!
//! - Tools: `summarize-papers`, `search-papers`, `summarize-paper`, `paper-metadata`,
//!   `paper-text`, `clear-caches`, and `metrics`.
//! - Resources: `mcp://settings` and `mcp://usage`.
//!
//! Handlers, schemas, and formatting helpers are kept in focused submodules to make tests and
//! reviews small and targeted.

mod format;
pub mod handlers;
mod registry;
mod schemas;
mod server;

pub use format::SettingsSnapshot;
pub use server::ArxivSageMcpServer;
