//! Dispatch table for MCP tools and resources.
//!
//! Handlers are plain function pointers taking the server by reference; each one clones whatever
//! it needs (pipeline, settings) into a boxed `'static` future so dispatch never borrows the
//! server across an await.

use std::{collections::BTreeMap, future::Future, pin::Pin};

use rmcp::ErrorData as McpError;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, ReadResourceRequestParam, ReadResourceResult,
};

use super::server::ArxivSageMcpServer;

/// Boxed future produced by a resource handler.
pub type ResourceFuture =
    Pin<Box<dyn Future<Output = Result<ReadResourceResult, McpError>> + Send>>;
/// Boxed future produced by a tool handler.
pub type ToolFuture = Pin<Box<dyn Future<Output = Result<CallToolResult, McpError>> + Send>>;

/// Reads one `mcp://` resource.
pub type ResourceHandler = fn(&ArxivSageMcpServer, ReadResourceRequestParam) -> ResourceFuture;
/// Runs one tool invocation.
pub type ToolHandler = fn(&ArxivSageMcpServer, CallToolRequestParam) -> ToolFuture;

/// Handlers keyed by resource URI and tool name.
#[derive(Default)]
pub struct Registry {
    resources: BTreeMap<&'static str, ResourceHandler>,
    tools: BTreeMap<&'static str, ToolHandler>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `uri`.
    ///
    /// # Panics
    /// When `uri` is already registered; the tables are built once at startup.
    pub fn register_resource(&mut self, uri: &'static str, handler: ResourceHandler) {
        let previous = self.resources.insert(uri, handler);
        assert!(previous.is_none(), "resource {uri} registered twice");
    }

    /// Register `handler` under the tool `name`.
    ///
    /// # Panics
    /// When `name` is already registered.
    pub fn register_tool(&mut self, name: &'static str, handler: ToolHandler) {
        let previous = self.tools.insert(name, handler);
        assert!(previous.is_none(), "tool {name} registered twice");
    }

    pub fn resource(&self, uri: &str) -> Option<ResourceHandler> {
        self.resources.get(uri).copied()
    }

    pub fn tool(&self, name: &str) -> Option<ToolHandler> {
        self.tools.get(name).copied()
    }

    /// Registered tool names in sorted order.
    pub fn tool_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tools.keys().copied()
    }

    /// Registered resource URIs in sorted order.
    pub fn resource_uris(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }
}
