//! The seam between the conversation loop and whatever executes tools.

use crate::llm::ToolDefinition;
use crate::mcp::McpError;
use async_trait::async_trait;

/// Flattened outcome of one tool execution
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub content: String,
    pub is_error: bool,
}

#[async_trait]
pub trait ToolGateway: Send + Sync {
    /// Tools currently offered by the server
    async fn list_tools(&self) -> Result<Vec<ToolDefinition>, McpError>;

    async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolOutput, McpError>;
}
