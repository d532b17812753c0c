//! Model Context Protocol over stdio: the LED server and the client used
//! by the chat loop to reach any MCP server.

mod client;
mod handler;
mod server;
mod types;


pub use client::{McpClient, McpError, ServerLaunch};
#[cfg(test)]
pub use handler::MessageHandler;
pub use server::MCPServer;
