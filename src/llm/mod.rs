//! LLM integration providing an abstraction over the model API
//!
//! The conversation loop only depends on the `LLMProvider` trait; the
//! Anthropic Messages API is the one concrete provider.

#[cfg(test)]
mod tests;

mod utils;

pub mod anthropic;
pub mod types;

pub use anthropic::AnthropicClient;
pub use types::*;

use anyhow::Result;
use async_trait::async_trait;

/// Trait for different LLM provider implementations
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Sends a request to the LLM service
    async fn send_message(&self, request: LLMRequest) -> Result<LLMResponse>;
}
