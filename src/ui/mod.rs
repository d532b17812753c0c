pub mod terminal;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum UIMessage {
    /// Status lines of the session itself
    Info(String),
    /// The aggregated answer to a query
    Answer(String),
    /// A failed query; the session goes on
    Error(String),
}

#[derive(Error, Debug)]
pub enum UIError {
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Input cancelled")]
    Cancelled,
    #[error("Input error: {0}")]
    Other(String),
}

#[async_trait]
pub trait UserInterface: Send + Sync {
    /// Display a message to the user
    async fn display(&self, message: UIMessage) -> Result<(), UIError>;

    /// Get a line of input from the user; `Cancelled` on Ctrl-C or Ctrl-D
    async fn get_input(&self, prompt: &str) -> Result<String, UIError>;
}
