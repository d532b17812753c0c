use anyhow::Result;
use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

#[cfg(test)]
use std::sync::Arc;
#[cfg(test)]
use tokio::sync::Mutex as TokioMutex;

/// Writes one JSON-RPC message per line to the transport.
/// Replaced by `MockWriter` in tests.
#[async_trait]
pub trait MessageWriter: Send + Sync {
    /// Write a message followed by a newline and flush it.
    async fn write_message(&mut self, message: &str) -> Result<()>;
}

/// Line writer over any async output, normally the process stdout.
pub struct StdoutWriter<W = tokio::io::Stdout> {
    output: W,
}

impl StdoutWriter {
    pub fn new() -> Self {
        Self::with_output(tokio::io::stdout())
    }
}

impl<W> StdoutWriter<W>
where
    W: AsyncWrite + Unpin + Send + Sync,
{
    pub fn with_output(output: W) -> Self {
        Self { output }
    }
}

#[async_trait]
impl<W> MessageWriter for StdoutWriter<W>
where
    W: AsyncWrite + Unpin + Send + Sync,
{
    async fn write_message(&mut self, message: &str) -> Result<()> {
        self.output.write_all(message.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
pub struct MockWriter {
    pub messages: Arc<TokioMutex<Vec<String>>>,
}

#[cfg(test)]
impl MockWriter {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(TokioMutex::new(Vec::new())),
        }
    }

    pub async fn get_messages(&self) -> Vec<String> {
        self.messages.lock().await.clone()
    }
}

#[cfg(test)]
#[async_trait]
impl MessageWriter for MockWriter {
    async fn write_message(&mut self, message: &str) -> Result<()> {
        self.messages.lock().await.push(message.to_string());
        Ok(())
    }
}
