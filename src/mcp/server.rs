use crate::mcp::handler::MessageHandler;
use crate::serial::LedController;
use anyhow::Result;
use tokio::io::{stdin, AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, error, trace};

pub struct MCPServer {
    handler: MessageHandler,
}

impl MCPServer {
    pub fn new(controller: LedController) -> Self {
        Self {
            handler: MessageHandler::new(controller),
        }
    }

    #[cfg(test)]
    pub fn with_handler(handler: MessageHandler) -> Self {
        Self { handler }
    }

    pub async fn run(&mut self) -> Result<()> {
        debug!("Starting MCP server using stdio transport");
        self.serve(BufReader::new(stdin())).await;
        debug!("MCP server shutting down");
        Ok(())
    }

    /// Handles one message per input line until EOF
    pub async fn serve<R: AsyncBufRead + Unpin>(&mut self, mut reader: R) {
        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    error!("Failed to read from stdin: {}", e);
                    break;
                }
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            trace!("Received message: {}", trimmed);

            if let Err(e) = self.handler.handle_message(trimmed).await {
                error!("Error handling message: {}", e);
            }
        }
    }
}
