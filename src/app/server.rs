use crate::mcp::MCPServer;
use crate::serial::{LedController, SerialRelay, SerialSettings};
use anyhow::Result;
use tracing::info;

pub async fn run(serial: SerialSettings) -> Result<()> {
    info!(
        "Serial LED control on {} at {} baud",
        serial.port, serial.baud_rate
    );

    let controller = LedController::new(SerialRelay::with_settings(serial));
    let mut server = MCPServer::new(controller);
    server.run().await
}
