use crate::serial::{LedCommand, LedController, SerialRelay, SerialSettings};
use crate::ui::terminal::TerminalUI;
use crate::ui::{UIError, UIMessage, UserInterface};
use anyhow::Result;
use tracing::warn;

pub async fn run(serial: SerialSettings) -> Result<()> {
    let ui = TerminalUI::new()?;
    let port = serial.port.clone();
    let controller = LedController::new(SerialRelay::with_settings(serial));
    console_loop(&controller, &ui, &port).await
}

/// Reads commands from the user and forwards them to the device, no model involved
pub async fn console_loop(
    controller: &LedController,
    ui: &dyn UserInterface,
    port: &str,
) -> Result<()> {
    // The port is opened per command, not here
    ui.display(UIMessage::Info(format!("Using LED device on {port}")))
        .await?;

    loop {
        let input = match ui
            .get_input("Enter command (on, off, status, exit): ")
            .await
        {
            Ok(input) => input.to_lowercase(),
            Err(UIError::Cancelled) => break,
            Err(e) => return Err(e.into()),
        };

        if input == "exit" {
            ui.display(UIMessage::Info("Exiting...".to_string())).await?;
            break;
        }

        let Ok(command) = input.parse::<LedCommand>() else {
            ui.display(UIMessage::Info(
                "Invalid command. Please try again.".to_string(),
            ))
            .await?;
            continue;
        };

        match controller.control_led(command.as_str()).await {
            Ok(response) => {
                ui.display(UIMessage::Info(format!("Response: {response}")))
                    .await?
            }
            Err(e) => {
                warn!("Serial command failed: {}", e);
                ui.display(UIMessage::Error(e.to_string())).await?
            }
        }
    }

    Ok(())
}
