//! Serial relay to the ESP8266 LED firmware
//!
//! The firmware speaks a line protocol: one ASCII command per line
//! (`on`, `off`, `status`) answered by one ASCII line.

mod relay;


pub use relay::{SerialError, SerialRelay, SerialSettings};

#[cfg(test)]
pub use relay::SerialLink;

use std::fmt;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedCommand {
    On,
    Off,
    Status,
}

impl LedCommand {
    pub const ALL: [LedCommand; 3] = [LedCommand::On, LedCommand::Off, LedCommand::Status];

    pub fn as_str(&self) -> &'static str {
        match self {
            LedCommand::On => "on",
            LedCommand::Off => "off",
            LedCommand::Status => "status",
        }
    }
}

impl fmt::Display for LedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidAction(pub String);

impl fmt::Display for InvalidAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid action: {}. Valid actions are 'on', 'off', and 'status'.",
            self.0
        )
    }
}

impl std::error::Error for InvalidAction {}

impl FromStr for LedCommand {
    type Err = InvalidAction;

    /// Matching is exact; the device never sees anything but these three words
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LedCommand::ALL
            .into_iter()
            .find(|command| command.as_str() == s)
            .ok_or_else(|| InvalidAction(s.to_string()))
    }
}

/// The two LED operations exposed as tools
#[derive(Clone)]
pub struct LedController {
    relay: SerialRelay,
}

impl LedController {
    pub fn new(relay: SerialRelay) -> Self {
        Self { relay }
    }

    /// Current LED state as reported by the device
    pub async fn get_led_status(&self) -> Result<String, SerialError> {
        self.relay.send(LedCommand::Status).await
    }

    /// Sends `action` to the device. Unknown actions yield a rejection
    /// message, not an error.
    pub async fn control_led(&self, action: &str) -> Result<String, SerialError> {
        match action.parse::<LedCommand>() {
            Ok(command) => self.relay.send(command).await,
            Err(invalid) => {
                warn!("Rejected LED action: {}", invalid.0);
                Ok(invalid.to_string())
            }
        }
    }
}
