use super::LedCommand;
use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, trace};

#[derive(Error, Debug)]
pub enum SerialError {
    #[error("Failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },
    #[error("Serial I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No response from device within {0:?}")]
    Timeout(Duration),
    #[error("Device closed the connection without responding")]
    Closed,
    #[error("Serial worker failed: {0}")]
    Worker(String),
}

/// Connection parameters for the LED device
#[derive(Debug, Clone, PartialEq)]
pub struct SerialSettings {
    pub port: String,
    pub baud_rate: u32,
    pub timeout: Duration,
}

impl SerialSettings {
    pub fn default_port() -> String {
        if cfg!(windows) {
            "COM5".to_string()
        } else {
            "/dev/ttyUSB0".to_string()
        }
    }
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: Self::default_port(),
            baud_rate: 115200,
            timeout: Duration::from_secs(2),
        }
    }
}

/// One blocking command/response exchange with the device.
/// Implementations open the connection, write `command` plus a newline,
/// read a single line back and close the connection again.
pub trait SerialLink: Send + Sync {
    fn exchange(&self, command: &str) -> Result<String, SerialError>;
}

/// `SerialLink` backed by a real serial port
pub struct SerialPortLink {
    settings: SerialSettings,
}

impl SerialPortLink {
    pub fn new(settings: SerialSettings) -> Self {
        Self { settings }
    }
}

impl SerialLink for SerialPortLink {
    fn exchange(&self, command: &str) -> Result<String, SerialError> {
        let port = serialport::new(&self.settings.port, self.settings.baud_rate)
            .timeout(self.settings.timeout)
            .open()
            .map_err(|source| SerialError::Open {
                port: self.settings.port.clone(),
                source,
            })?;

        // Drop anything the firmware printed before this exchange (e.g. its boot banner)
        if let Err(e) = port.clear(serialport::ClearBuffer::Input) {
            debug!("Could not clear serial input buffer: {}", e);
        }

        let mut reader = BufReader::new(port);
        reader.get_mut().write_all(format!("{command}\n").as_bytes())?;
        reader.get_mut().flush()?;

        read_response_line(&mut reader, self.settings.timeout)
    }
}

/// Reads one newline-terminated line and strips surrounding whitespace
pub(crate) fn read_response_line<R: BufRead>(
    reader: &mut R,
    timeout: Duration,
) -> Result<String, SerialError> {
    let mut line = String::new();
    match reader.read_line(&mut line) {
        Ok(0) => Err(SerialError::Closed),
        Ok(_) => Ok(line.trim().to_string()),
        Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Err(SerialError::Timeout(timeout)),
        Err(e) => Err(SerialError::Io(e)),
    }
}

/// Relays LED commands to the device, one exchange at a time.
///
/// The port is only held open for a single write/read. The internal lock is
/// held for that whole span, so concurrent callers queue up instead of
/// interleaving on the port.
#[derive(Clone)]
pub struct SerialRelay {
    link: Arc<dyn SerialLink>,
    lock: Arc<Mutex<()>>,
}

impl SerialRelay {
    pub fn new(link: Arc<dyn SerialLink>) -> Self {
        Self {
            link,
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_settings(settings: SerialSettings) -> Self {
        Self::new(Arc::new(SerialPortLink::new(settings)))
    }

    pub async fn send(&self, command: LedCommand) -> Result<String, SerialError> {
        let _guard = self.lock.lock().await;
        debug!("Sending serial command: {}", command);

        let link = self.link.clone();
        let response = tokio::task::spawn_blocking(move || link.exchange(command.as_str()))
            .await
            .map_err(|e| SerialError::Worker(e.to_string()))??;

        trace!("Serial response: {}", response);
        Ok(response)
    }
}
