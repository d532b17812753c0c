use crate::agent::AgentConfig;
use crate::cli::{ClientArgs, SerialArgs};
use crate::llm::AnthropicClient;
use crate::mcp::ServerLaunch;
use crate::serial::SerialSettings;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "claude-opus-4-1-20250805";
pub const DEFAULT_MAX_HISTORY: usize = 50;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("ANTHROPIC_API_KEY environment variable is required")]
    MissingApiKey,
    #[error("Server script must be a .py or .js file, or a .json launch descriptor: {}", .0.display())]
    UnsupportedServerPath(PathBuf),
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Get the path to the settings file
pub fn get_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| {
        home.join(".config")
            .join("led-assistant")
            .join("settings.json")
    })
}

/// Optional defaults from `~/.config/led-assistant/settings.json`.
/// Command line flags override every field.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: Option<usize>,
    pub max_iterations: Option<usize>,
    pub max_history: Option<usize>,
    pub serial_port: Option<String>,
    pub baud_rate: Option<u32>,
    pub timeout_ms: Option<u64>,
}

impl Settings {
    /// Loads the user's settings file; a missing file means no overrides
    pub fn load() -> Result<Self, ConfigError> {
        match get_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Everything the chat client needs, resolved from flags, settings and environment
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server: ServerLaunch,
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub agent: AgentConfig,
    pub max_history: usize,
}

impl ClientConfig {
    pub fn resolve(
        server_path: &Path,
        args: &ClientArgs,
        settings: &Settings,
        api_key: Option<String>,
    ) -> Result<Self, ConfigError> {
        let api_key = api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;
        let server = ServerLaunch::from_path(server_path)?;

        let defaults = AgentConfig::default();
        let agent = AgentConfig {
            max_iterations: args
                .max_iterations
                .or(settings.max_iterations)
                .unwrap_or(defaults.max_iterations),
            max_tokens: args
                .max_tokens
                .or(settings.max_tokens)
                .unwrap_or(defaults.max_tokens),
            ..defaults
        };

        Ok(Self {
            server,
            api_key,
            model: args
                .model
                .clone()
                .or_else(|| settings.model.clone())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: args
                .base_url
                .clone()
                .or_else(|| settings.base_url.clone())
                .unwrap_or_else(AnthropicClient::default_base_url),
            agent,
            max_history: args
                .max_history
                .or(settings.max_history)
                .unwrap_or(DEFAULT_MAX_HISTORY),
        })
    }
}

pub fn serial_settings(args: &SerialArgs, settings: &Settings) -> SerialSettings {
    let defaults = SerialSettings::default();
    SerialSettings {
        port: args
            .port
            .clone()
            .or_else(|| settings.serial_port.clone())
            .unwrap_or(defaults.port),
        baud_rate: args
            .baud_rate
            .or(settings.baud_rate)
            .unwrap_or(defaults.baud_rate),
        timeout: args
            .timeout_ms
            .or(settings.timeout_ms)
            .map(Duration::from_millis)
            .unwrap_or(defaults.timeout),
    }
}
