use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Serial connection options shared by the server and the console
#[derive(clap::Args, Debug, Clone)]
pub struct SerialArgs {
    /// Serial port of the LED device (default: COM5 on Windows, /dev/ttyUSB0 elsewhere)
    #[arg(long)]
    pub port: Option<String>,

    /// Baud rate of the serial link (default: 115200)
    #[arg(long)]
    pub baud_rate: Option<u32>,

    /// Read timeout for a device response in milliseconds (default: 2000)
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Mode {
    /// Run the serial LED control MCP server on stdio
    Server {
        #[command(flatten)]
        serial: SerialArgs,
    },

    /// Send LED commands by hand to check the hardware
    Console {
        #[command(flatten)]
        serial: SerialArgs,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct ClientArgs {
    /// Path to the MCP server script (.py or .js) or a .json launch descriptor
    pub server_path: Option<PathBuf>,

    /// Model name to use
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// API base URL of the Anthropic API
    #[arg(long)]
    pub base_url: Option<String>,

    /// Maximum number of output tokens per model request (default: 1000)
    #[arg(long)]
    pub max_tokens: Option<usize>,

    /// Maximum number of model requests per query (default: 10)
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Number of messages kept in the conversation history (default: 50)
    #[arg(long)]
    pub max_history: Option<usize>,
}

/// Define the application arguments
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub mode: Option<Mode>,

    #[command(flatten)]
    pub client: ClientArgs,

    /// Enable verbose logging (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

impl Args {
    pub fn parse() -> Self {
        <Args as Parser>::parse()
    }
}
