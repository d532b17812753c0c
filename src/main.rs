mod agent;
mod app;
mod cli;
mod config;
mod llm;
mod logging;
mod mcp;
mod serial;
mod tools;
mod ui;
mod utils;

use crate::cli::{Args, Mode};
use crate::config::{serial_settings, ClientConfig, Settings};
use crate::logging::setup_logging;
use anyhow::{Context, Result};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine, the variables may come from the environment
    dotenv::dotenv().ok();

    let args = Args::parse();
    setup_logging(args.verbose);

    let settings = Settings::load().context("Failed to load settings")?;

    match args.mode {
        Some(Mode::Server { serial }) => app::server::run(serial_settings(&serial, &settings)).await,
        Some(Mode::Console { serial }) => {
            app::console::run(serial_settings(&serial, &settings)).await
        }
        None => {
            let Some(server_path) = args.client.server_path.as_deref() else {
                println!("Usage: led-assistant <path_to_server_script>");
                std::process::exit(1);
            };

            let config = ClientConfig::resolve(
                server_path,
                &args.client,
                &settings,
                std::env::var("ANTHROPIC_API_KEY").ok(),
            )
            .context("Invalid configuration")?;

            app::terminal::run(config).await
        }
    }
}
