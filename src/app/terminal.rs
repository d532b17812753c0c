use crate::agent::{Agent, QueryError};
use crate::config::ClientConfig;
use crate::llm::AnthropicClient;
use crate::mcp::McpClient;
use crate::ui::terminal::TerminalUI;
use crate::ui::{UIError, UIMessage, UserInterface};
use anyhow::{Context, Result};
use tracing::{debug, warn};

pub async fn run(config: ClientConfig) -> Result<()> {
    let ui = TerminalUI::new()?;

    let client = McpClient::spawn(&config.server)
        .await
        .context("Failed to start MCP server")?;
    client
        .initialize()
        .await
        .context("MCP initialize handshake failed")?;

    let tools = client
        .list_server_tools()
        .await
        .context("Failed to list server tools")?;
    let names: Vec<String> = tools.into_iter().map(|tool| tool.name).collect();
    ui.display(UIMessage::Info(format!(
        "\nConnected to server with tools: {names:?}"
    )))
    .await?;

    let llm_client = AnthropicClient::new(config.api_key, config.model, config.base_url);
    let mut agent = Agent::new(Box::new(llm_client), Box::new(client), config.agent);

    chat_loop(&mut agent, &ui, config.max_history).await
}

/// Interactive loop: one query at a time until `quit`, Ctrl-C or Ctrl-D
pub async fn chat_loop(
    agent: &mut Agent,
    ui: &dyn UserInterface,
    max_history: usize,
) -> Result<()> {
    ui.display(UIMessage::Info("\nMCP Client Started!".to_string()))
        .await?;
    ui.display(UIMessage::Info(
        "Type your queries or 'quit' to exit.".to_string(),
    ))
    .await?;

    loop {
        let query = match ui.get_input("Query: ").await {
            Ok(query) => query,
            Err(UIError::Cancelled) => break,
            Err(e) => return Err(e.into()),
        };

        if query.eq_ignore_ascii_case("quit") {
            break;
        }

        match agent.process_query(&query).await {
            Ok(answer) => {
                debug!(
                    "Query answered after {} model requests",
                    agent.last_iteration_count()
                );
                ui.display(UIMessage::Answer(answer)).await?
            }
            Err(e) => {
                report_query_error(&e);
                debug!(
                    "Query aborted in state {:?} after {} model requests",
                    agent.state(),
                    agent.last_iteration_count()
                );
                ui.display(UIMessage::Error(e.to_string())).await?
            }
        }

        agent.trim_history(max_history);
        debug!("{} messages in history", agent.history().len());
    }

    debug!("Chat loop finished");
    Ok(())
}

fn report_query_error(error: &QueryError) {
    match error {
        QueryError::Model(e) => warn!("Model request failed: {:#}", e),
        QueryError::ToolListing(e) => warn!("Tool listing failed: {}", e),
        QueryError::ToolExecution { tool, source } => {
            warn!("Tool {} failed: {}", tool, source)
        }
    }
}
