use super::history::ConversationHistory;
use crate::llm::{ContentBlock, LLMProvider, LLMRequest, LLMResponse, Message};
use crate::mcp::McpError;
use crate::tools::ToolGateway;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const SYSTEM_PROMPT: &str = include_str!("../../resources/system_prompt.md");

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Model request failed: {0}")]
    Model(#[source] anyhow::Error),
    #[error("Failed to list tools: {0}")]
    ToolListing(#[source] McpError),
    #[error("Tool {tool} failed: {source}")]
    ToolExecution {
        tool: String,
        #[source]
        source: McpError,
    },
}

/// Where the conversation loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// No query has run yet
    Idle,
    AwaitingModel,
    ExecutingTools,
    Done,
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Upper bound on model requests per query
    pub max_iterations: usize,
    pub max_tokens: usize,
    pub system_prompt: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            max_tokens: 1000,
            system_prompt: SYSTEM_PROMPT.trim().to_string(),
        }
    }
}

pub struct Agent {
    llm_provider: Box<dyn LLMProvider>,
    tools: Box<dyn ToolGateway>,
    config: AgentConfig,
    history: ConversationHistory,
    state: LoopState,
    last_iteration_count: usize,
}

impl Agent {
    pub fn new(
        llm_provider: Box<dyn LLMProvider>,
        tools: Box<dyn ToolGateway>,
        config: AgentConfig,
    ) -> Self {
        Self {
            llm_provider,
            tools,
            config,
            history: ConversationHistory::new(),
            state: LoopState::Idle,
            last_iteration_count: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Number of model requests issued by the most recent query
    pub fn last_iteration_count(&self) -> usize {
        self.last_iteration_count
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn trim_history(&mut self, cap: usize) -> usize {
        let removed = self.history.trim(cap);
        if removed > 0 {
            debug!(
                "Trimmed {} messages from history, {} remain",
                removed,
                self.history.len()
            );
        }
        removed
    }

    fn set_state(&mut self, state: LoopState) {
        if self.state != state {
            debug!("Loop state: {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    /// Runs one query to completion and returns the aggregated answer.
    ///
    /// On failure the history keeps everything appended so far; every tool
    /// invocation in it still has its result.
    pub async fn process_query(&mut self, query: &str) -> Result<String, QueryError> {
        self.last_iteration_count = 0;
        self.history.push(Message::user_text(query));

        let tools = self
            .tools
            .list_tools()
            .await
            .map_err(QueryError::ToolListing)?;
        debug!("{} tools available", tools.len());

        let mut answer: Vec<String> = Vec::new();

        loop {
            if self.last_iteration_count >= self.config.max_iterations {
                warn!(
                    "Stopping after {} model requests without end of turn",
                    self.last_iteration_count
                );
                answer.push(format!(
                    "[Max iterations reached ({}). Ending response.]",
                    self.config.max_iterations
                ));
                break;
            }

            self.set_state(LoopState::AwaitingModel);
            let request = LLMRequest {
                messages: self.history.to_vec(),
                system_prompt: self.config.system_prompt.clone(),
                tools: Some(tools.clone()),
                max_tokens: self.config.max_tokens,
            };
            let response = self
                .llm_provider
                .send_message(request)
                .await
                .map_err(QueryError::Model)?;
            self.last_iteration_count += 1;

            debug!(
                "Response {} stop_reason={:?} input_tokens={} output_tokens={}",
                self.last_iteration_count,
                response.stop_reason,
                response.usage.input_tokens,
                response.usage.output_tokens
            );

            let end_turn = response.is_end_turn();
            self.process_response(response, &mut answer).await?;

            if end_turn {
                break;
            }
        }

        self.set_state(LoopState::Done);
        Ok(answer.join("\n"))
    }

    async fn process_response(
        &mut self,
        response: LLMResponse,
        answer: &mut Vec<String>,
    ) -> Result<(), QueryError> {
        for block in response.content {
            match block {
                ContentBlock::Text { text } => {
                    answer.push(text.clone());
                    self.history
                        .push(Message::assistant_blocks(vec![ContentBlock::Text { text }]));
                }
                ContentBlock::ToolUse { id, name, input } => {
                    self.set_state(LoopState::ExecutingTools);
                    info!("Calling tool {} with args {}", name, input);

                    let output = self
                        .tools
                        .call_tool(&name, input.clone())
                        .await
                        .map_err(|source| QueryError::ToolExecution {
                            tool: name.clone(),
                            source,
                        })?;
                    if output.is_error {
                        warn!("Tool {} reported an error: {}", name, output.content);
                    }

                    answer.push(format!("[Calling tool {name} with args {input}]"));
                    self.history.push(Message::assistant_blocks(vec![
                        ContentBlock::ToolUse {
                            id: id.clone(),
                            name,
                            input,
                        },
                    ]));
                    self.history
                        .push(Message::user_blocks(vec![ContentBlock::ToolResult {
                            tool_use_id: id,
                            content: output.content,
                            is_error: output.is_error.then_some(true),
                        }]));
                }
                ContentBlock::ToolResult { .. } => {
                    warn!("Ignoring tool_result block in model response");
                }
            }
        }

        self.set_state(LoopState::AwaitingModel);
        Ok(())
    }
}
