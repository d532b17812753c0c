use super::types::*;
use crate::serial::LedController;
use crate::utils::{MessageWriter, StdoutWriter};
use anyhow::Result;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, trace, warn};

const SERVER_NAME: &str = "serial_led_control";

/// JSON-RPC error code for an unknown method
const METHOD_NOT_FOUND: i32 = -32601;
/// JSON-RPC error code for invalid params, used for unknown tool names
const INVALID_PARAMS: i32 = -32602;

#[derive(Debug, Deserialize)]
struct ControlLedArgs {
    action: String,
}

/// Descriptors for the tools this server exposes
fn led_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: "get_led_status".to_string(),
            description: Some(
                "Get the current status of the LED. Returns a string indicating whether the LED is ON or OFF."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
        Tool {
            name: "control_led".to_string(),
            description: Some(
                "Control the LED on the ESP8266 device. Returns a string indicating the result of the action."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "action": {
                        "type": "string",
                        "description": "The action to perform. Valid actions are \"on\", \"off\", and \"status\"."
                    }
                },
                "required": ["action"]
            }),
        },
    ]
}

pub struct MessageHandler {
    controller: LedController,
    message_writer: Box<dyn MessageWriter>,
}

impl MessageHandler {
    pub fn new(controller: LedController) -> Self {
        Self::with_writer(controller, Box::new(StdoutWriter::new()))
    }

    pub fn with_writer(controller: LedController, message_writer: Box<dyn MessageWriter>) -> Self {
        Self {
            controller,
            message_writer,
        }
    }

    async fn send_response<T: serde::Serialize>(&mut self, id: RequestId, result: T) -> Result<()> {
        let response = JSONRPCResponse {
            jsonrpc: "2.0".to_string(),
            id,
            result,
        };
        self.send_message(&serde_json::to_value(response)?).await
    }

    async fn send_error(&mut self, id: RequestId, code: i32, message: String) -> Result<()> {
        let error = JSONRPCError {
            jsonrpc: "2.0".to_string(),
            id,
            error: ErrorObject {
                code,
                message,
                data: None,
            },
        };
        self.send_message(&serde_json::to_value(error)?).await
    }

    async fn send_message(&mut self, message: &serde_json::Value) -> Result<()> {
        let message_str = serde_json::to_string(message)?;
        debug!("Sending message: {}", message_str);
        self.message_writer.write_message(&message_str).await
    }

    async fn handle_initialize(&mut self, id: RequestId, params: InitializeParams) -> Result<()> {
        debug!(
            "Initialize from {} {} (protocol {})",
            params.client_info.name, params.client_info.version, params.protocol_version
        );

        self.send_response(
            id,
            InitializeResult {
                capabilities: ServerCapabilities {
                    tools: Some(ToolsCapability {
                        list_changed: Some(false),
                    }),
                    experimental: None,
                },
                protocol_version: PROTOCOL_VERSION.to_string(),
                server_info: Implementation {
                    name: SERVER_NAME.to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
                instructions: Some(
                    "Controls an LED on an ESP8266 board connected over a serial port.".to_string(),
                ),
            },
        )
        .await
    }

    async fn handle_tools_list(&mut self, id: RequestId) -> Result<()> {
        trace!("Handling tools/list request");
        self.send_response(
            id,
            ListToolsResult {
                tools: led_tools(),
                next_cursor: None,
            },
        )
        .await
    }

    async fn handle_tool_call(&mut self, id: RequestId, params: ToolCallParams) -> Result<()> {
        debug!("Handling tool call for {}", params.name);
        let arguments = params.arguments.unwrap_or_else(|| json!({}));

        let outcome = match params.name.as_str() {
            "get_led_status" => self.controller.get_led_status().await,
            "control_led" => match serde_json::from_value::<ControlLedArgs>(arguments) {
                Ok(args) => self.controller.control_led(&args.action).await,
                Err(e) => {
                    return self
                        .send_response(
                            id,
                            ToolCallResult::text(format!("Invalid tool parameters: {e}"), true),
                        )
                        .await;
                }
            },
            name => {
                return self
                    .send_error(id, INVALID_PARAMS, format!("Tool not found: {name}"))
                    .await;
            }
        };

        let result = match outcome {
            Ok(text) => ToolCallResult::text(text, false),
            Err(e) => {
                warn!("Serial command failed: {}", e);
                ToolCallResult::text(e.to_string(), true)
            }
        };
        self.send_response(id, result).await
    }

    /// Main message handling entry point
    pub async fn handle_message(&mut self, message: &str) -> Result<()> {
        let message: JSONRPCMessage = match serde_json::from_str(message) {
            Ok(msg) => msg,
            Err(e) => {
                error!("Invalid JSON-RPC message: {}", e);
                return Ok(());
            }
        };

        match message {
            JSONRPCMessage::Request {
                method, id, params, ..
            } => {
                trace!("Processing request: method={}, id={:?}", method, id);
                match method.as_str() {
                    "initialize" => {
                        match serde_json::from_value::<InitializeParams>(
                            params.unwrap_or_default(),
                        ) {
                            Ok(params) => self.handle_initialize(id, params).await?,
                            Err(e) => {
                                warn!("Malformed initialize request: {}", e);
                                self.send_error(
                                    id,
                                    INVALID_PARAMS,
                                    format!("Invalid initialize parameters: {e}"),
                                )
                                .await?;
                            }
                        }
                    }
                    "ping" => {
                        self.send_response(id, EmptyResult { meta: None }).await?;
                    }
                    "tools/list" => {
                        self.handle_tools_list(id).await?;
                    }
                    "tools/call" => {
                        match serde_json::from_value::<ToolCallParams>(params.unwrap_or_default()) {
                            Ok(params) => {
                                self.handle_tool_call(id, params).await?;
                            }
                            Err(e) => {
                                self.send_response(
                                    id,
                                    ToolCallResult::text(
                                        format!("Invalid tool parameters: {e}"),
                                        true,
                                    ),
                                )
                                .await?;
                            }
                        }
                    }
                    "prompts/list" => {
                        self.send_response(id, ListPromptsResult { prompts: vec![] })
                            .await?;
                    }
                    "resources/list" => {
                        self.send_response(id, ListResourcesResult { resources: vec![] })
                            .await?;
                    }
                    method => {
                        self.send_error(id, METHOD_NOT_FOUND, format!("Method not found: {method}"))
                            .await?;
                    }
                }
            }

            JSONRPCMessage::Notification { method, .. } => match method.as_str() {
                "notifications/initialized" => debug!("Client initialized"),
                _ => debug!("Unknown notification: {}", method),
            },
        }

        Ok(())
    }
}
