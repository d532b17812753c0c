use super::types::*;
use crate::config::ConfigError;
use crate::llm::ToolDefinition;
use crate::tools::{ToolGateway, ToolOutput};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

#[derive(Error, Debug)]
pub enum McpError {
    #[error("Failed to start MCP server `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("MCP transport error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid MCP payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("MCP error {code}: {message}")]
    Rpc { code: i32, message: String },
    #[error("MCP server closed the connection")]
    Closed,
}

/// How to start the server process
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerLaunch {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl ServerLaunch {
    /// Derives the launch command from the server path given on the command line.
    ///
    /// `.py` scripts run with `python`, `.js` scripts with `node`. A `.json`
    /// file is read as a launch descriptor (`command`, `args`, `env`).
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let script = || path.to_string_lossy().into_owned();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("py") => Ok(Self {
                command: "python".to_string(),
                args: vec![script()],
                env: HashMap::new(),
            }),
            Some("js") => Ok(Self {
                command: "node".to_string(),
                args: vec![script()],
                env: HashMap::new(),
            }),
            Some("json") => {
                let content = std::fs::read_to_string(path).map_err(|source| {
                    ConfigError::Read {
                        path: path.to_path_buf(),
                        source,
                    }
                })?;
                serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })
            }
            _ => Err(ConfigError::UnsupportedServerPath(path.to_path_buf())),
        }
    }
}

struct Transport {
    reader: BufReader<Box<dyn AsyncRead + Unpin + Send>>,
    writer: Box<dyn AsyncWrite + Unpin + Send>,
    next_id: i64,
    // Held so the server process is killed when the client goes away
    _child: Option<Child>,
}

/// Client side of an MCP stdio session.
///
/// Requests are strictly sequential: each one holds the transport until its
/// response has arrived.
pub struct McpClient {
    transport: Mutex<Transport>,
}

impl McpClient {
    pub async fn spawn(launch: &ServerLaunch) -> Result<Self, McpError> {
        debug!("Starting MCP server: {} {:?}", launch.command, launch.args);
        let mut child = Command::new(&launch.command)
            .args(&launch.args)
            .envs(&launch.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| McpError::Spawn {
                command: launch.command.clone(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(McpError::Closed)?;
        let stdout = child.stdout.take().ok_or(McpError::Closed)?;

        let mut client = Self::from_streams(stdout, stdin);
        client.transport.get_mut()._child = Some(child);
        Ok(client)
    }

    /// Client over an already connected pair of streams
    pub fn from_streams<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let reader: Box<dyn AsyncRead + Unpin + Send> = Box::new(reader);
        Self {
            transport: Mutex::new(Transport {
                reader: BufReader::new(reader),
                writer: Box::new(writer),
                next_id: 1,
                _child: None,
            }),
        }
    }

    /// Runs the `initialize` handshake and confirms it with `notifications/initialized`
    pub async fn initialize(&self) -> Result<InitializeResult, McpError> {
        let params = InitializeParams {
            capabilities: ClientCapabilities::default(),
            client_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            protocol_version: PROTOCOL_VERSION.to_string(),
        };

        let result = self
            .request("initialize", Some(serde_json::to_value(params)?))
            .await?;
        let result: InitializeResult = serde_json::from_value(result)?;
        debug!(
            "Connected to {} {} (protocol {})",
            result.server_info.name, result.server_info.version, result.protocol_version
        );

        self.notify("notifications/initialized").await?;
        Ok(result)
    }

    pub async fn list_server_tools(&self) -> Result<Vec<Tool>, McpError> {
        let result = self.request("tools/list", None).await?;
        let result: ListToolsResult = serde_json::from_value(result)?;
        Ok(result.tools)
    }

    pub async fn call_server_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<ToolCallResult, McpError> {
        let params = json!({ "name": name, "arguments": arguments });
        let result = self.request("tools/call", Some(params)).await?;
        Ok(serde_json::from_value(result)?)
    }

    async fn notify(&self, method: &str) -> Result<(), McpError> {
        let mut transport = self.transport.lock().await;
        let message = json!({ "jsonrpc": "2.0", "method": method });
        write_line(&mut transport, &message).await
    }

    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, McpError> {
        let mut transport = self.transport.lock().await;

        let id = transport.next_id;
        transport.next_id += 1;

        let mut message = json!({ "jsonrpc": "2.0", "id": id, "method": method });
        if let Some(params) = params {
            message["params"] = params;
        }
        write_line(&mut transport, &message).await?;

        let expected = RequestId::Number(id);
        let mut line = String::new();
        loop {
            line.clear();
            if transport.reader.read_line(&mut line).await? == 0 {
                return Err(McpError::Closed);
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            trace!("Received message: {}", trimmed);

            let incoming: JSONRPCIncoming = match serde_json::from_str(trimmed) {
                Ok(incoming) => incoming,
                Err(e) => {
                    warn!("Ignoring non JSON-RPC output from server: {}", e);
                    continue;
                }
            };

            match (incoming.id, incoming.method) {
                (Some(id), None) if id == expected => {
                    if let Some(error) = incoming.error {
                        return Err(McpError::Rpc {
                            code: error.code,
                            message: error.message,
                        });
                    }
                    return Ok(incoming.result.unwrap_or(Value::Null));
                }
                (Some(id), Some(method)) => {
                    // Server-initiated request; only ping is understood
                    let reply = if method == "ping" {
                        json!({ "jsonrpc": "2.0", "id": id, "result": {} })
                    } else {
                        json!({
                            "jsonrpc": "2.0",
                            "id": id,
                            "error": { "code": -32601, "message": format!("Method not found: {method}") }
                        })
                    };
                    write_line(&mut transport, &reply).await?;
                }
                (None, Some(method)) => {
                    debug!("Received MCP notification: {}", method);
                }
                (id, None) => {
                    warn!("Received response for unknown request ID: {:?}", id);
                }
            }
        }
    }
}

async fn write_line(transport: &mut Transport, message: &Value) -> Result<(), McpError> {
    let line = serde_json::to_string(message)?;
    trace!("Sending message: {}", line);
    transport.writer.write_all(line.as_bytes()).await?;
    transport.writer.write_all(b"\n").await?;
    transport.writer.flush().await?;
    Ok(())
}

#[async_trait]
impl ToolGateway for McpClient {
    async fn list_tools(&self) -> Result<Vec<ToolDefinition>, McpError> {
        Ok(self
            .list_server_tools()
            .await?
            .into_iter()
            .map(|tool| ToolDefinition {
                name: tool.name,
                description: tool.description.unwrap_or_default(),
                parameters: tool.input_schema,
            })
            .collect())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolOutput, McpError> {
        let result = self.call_server_tool(name, arguments).await?;
        Ok(ToolOutput {
            content: result.to_text(),
            is_error: result.is_error,
        })
    }
}
