use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JSONRPCMessage {
    Request {
        jsonrpc: String,
        id: RequestId,
        method: String,
        #[serde(default)]
        params: Option<serde_json::Value>,
    },
    Notification {
        jsonrpc: String,
        method: String,
        #[serde(default)]
        params: Option<serde_json::Value>,
    },
}

#[derive(Debug, Serialize)]
pub struct JSONRPCResponse<T> {
    pub jsonrpc: String,
    pub id: RequestId,
    pub result: T,
}

#[derive(Debug, Serialize)]
pub struct JSONRPCError {
    pub jsonrpc: String,
    pub id: RequestId,
    pub error: ErrorObject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Any message a client can receive from a server: a response, an error
/// response, a notification or a server-initiated request.
#[derive(Debug, Deserialize)]
pub struct JSONRPCIncoming {
    #[serde(default)]
    pub id: Option<RequestId>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<ErrorObject>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EmptyResult {
    #[serde(skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

// Capabilities
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ClientCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experimental: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToolsCapability {
    #[serde(rename = "listChanged")]
    pub list_changed: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Implementation {
    pub name: String,
    pub version: String,
}

// Initialize request/response types
#[derive(Debug, Serialize, Deserialize)]
pub struct InitializeParams {
    #[serde(default)]
    pub capabilities: ClientCapabilities,
    #[serde(rename = "clientInfo")]
    pub client_info: Implementation,
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ServerCapabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experimental: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InitializeResult {
    #[serde(default)]
    pub capabilities: ServerCapabilities,
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    #[serde(rename = "serverInfo")]
    pub server_info: Implementation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

// Tool types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListToolsResult {
    pub tools: Vec<Tool>,
    #[serde(
        rename = "nextCursor",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub content: Vec<ToolResultContent>,
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

impl ToolCallResult {
    pub fn text(text: impl Into<String>, is_error: bool) -> Self {
        Self {
            content: vec![ToolResultContent::Text { text: text.into() }],
            is_error,
        }
    }

    /// Flattens the content into a single string for the model
    pub fn to_text(&self) -> String {
        self.content
            .iter()
            .map(|item| match item {
                ToolResultContent::Text { text } => text.clone(),
                ToolResultContent::Image { mime_type, .. } => format!("[image: {mime_type}]"),
                ToolResultContent::Resource { resource } => resource.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolResultContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image")]
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
    #[serde(rename = "resource")]
    Resource { resource: serde_json::Value },
}

// Prompt and resource listings; this server exposes neither
#[derive(Debug, Serialize, Deserialize)]
pub struct ListPromptsResult {
    pub prompts: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListResourcesResult {
    pub resources: Vec<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserialization_number_id_with_params() {
        let json_str = r#"{
            "jsonrpc": "2.0",
            "id": 42,
            "method": "tools/call",
            "params": {"name": "control_led", "arguments": {"action": "on"}}
        }"#;

        let message: JSONRPCMessage = serde_json::from_str(json_str).unwrap();

        match message {
            JSONRPCMessage::Request {
                jsonrpc,
                id,
                method,
                params,
            } => {
                assert_eq!(jsonrpc, "2.0");
                assert_eq!(id, RequestId::Number(42));
                assert_eq!(method, "tools/call");
                let params: ToolCallParams = serde_json::from_value(params.unwrap()).unwrap();
                assert_eq!(params.name, "control_led");
                assert_eq!(params.arguments.unwrap()["action"], "on");
            }
            _ => panic!("Deserialized to wrong variant"),
        }
    }

    #[test]
    fn test_request_deserialization_string_id_without_params() {
        let json_str = r#"{"jsonrpc": "2.0", "id": "abc", "method": "tools/list"}"#;

        let message: JSONRPCMessage = serde_json::from_str(json_str).unwrap();

        match message {
            JSONRPCMessage::Request { id, params, .. } => {
                assert_eq!(id, RequestId::String("abc".to_string()));
                assert!(params.is_none());
            }
            _ => panic!("Deserialized to wrong variant"),
        }
    }

    #[test]
    fn test_notification_deserialization() {
        let json_str = r#"{"jsonrpc": "2.0", "method": "notifications/initialized"}"#;

        let message: JSONRPCMessage = serde_json::from_str(json_str).unwrap();

        match message {
            JSONRPCMessage::Notification { method, params, .. } => {
                assert_eq!(method, "notifications/initialized");
                assert!(params.is_none());
            }
            _ => panic!("Deserialized to wrong variant"),
        }
    }

    #[test]
    fn test_incoming_error_response() {
        let json_str = r#"{
            "jsonrpc": "2.0",
            "id": 3,
            "error": {"code": -32601, "message": "Method not found: foo"}
        }"#;

        let incoming: JSONRPCIncoming = serde_json::from_str(json_str).unwrap();
        assert_eq!(incoming.id, Some(RequestId::Number(3)));
        assert!(incoming.method.is_none());
        assert!(incoming.result.is_none());
        let error = incoming.error.unwrap();
        assert_eq!(error.code, -32601);
        assert_eq!(error.message, "Method not found: foo");
    }

    #[test]
    fn test_tool_call_result_to_text() {
        let result: ToolCallResult = serde_json::from_str(
            r#"{
                "content": [
                    {"type": "text", "text": "LED is currently: ON"},
                    {"type": "image", "data": "aGk=", "mimeType": "image/png"},
                    {"type": "resource", "resource": {"uri": "led://state"}}
                ]
            }"#,
        )
        .unwrap();

        assert!(!result.is_error);
        assert_eq!(
            result.to_text(),
            "LED is currently: ON\n[image: image/png]\n{\"uri\":\"led://state\"}"
        );
    }

    #[test]
    fn test_tool_call_result_serialization() {
        let result = ToolCallResult::text("LED turned OFF", false);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "content": [{"type": "text", "text": "LED turned OFF"}],
                "isError": false
            })
        );
    }

    #[test]
    fn test_tool_serializes_input_schema_camel_case() {
        let tool = Tool {
            name: "get_led_status".to_string(),
            description: None,
            input_schema: serde_json::json!({"type": "object"}),
        };
        let json = serde_json::to_value(&tool).unwrap();
        assert_eq!(json["inputSchema"]["type"], "object");
        assert!(json.get("description").is_none());
    }
}
