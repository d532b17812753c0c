use super::*;
use crate::llm::AnthropicClient;
use anyhow::Result;
use axum::{response::IntoResponse, routing::post, Router};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

fn weather_tool() -> ToolDefinition {
    ToolDefinition {
        name: "get_weather".to_string(),
        description: "Get current weather".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "Location"
                }
            },
            "required": ["location"]
        }),
    }
}

fn request_with(tools: Option<Vec<ToolDefinition>>) -> LLMRequest {
    LLMRequest {
        messages: vec![Message::user_text("What's the weather?")],
        system_prompt: "Use the weather tool.".to_string(),
        tools,
        max_tokens: 1000,
    }
}

// Starts a mock server that answers every POST with `status` and `body`,
// recording the JSON bodies and headers it received.
async fn create_mock_server(
    status: axum::http::StatusCode,
    body: serde_json::Value,
    received: Arc<Mutex<Vec<(axum::http::HeaderMap, serde_json::Value)>>>,
) -> String {
    let app = Router::new().route(
        "/*path",
        post(
            move |headers: axum::http::HeaderMap, req: axum::extract::Json<serde_json::Value>| {
                let body = body.clone();
                let received = received.clone();
                async move {
                    received.lock().unwrap().push((headers, req.0));
                    (status, axum::Json(body)).into_response()
                }
            },
        ),
    );

    let addr = SocketAddr::from(([127, 0, 0, 1], 0));
    let listener = TcpListener::bind(addr).await.unwrap();
    let server_addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", server_addr)
}

#[tokio::test]
async fn test_anthropic_text_response() -> Result<()> {
    let received = Arc::new(Mutex::new(Vec::new()));
    let base_url = create_mock_server(
        axum::http::StatusCode::OK,
        json!({
            "id": "msg_1",
            "content": [{"type": "text", "text": "Hi! How can I help you today?"}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 8}
        }),
        received.clone(),
    )
    .await;

    let client = AnthropicClient::new("test-key".to_string(), "test-model".to_string(), base_url);
    let response = client.send_message(request_with(None)).await?;

    assert_eq!(
        response.content,
        vec![ContentBlock::Text {
            text: "Hi! How can I help you today?".to_string()
        }]
    );
    assert!(response.is_end_turn());
    assert_eq!(
        response.usage,
        Usage {
            input_tokens: 10,
            output_tokens: 8
        }
    );

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    let (headers, body) = &received[0];
    assert_eq!(headers["x-api-key"], "test-key");
    assert_eq!(headers["anthropic-version"], "2023-06-01");
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["max_tokens"], 1000);
    assert_eq!(body["system"], "Use the weather tool.");
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["messages"][0]["content"], "What's the weather?");
    assert!(body.get("tools").is_none());

    Ok(())
}

#[tokio::test]
async fn test_anthropic_tool_use_response() -> Result<()> {
    let received = Arc::new(Mutex::new(Vec::new()));
    let base_url = create_mock_server(
        axum::http::StatusCode::OK,
        json!({
            "id": "msg_2",
            "content": [{
                "type": "tool_use",
                "id": "toolu_01",
                "name": "get_weather",
                "input": {"location": "current"}
            }],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 15, "output_tokens": 12}
        }),
        received.clone(),
    )
    .await;

    let client = AnthropicClient::new("test-key".to_string(), "test-model".to_string(), base_url);
    let response = client
        .send_message(request_with(Some(vec![weather_tool()])))
        .await?;

    assert_eq!(
        response.content,
        vec![ContentBlock::ToolUse {
            id: "toolu_01".to_string(),
            name: "get_weather".to_string(),
            input: json!({"location": "current"}),
        }]
    );
    assert_eq!(response.stop_reason, Some(StopReason::ToolUse));
    assert!(!response.is_end_turn());

    let received = received.lock().unwrap();
    let (_, body) = &received[0];
    assert_eq!(body["tools"][0]["name"], "get_weather");
    assert_eq!(body["tools"][0]["description"], "Get current weather");
    assert_eq!(body["tools"][0]["input_schema"]["required"][0], "location");

    Ok(())
}

#[tokio::test]
async fn test_anthropic_serializes_tool_exchange() -> Result<()> {
    let received = Arc::new(Mutex::new(Vec::new()));
    let base_url = create_mock_server(
        axum::http::StatusCode::OK,
        json!({
            "content": [{"type": "text", "text": "It is sunny."}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 20, "output_tokens": 4}
        }),
        received.clone(),
    )
    .await;

    let mut request = request_with(Some(vec![weather_tool()]));
    request.messages.push(Message::assistant_blocks(vec![ContentBlock::ToolUse {
        id: "toolu_01".to_string(),
        name: "get_weather".to_string(),
        input: json!({"location": "current"}),
    }]));
    request.messages.push(Message::user_blocks(vec![ContentBlock::ToolResult {
        tool_use_id: "toolu_01".to_string(),
        content: "sunny".to_string(),
        is_error: None,
    }]));

    let client = AnthropicClient::new("test-key".to_string(), "test-model".to_string(), base_url);
    client.send_message(request).await?;

    let received = received.lock().unwrap();
    let (_, body) = &received[0];
    assert_eq!(body["messages"][1]["role"], "assistant");
    assert_eq!(body["messages"][1]["content"][0]["type"], "tool_use");
    assert_eq!(body["messages"][1]["content"][0]["id"], "toolu_01");
    assert_eq!(body["messages"][2]["role"], "user");
    assert_eq!(body["messages"][2]["content"][0]["type"], "tool_result");
    assert_eq!(body["messages"][2]["content"][0]["tool_use_id"], "toolu_01");
    assert!(body["messages"][2]["content"][0].get("is_error").is_none());

    Ok(())
}

#[tokio::test]
async fn test_anthropic_error_is_not_retried() {
    let received = Arc::new(Mutex::new(Vec::new()));
    let base_url = create_mock_server(
        axum::http::StatusCode::TOO_MANY_REQUESTS,
        json!({
            "type": "error",
            "error": {"type": "rate_limit_error", "message": "Rate limit exceeded"}
        }),
        received.clone(),
    )
    .await;

    let client = AnthropicClient::new("test-key".to_string(), "test-model".to_string(), base_url);
    let err = client.send_message(request_with(None)).await.unwrap_err();

    assert!(err.to_string().starts_with("Rate limit exceeded"));
    assert_eq!(received.lock().unwrap().len(), 1);
}

#[test]
fn test_unknown_stop_reason_deserializes() {
    let response: LLMResponse = serde_json::from_value(json!({
        "content": [],
        "stop_reason": "pause_turn"
    }))
    .unwrap();
    assert_eq!(response.stop_reason, Some(StopReason::Unknown));
    assert!(!response.is_end_turn());
}

#[test]
fn test_message_tool_ids() {
    let invocation = Message::assistant_blocks(vec![ContentBlock::ToolUse {
        id: "toolu_9".to_string(),
        name: "control_led".to_string(),
        input: json!({"action": "on"}),
    }]);
    let result = Message::user_blocks(vec![ContentBlock::ToolResult {
        tool_use_id: "toolu_9".to_string(),
        content: "LED turned ON".to_string(),
        is_error: None,
    }]);

    assert_eq!(invocation.tool_use_id(), Some("toolu_9"));
    assert_eq!(invocation.tool_result_id(), None);
    assert_eq!(result.tool_result_id(), Some("toolu_9"));
    assert_eq!(Message::user_text("hello").tool_use_id(), None);
}

static LOGGED_REMAINING: Mutex<Vec<Option<String>>> = Mutex::new(Vec::new());

struct RecordingRateLimits {
    requests_remaining: Option<String>,
}

impl RateLimitHandler for RecordingRateLimits {
    fn from_response(response: &reqwest::Response) -> Self {
        Self {
            requests_remaining: response
                .headers()
                .get("anthropic-ratelimit-requests-remaining")
                .and_then(|h| h.to_str().ok())
                .map(str::to_string),
        }
    }

    fn log_status(&self) {
        LOGGED_REMAINING
            .lock()
            .unwrap()
            .push(self.requests_remaining.clone());
    }
}

#[tokio::test]
async fn test_rate_limits_logged_on_error() {
    let app = Router::new().route(
        "/*path",
        post(|| async {
            (
                axum::http::StatusCode::TOO_MANY_REQUESTS,
                [("anthropic-ratelimit-requests-remaining", "0")],
                "slow down",
            )
                .into_response()
        }),
    );
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let server_addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let response = reqwest::Client::new()
        .post(format!("http://{server_addr}/messages"))
        .send()
        .await
        .unwrap();
    let err = super::utils::check_response_error::<RecordingRateLimits>(response)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::RateLimit(body)) if body == "slow down"
    ));
    assert_eq!(
        *LOGGED_REMAINING.lock().unwrap(),
        vec![Some("0".to_string())]
    );
}
