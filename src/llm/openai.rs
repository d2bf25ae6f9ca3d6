//! OpenAI-compatible chat completions provider (DeepSeek by default).
//!
//! Calls `POST {base_url}/chat/completions` with `stream: false`.
//!
//! Wire format notes:
//! - The system prompt is the first `role: "system"` message.
//! - Tools are `{type: "function", function: {name, description, parameters}}`.
//! - Tool call arguments travel as a JSON-encoded *string*.
//! - Tool results are `role: "tool"` messages carrying `tool_call_id`.
//! - `finish_reason`: `"stop"` → `EndTurn`, `"tool_calls"` → `ToolUse`,
//!   `"length"` → `MaxTokens`.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::client::LlmClient;
use super::{LlmResponse, Message, StopReason, ToolCall, ToolDefinition};
use crate::config::LlmConfig;

// ── Request types ────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool<'a>>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: WireFunctionDef<'a>,
}

#[derive(Debug, Serialize)]
struct WireFunctionDef<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
struct WireFunctionCall {
    name: String,
    /// JSON-encoded arguments object.
    arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

// ── Response types ───────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

// ── Client ───────────────────────────────────────────────

pub struct OpenAiCompatClient {
    client: Client,
    config: LlmConfig,
}

impl OpenAiCompatClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatClient {
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: to_wire_messages(system_prompt, messages),
            tools: (!tools.is_empty()).then(|| tools.iter().map(to_wire_tool).collect()),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens_per_request,
            stream: false,
        };

        debug!(
            "Calling {} ({}) with {} messages, {} tools",
            self.config.provider,
            self.config.model,
            messages.len(),
            tools.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("{} API error ({status}): {body}", self.config.provider);
        }

        let resp: ChatResponse = response.json().await?;
        let parsed = from_wire_response(resp)?;

        info!(
            "LLM response: {} in / {} out tokens",
            parsed.input_tokens, parsed.output_tokens
        );
        Ok(parsed)
    }

    fn description(&self) -> String {
        format!("{} ({})", self.config.provider, self.config.model)
    }
}

// ── Translation helpers ──────────────────────────────────

fn to_wire_messages(system_prompt: &str, messages: &[Message]) -> Vec<WireMessage> {
    let mut out = Vec::with_capacity(messages.len() + 1);

    if !system_prompt.is_empty() {
        out.push(WireMessage {
            role: "system".to_string(),
            content: Some(system_prompt.to_string()),
            tool_calls: None,
            tool_call_id: None,
        });
    }

    for msg in messages {
        out.push(match msg {
            Message::User(text) => WireMessage {
                role: "user".to_string(),
                content: Some(text.clone()),
                tool_calls: None,
                tool_call_id: None,
            },
            Message::Assistant { text, tool_calls } => WireMessage {
                role: "assistant".to_string(),
                content: Some(text.clone()),
                tool_calls: (!tool_calls.is_empty()).then(|| {
                    tool_calls
                        .iter()
                        .map(|tc| WireToolCall {
                            id: tc.id.clone(),
                            call_type: function_type(),
                            function: WireFunctionCall {
                                name: tc.name.clone(),
                                arguments: tc.input.to_string(),
                            },
                        })
                        .collect()
                }),
                tool_call_id: None,
            },
            Message::ToolResult { call_id, content } => WireMessage {
                role: "tool".to_string(),
                content: Some(content.clone()),
                tool_calls: None,
                tool_call_id: Some(call_id.clone()),
            },
        });
    }

    out
}

fn to_wire_tool(def: &ToolDefinition) -> WireTool<'_> {
    WireTool {
        tool_type: "function",
        function: WireFunctionDef {
            name: &def.name,
            description: &def.description,
            parameters: &def.input_schema,
        },
    }
}

fn from_wire_response(resp: ChatResponse) -> Result<LlmResponse> {
    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("LLM response contained no choices"))?;

    let tool_calls: Vec<ToolCall> = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| {
            // Unparseable arguments are passed on as a bare string; the
            // dispatcher then reports invalid arguments back to the LLM.
            let input = serde_json::from_str(&tc.function.arguments).unwrap_or_else(|e| {
                warn!("Tool call {} has malformed arguments: {e}", tc.function.name);
                Value::String(tc.function.arguments.clone())
            });
            ToolCall {
                id: tc.id,
                name: tc.function.name,
                input,
            }
        })
        .collect();

    let stop_reason = if !tool_calls.is_empty() {
        StopReason::ToolUse
    } else {
        match choice.finish_reason.as_deref() {
            Some("stop") | None => StopReason::EndTurn,
            Some("tool_calls") => StopReason::ToolUse,
            Some("length") => StopReason::MaxTokens,
            Some(other) => StopReason::Other(other.to_string()),
        }
    };

    let (input_tokens, output_tokens) = resp
        .usage
        .map(|u| (u.prompt_tokens, u.completion_tokens))
        .unwrap_or((0, 0));

    Ok(LlmResponse {
        text: choice.message.content.unwrap_or_default(),
        tool_calls,
        stop_reason,
        input_tokens,
        output_tokens,
    })
}
