pub mod client;
pub mod openai;

#[cfg(test)]
pub(crate) mod testing;

use serde_json::Value;

pub use client::LlmClient;
pub use openai::OpenAiCompatClient;

/// One turn of the conversation sent to the LLM.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    User(String),
    /// Assistant turn, possibly requesting tool calls.
    Assistant {
        text: String,
        tool_calls: Vec<ToolCall>,
    },
    /// Result of one tool call, matched by id.
    ToolResult { call_id: String, content: String },
}

/// A tool the LLM may call.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema of the arguments object.
    pub input_schema: Value,
}

/// A tool call requested by the LLM.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    Other(String),
}

/// LLM response with metadata
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
    pub stop_reason: StopReason,
    pub input_tokens: u32,
    pub output_tokens: u32,
}
