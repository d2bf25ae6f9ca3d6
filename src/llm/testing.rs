//! Scripted `LlmClient` for agent loop tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;

use super::{LlmClient, LlmResponse, Message, StopReason, ToolCall, ToolDefinition};

/// Replays canned responses in order and records every conversation sent.
#[derive(Default)]
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<LlmResponse>>,
    pub requests: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl ScriptedLlm {
    pub fn new(responses: Vec<LlmResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(
        &self,
        _system_prompt: &str,
        messages: &[Message],
        _tools: &[ToolDefinition],
    ) -> Result<LlmResponse> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow!("LLM unavailable"))
    }

    fn description(&self) -> String {
        "scripted (test)".to_string()
    }
}

pub fn answer(text: &str) -> LlmResponse {
    LlmResponse {
        text: text.to_string(),
        tool_calls: vec![],
        stop_reason: StopReason::EndTurn,
        input_tokens: 0,
        output_tokens: 0,
    }
}

pub fn tool_use(id: &str, name: &str, input: Value) -> LlmResponse {
    LlmResponse {
        text: String::new(),
        tool_calls: vec![ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            input,
        }],
        stop_reason: StopReason::ToolUse,
        input_tokens: 0,
        output_tokens: 0,
    }
}
