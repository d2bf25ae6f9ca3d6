//! `LlmClient` trait: the seam between the agent loop and the hosted model.

use anyhow::Result;
use async_trait::async_trait;

use super::{LlmResponse, Message, ToolDefinition};

/// Abstraction over LLM backends.
///
/// Implementations translate the shared message/tool types into their wire
/// format and normalize responses back into [`LlmResponse`].
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Sends a conversation to the LLM and returns the response.
    ///
    /// An empty `tools` slice omits tool definitions from the request.
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse>;

    /// Human-readable provider and model, e.g. `"deepseek (deepseek-chat)"`.
    fn description(&self) -> String;
}
