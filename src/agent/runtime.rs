use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::AgentConfig;
use crate::llm::{LlmClient, Message, StopReason};
use crate::tools::interaction::Shutdown;
use crate::tools::ToolRegistry;

use super::history::History;

/// Returned when the LLM keeps calling tools past the iteration budget.
pub const ITERATION_LIMIT_ANSWER: &str = "Agent stopped due to iteration limit.";

const SYSTEM_PROMPT: &str = "\
You are a helpful assistant running in a terminal on the user's machine.
You can read and write files, run shell commands, search the web and ask the
human for help through the provided tools.
Prefer read-only commands. Dangerous commands (rm, mv, chmod, chown, dd,
output redirection) are confirmed by the user before they run; if a tool
says confirmation is required, explain what you want to do and why.
If you are unsure how to proceed, use ask_human instead of guessing.
Answer in the language the user writes in.";

/// The agentic loop: query in, final answer out, tools in between.
pub struct AgentRuntime {
    config: AgentConfig,
    llm: Box<dyn LlmClient>,
    tools: ToolRegistry,
    history: History,
}

impl AgentRuntime {
    pub fn new(config: AgentConfig, llm: Box<dyn LlmClient>, tools: ToolRegistry) -> Self {
        Self {
            config,
            llm,
            tools,
            history: History::new(),
        }
    }

    pub fn shutdown(&self) -> Shutdown {
        self.tools.shutdown()
    }

    pub fn describe_llm(&self) -> String {
        self.llm.description()
    }

    /// Answers one user query.
    ///
    /// Tool failures are fed back to the LLM as text; only LLM call failures
    /// surface as `Err`.
    pub async fn handle(&mut self, query: &str) -> Result<String> {
        let prompt = self
            .history
            .contextualize(query, self.config.history_context);
        let mut messages = vec![Message::User(prompt)];
        let definitions = self.tools.definitions();

        for iteration in 1..=self.config.max_iterations {
            debug!("Agent iteration {iteration}/{}", self.config.max_iterations);
            let response = self
                .llm
                .complete(SYSTEM_PROMPT, &messages, &definitions)
                .await?;

            if response.stop_reason == StopReason::MaxTokens {
                warn!("LLM response truncated at max_tokens_per_request");
            }

            if response.tool_calls.is_empty() {
                info!("Final answer after {iteration} LLM call(s)");
                self.history.record(query, &response.text);
                debug!("History holds {} exchange(s)", self.history.len());
                return Ok(response.text);
            }

            let calls = response.tool_calls.clone();
            messages.push(Message::Assistant {
                text: response.text,
                tool_calls: response.tool_calls,
            });

            for call in calls {
                let content = self.tools.call(&call.name, call.input).await;
                debug!("Tool {} returned {} bytes", call.name, content.len());
                messages.push(Message::ToolResult {
                    call_id: call.id,
                    content,
                });
            }
        }

        warn!(
            "Iteration limit ({}) reached without a final answer",
            self.config.max_iterations
        );
        self.history.record(query, ITERATION_LIMIT_ANSWER);
        Ok(ITERATION_LIMIT_ANSWER.to_string())
    }
}
