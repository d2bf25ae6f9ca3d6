//! Tools the LLM can call.
//!
//! The set is closed: every call is parsed into a [`ToolRequest`] variant
//! and routed by [`ToolRegistry::dispatch`]. Whatever happens, the LLM gets
//! back a single string, including for failures, so it can change strategy
//! instead of aborting the turn.

pub mod audit;
pub mod command;
pub mod files;
pub mod interaction;
pub mod search;
pub mod shell;

#[cfg(test)]
pub(crate) mod testing;

use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::guard::Diagnosis;
use crate::llm::ToolDefinition;

use audit::AuditLog;
use command::{CommandExecutor, CommandRequest};
use files::FileAccessor;
use interaction::Interaction;
use search::WebSearch;
use shell::ShellRunner;

/// Every way a tool call can fail. The display text is what the LLM sees.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Error: invalid file path")]
    InvalidPath,

    #[error("Error: writing is only allowed inside the allowed directories")]
    Forbidden,

    #[error("Error: file too large ({size} bytes, limit {max} bytes)")]
    TooLarge { size: u64, max: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Confirmation required for dangerous command")]
    ConfirmationRequired,

    #[error("Command cancelled by user")]
    UserRejected,

    #[error("Command cancelled: the session is shutting down")]
    ShuttingDown,

    #[error("Could not obtain sudo privileges")]
    EscalationFailed,

    #[error("{0}")]
    SubprocessFailure(Diagnosis),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("Error: {0}")]
    Unknown(String),
}

/// A parsed tool call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "name", content = "arguments")]
pub enum ToolRequest {
    #[serde(rename = "read_file")]
    ReadFile { file_path: String },

    #[serde(rename = "write_file")]
    WriteFile {
        file_path: String,
        content: String,
        #[serde(default)]
        create_dirs: bool,
    },

    #[serde(rename = "command_executor")]
    Execute {
        command: String,
        #[serde(default)]
        ask_for_confirmation: bool,
    },

    #[serde(rename = "web_search")]
    Search { query: String },

    #[serde(rename = "ask_human")]
    AskHuman { input_text: String },
}

const TOOL_NAMES: &[&str] = &[
    "read_file",
    "write_file",
    "command_executor",
    "web_search",
    "ask_human",
];

impl ToolRequest {
    pub fn parse(name: &str, arguments: Value) -> Result<Self, ToolError> {
        if !TOOL_NAMES.contains(&name) {
            return Err(ToolError::UnknownTool(name.to_string()));
        }
        serde_json::from_value(json!({ "name": name, "arguments": arguments })).map_err(|e| {
            ToolError::InvalidArguments {
                tool: name.to_string(),
                reason: e.to_string(),
            }
        })
    }
}

/// Startup settings for the tool set.
pub struct ToolSettings {
    pub allowed_write_dirs: Vec<PathBuf>,
    pub max_read_size: u64,
    pub audit_log: PathBuf,
}

pub struct ToolRegistry {
    files: Arc<FileAccessor>,
    executor: Arc<CommandExecutor>,
    interaction: Arc<dyn Interaction>,
    search: WebSearch,
}

impl ToolRegistry {
    pub fn new(
        settings: &ToolSettings,
        interaction: Arc<dyn Interaction>,
        shell: Arc<dyn ShellRunner>,
        search: WebSearch,
    ) -> Self {
        let files = FileAccessor::new(&settings.allowed_write_dirs, settings.max_read_size);
        let executor = CommandExecutor::new(
            interaction.clone(),
            shell,
            AuditLog::new(&settings.audit_log),
        );
        Self {
            files: Arc::new(files),
            executor: Arc::new(executor),
            interaction,
            search,
        }
    }

    /// Flag that stops pending commands once the session is shutting down.
    pub fn shutdown(&self) -> interaction::Shutdown {
        self.executor.shutdown()
    }

    /// Parses and runs one tool call. Never fails: errors come back as text.
    pub async fn call(&self, name: &str, arguments: Value) -> String {
        match ToolRequest::parse(name, arguments) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => e.to_string(),
        }
    }

    pub async fn dispatch(&self, request: ToolRequest) -> String {
        let result = match request {
            ToolRequest::ReadFile { file_path } => {
                info!("Tool read_file: {file_path}");
                let files = self.files.clone();
                blocking(move || files.read(&file_path, files.max_read_size())).await
            }
            ToolRequest::WriteFile {
                file_path,
                content,
                create_dirs,
            } => {
                info!("Tool write_file: {file_path} (create_dirs={create_dirs})");
                let files = self.files.clone();
                blocking(move || files.write(&file_path, &content, create_dirs)).await
            }
            ToolRequest::Execute {
                command,
                ask_for_confirmation,
            } => {
                info!("Tool command_executor: {command}");
                let executor = self.executor.clone();
                let request = CommandRequest {
                    command,
                    ask_for_confirmation,
                };
                blocking(move || {
                    executor.execute(&request).map(|result| {
                        debug!("command_executor: exit status {:?}", result.output.status);
                        result.text
                    })
                })
                .await
            }
            ToolRequest::Search { query } => {
                info!("Tool web_search ({}): {query}", self.search.provider_name());
                Ok(self.search.run(&query).await)
            }
            ToolRequest::AskHuman { input_text } => {
                info!("Tool ask_human");
                let interaction = self.interaction.clone();
                blocking(move || {
                    let prompt = format!("\nThe agent needs your help: {input_text}\nYour answer");
                    interaction
                        .prompt(&prompt)
                        .map(|answer| format!("The human said: {answer}"))
                        .map_err(|e| ToolError::Unknown(e.to_string()))
                })
                .await
            }
        };

        result.unwrap_or_else(|e| e.to_string())
    }

    /// Tool schemas sent with every LLM request.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: "read_file".to_string(),
                description: "Read the contents of a text file. Input: path to the file."
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "file_path": { "type": "string", "description": "Path to the file" }
                    },
                    "required": ["file_path"]
                }),
            },
            ToolDefinition {
                name: "write_file".to_string(),
                description: "Write content to a file, replacing it. Only allowed inside the \
                              allowed directories. Set create_dirs to create missing parent \
                              directories."
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "file_path": { "type": "string", "description": "Path to the file" },
                        "content": { "type": "string", "description": "Full file content" },
                        "create_dirs": {
                            "type": "boolean",
                            "description": "Create missing parent directories",
                            "default": false
                        }
                    },
                    "required": ["file_path", "content"]
                }),
            },
            ToolDefinition {
                name: "command_executor".to_string(),
                description: "Run a shell command and return its output. Dangerous commands \
                              need confirmation."
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "command": { "type": "string", "description": "Command to run" },
                        "ask_for_confirmation": {
                            "type": "boolean",
                            "description": "Refuse dangerous commands instead of asking the user",
                            "default": false
                        }
                    },
                    "required": ["command"]
                }),
            },
            ToolDefinition {
                name: "web_search".to_string(),
                description: "Search the web for current information. Input: search query."
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "query": { "type": "string", "description": "Search query" }
                    },
                    "required": ["query"]
                }),
            },
            ToolDefinition {
                name: "ask_human".to_string(),
                description: "Ask the human for help when you are unsure how to proceed."
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "input_text": { "type": "string", "description": "Question for the human" }
                    },
                    "required": ["input_text"]
                }),
            },
        ]
    }
}

/// Runs a blocking tool operation off the async runtime.
async fn blocking<F>(f: F) -> Result<String, ToolError>
where
    F: FnOnce() -> Result<String, ToolError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ToolError::Unknown(format!("tool task failed: {e}")))?
}
