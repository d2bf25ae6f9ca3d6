use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::tools::files::DEFAULT_MAX_READ_SIZE;
use crate::tools::ToolSettings;

/// Environment variable holding the LLM API key when no config file is used.
pub const API_KEY_ENV: &str = "DEEPSEEK_API_KEY";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Supports ${ENV_VAR} substitution
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens_per_request: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    /// Maximum LLM calls per user query
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Number of previous exchanges prepended to each query
    #[serde(default = "default_history_context")]
    pub history_context: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ToolsConfig {
    /// Roots under which `write_file` may write
    #[serde(default = "default_allowed_write_dirs")]
    pub allowed_write_dirs: Vec<PathBuf>,
    #[serde(default = "default_max_read_size")]
    pub max_read_size: u64,
    #[serde(default = "default_audit_log")]
    pub audit_log: PathBuf,
    /// Search backend; DuckDuckGo when unset
    pub web_search: Option<WebSearchConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebSearchConfig {
    /// Search provider: "tavily" or "duckduckgo"
    #[serde(default = "default_search_provider")]
    pub provider: String,
    /// Supports ${ENV_VAR} substitution. Not needed for DuckDuckGo.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_max_results")]
    pub max_results: u8,
}

fn default_provider() -> String {
    "deepseek".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

/// A missing key is not an error here; the first LLM call will fail instead.
fn default_api_key() -> String {
    std::env::var(API_KEY_ENV).unwrap_or_default()
}

fn default_base_url() -> String {
    "https://api.deepseek.com".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_max_iterations() -> usize {
    5
}

fn default_history_context() -> usize {
    3
}

fn default_allowed_write_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("./data"), PathBuf::from("/tmp")]
}

fn default_max_read_size() -> u64 {
    DEFAULT_MAX_READ_SIZE
}

fn default_audit_log() -> PathBuf {
    PathBuf::from("command_history.log")
}

fn default_search_provider() -> String {
    "tavily".to_string()
}

fn default_max_results() -> u8 {
    5
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: default_api_key(),
            base_url: default_base_url(),
            temperature: default_temperature(),
            max_tokens_per_request: default_max_tokens(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            history_context: default_history_context(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            allowed_write_dirs: default_allowed_write_dirs(),
            max_read_size: default_max_read_size(),
            audit_log: default_audit_log(),
            web_search: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        // Expand environment variables like ${DEEPSEEK_API_KEY}
        let expanded = shellexpand::env(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }
}

impl ToolsConfig {
    pub fn settings(&self) -> ToolSettings {
        ToolSettings {
            allowed_write_dirs: self.allowed_write_dirs.clone(),
            max_read_size: self.max_read_size,
            audit_log: self.audit_log.clone(),
        }
    }
}
