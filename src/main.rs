mod agent;
mod config;
mod guard;
mod llm;
mod repl;
mod tools;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::agent::AgentRuntime;
use crate::config::{Config, API_KEY_ENV};
use crate::llm::OpenAiCompatClient;
use crate::tools::interaction::{ConsoleInteraction, Interaction};
use crate::tools::search::WebSearch;
use crate::tools::shell::SystemShell;
use crate::tools::ToolRegistry;

const DEFAULT_CONFIG_PATH: &str = "config/agent.toml";

fn print_help() {
    println!(
        "\
warden-agent v{}

A command-line LLM agent with guarded shell and file tools.

USAGE:
    warden-agent [OPTIONS] [CONFIG_PATH]

ARGUMENTS:
    CONFIG_PATH    Path to TOML configuration file [default: {DEFAULT_CONFIG_PATH}]
                   Built-in defaults are used when the default file is missing.

OPTIONS:
    -h, --help       Print this help message and exit
    -V, --version    Print version and exit

ENVIRONMENT VARIABLES:
    Variables are referenced in the config file via ${{VAR_NAME}} syntax.

    RUST_LOG              Log level filter for tracing
                          (e.g. debug, warden_agent=debug,warn)
    DEEPSEEK_API_KEY      API key for the LLM endpoint
                          (used directly when no config file sets one)
    TAVILY_API_KEY        API key for Tavily web search, when configured
                          (from https://tavily.com; DuckDuckGo needs none)

INTERACTIVE USE:
    Type a query and press Enter. Type one of
    stop, exit, quit, end, abort, cancel
    стоп, прекрати, перестань, выход, заверши, остановись, хватит
    to leave. Ctrl-C also exits.

EXAMPLES:
    warden-agent                          # uses {DEFAULT_CONFIG_PATH}
    warden-agent ~/agent.toml             # custom config path
    RUST_LOG=debug warden-agent           # with debug logging",
        env!("CARGO_PKG_VERSION"),
    );
}

/// Explicit path must exist; the default path falls back to built-in defaults.
fn load_config(arg: Option<String>) -> Result<Config> {
    match arg {
        Some(path) => {
            info!("Loading configuration from {path}");
            Config::load(Path::new(&path))
                .with_context(|| format!("Failed to load configuration from {path}"))
        }
        None => {
            let path = PathBuf::from(DEFAULT_CONFIG_PATH);
            if path.exists() {
                info!("Loading configuration from {DEFAULT_CONFIG_PATH}");
                Config::load(&path)
                    .with_context(|| format!("Failed to load configuration from {DEFAULT_CONFIG_PATH}"))
            } else {
                info!("No {DEFAULT_CONFIG_PATH} found, using built-in defaults");
                Ok(Config::default())
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Handle --help / --version before anything else
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("warden-agent v{}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {}
        }
    }

    // Logs go to stderr so they don't interleave with prompts on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warden_agent=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    println!(
        r#"
 __        __            _
 \ \      / /_ _ _ __ __| | ___ _ __
  \ \ /\ / / _` | '__/ _` |/ _ \ '_ \
   \ V  V / (_| | | | (_| |  __/ | | |
    \_/\_/ \__,_|_|  \__,_|\___|_| |_|   v{}
"#,
        env!("CARGO_PKG_VERSION")
    );

    let config = load_config(std::env::args().nth(1))?;

    info!("LLM: {} ({})", config.llm.provider, config.llm.model);
    if config.llm.api_key.is_empty() {
        warn!("No LLM API key configured (set {API_KEY_ENV} or llm.api_key)");
    }
    info!(
        "Writable directories: {}",
        config
            .tools
            .allowed_write_dirs
            .iter()
            .map(|d| d.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    info!("Command audit log: {}", config.tools.audit_log.display());

    let interaction: Arc<dyn Interaction> = Arc::new(ConsoleInteraction);

    let search = match config.tools.web_search {
        Some(ref ws_config) => WebSearch::from_config(ws_config)?,
        None => WebSearch::duckduckgo(),
    };
    info!("Web search provider: {}", search.provider_name());

    let tools = ToolRegistry::new(
        &config.tools.settings(),
        interaction.clone(),
        Arc::new(SystemShell),
        search,
    );
    info!("Tools: {} available", tools.definitions().len());

    let llm = OpenAiCompatClient::new(config.llm.clone());
    let mut runtime = AgentRuntime::new(config.agent.clone(), Box::new(llm), tools);
    info!("Agent ready ({})", runtime.describe_llm());

    println!("Type 'exit' or 'стоп' to quit.\n");
    let result = repl::run(&mut runtime, interaction).await;

    // A tool prompt may still hold a blocking thread on stdin; don't join it
    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            error!("{e:#}");
            std::process::exit(1)
        }
    }
}
