//! Interactive read loop: one query per line until a stop word.

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};

use crate::agent::AgentRuntime;
use crate::tools::interaction::Interaction;

const STOP_WORDS_RU: &[&str] = &[
    "стоп",
    "прекрати",
    "перестань",
    "выход",
    "заверши",
    "остановись",
    "хватит",
];

const STOP_WORDS_EN: &[&str] = &["stop", "exit", "quit", "end", "abort", "cancel"];

/// True if the whole input, trimmed and lowercased, is a stop word.
pub fn is_stop_command(input: &str) -> bool {
    let normalized = input.trim().to_lowercase();
    STOP_WORDS_RU
        .iter()
        .chain(STOP_WORDS_EN)
        .any(|w| *w == normalized)
}

/// Runs the prompt loop until a stop word, end of input or Ctrl-C.
///
/// A failed turn is printed and the loop goes on. On Ctrl-C the tools'
/// shutdown flag is raised; a prompt still blocked on the console keeps its
/// thread, so the caller should exit the process rather than wait for it.
pub async fn run(runtime: &mut AgentRuntime, interaction: Arc<dyn Interaction>) -> Result<()> {
    let shutdown = runtime.shutdown();

    loop {
        let ui = interaction.clone();
        let prompt = tokio::task::spawn_blocking(move || ui.prompt("Your query"));
        let query = tokio::select! {
            joined = prompt => match joined? {
                Ok(q) => q,
                Err(e) => {
                    info!("Input closed ({e}), exiting");
                    return Ok(());
                }
            },
            _ = tokio::signal::ctrl_c() => {
                shutdown.trigger();
                info!("Shutdown signal received, exiting");
                return Ok(());
            }
        };

        if is_stop_command(&query) {
            info!("Stop word received, exiting");
            return Ok(());
        }
        if query.trim().is_empty() {
            continue;
        }

        tokio::select! {
            result = runtime.handle(&query) => match result {
                Ok(answer) => interaction.notify(&format!("\nAgent: {answer}\n")),
                Err(e) => {
                    error!("Query failed: {e:#}");
                    interaction.notify(&format!("Error: {e}"));
                }
            },
            _ = tokio::signal::ctrl_c() => {
                shutdown.trigger();
                info!("Shutdown signal received, exiting");
                return Ok(());
            }
        }
    }
}
