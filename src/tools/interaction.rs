//! The human side of the agent.
//!
//! Everything that blocks on the person at the keyboard (the REPL prompt,
//! dangerous-command confirmation, the sudo password, `ask_human`) goes
//! through [`Interaction`], so tests can swap the console for a script.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use dialoguer::{Input, Password};
use secrecy::SecretString;

/// Synchronous user-interaction port.
///
/// Prompt texts are rendered followed by `": "`.
pub trait Interaction: Send + Sync {
    /// Asks for a line of free text. Empty answers are allowed.
    fn prompt(&self, text: &str) -> Result<String>;

    /// Asks for a secret with masked input.
    fn prompt_secret(&self, text: &str) -> Result<SecretString>;

    /// Shows a message that needs no answer.
    fn notify(&self, text: &str);
}

/// Terminal implementation backed by `dialoguer`.
pub struct ConsoleInteraction;

impl Interaction for ConsoleInteraction {
    fn prompt(&self, text: &str) -> Result<String> {
        let answer = Input::<String>::new()
            .with_prompt(text)
            .allow_empty(true)
            .interact_text()?;
        Ok(answer)
    }

    fn prompt_secret(&self, text: &str) -> Result<SecretString> {
        let secret = Password::new()
            .with_prompt(text)
            .allow_empty_password(true)
            .interact()?;
        Ok(SecretString::new(secret))
    }

    fn notify(&self, text: &str) {
        println!("{text}");
    }
}

/// Session-wide shutdown flag.
///
/// A prompt running on a blocking thread cannot be interrupted, so an answer
/// may still arrive after Ctrl-C. Anything that acts on an answer checks this
/// flag first.
#[derive(Debug, Clone, Default)]
pub struct Shutdown(Arc<AtomicBool>);

impl Shutdown {
    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Returns true for an affirmative answer (`y` or `yes`, any case).
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
