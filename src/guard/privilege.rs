use std::sync::Arc;

use secrecy::ExposeSecret;
use tracing::{info, warn};

use crate::tools::interaction::{Interaction, Shutdown};
use crate::tools::shell::ShellRunner;

/// Privileged no-op used to check the password. `-p ''` silences sudo's own prompt.
const SUDO_CHECK: &str = "sudo -S -p '' true";

/// Asks the user for their sudo password and checks it.
///
/// A successful check refreshes sudo's credential cache, so the privileged
/// command that follows normally runs without asking again. That command
/// can still fail (cache disabled, expired, revoked); callers treat that as
/// an ordinary execution failure.
pub struct PrivilegeEscalator {
    interaction: Arc<dyn Interaction>,
    shell: Arc<dyn ShellRunner>,
    shutdown: Shutdown,
}

impl PrivilegeEscalator {
    pub fn new(interaction: Arc<dyn Interaction>, shell: Arc<dyn ShellRunner>) -> Self {
        Self {
            interaction,
            shell,
            shutdown: Shutdown::default(),
        }
    }

    /// A password typed after `shutdown` fires is discarded.
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Returns true if elevated privileges were obtained.
    pub fn escalate(&self) -> bool {
        let password = match self
            .interaction
            .prompt_secret("This command needs sudo privileges. Enter your password")
        {
            Ok(p) => p,
            Err(e) => {
                warn!("Could not read sudo password: {e}");
                return false;
            }
        };

        if self.shutdown.is_triggered() {
            info!("Shutting down, sudo password discarded");
            return false;
        }

        let stdin = format!("{}\n", password.expose_secret());
        match self.shell.run(SUDO_CHECK, Some(&stdin)) {
            Ok(out) if out.success() => {
                info!("sudo credentials verified");
                true
            }
            Ok(_) => {
                warn!("sudo password rejected");
                self.interaction.notify("Invalid sudo password");
                false
            }
            Err(e) => {
                warn!("Could not run sudo: {e}");
                self.interaction.notify("Invalid sudo password");
                false
            }
        }
    }
}
