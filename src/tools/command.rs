//! The `command_executor` tool.
//!
//! One request walks through these stages, each of which may end it:
//!
//! ```text
//! Received -> Classified -> Confirmed | Rejected
//!          -> EscalationPending -> Escalated | EscalationDenied
//!          -> Executed -> Logged
//! ```
//!
//! Only commands that actually ran reach `Logged`; every run is logged,
//! whatever its exit status. Nothing is retried.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::guard::{CommandClassifier, PrivilegeEscalator};

use super::audit::AuditLog;
use super::interaction::{is_affirmative, Interaction, Shutdown};
use super::shell::{ShellOutput, ShellRunner};
use super::ToolError;

/// Commands starting with this prefix need a verified sudo password first.
const PRIVILEGE_PREFIX: &str = "sudo ";

/// A command proposed by the LLM.
#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub command: String,
    /// When set, dangerous commands are refused outright instead of
    /// prompting the human, and the LLM must come back with approval.
    pub ask_for_confirmation: bool,
}

/// What one command run produced.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub output: ShellOutput,
    /// Text handed back to the LLM.
    pub text: String,
}

pub struct CommandExecutor {
    interaction: Arc<dyn Interaction>,
    shell: Arc<dyn ShellRunner>,
    escalator: PrivilegeEscalator,
    audit: AuditLog,
    shutdown: Shutdown,
}

impl CommandExecutor {
    pub fn new(
        interaction: Arc<dyn Interaction>,
        shell: Arc<dyn ShellRunner>,
        audit: AuditLog,
    ) -> Self {
        let shutdown = Shutdown::default();
        let escalator =
            PrivilegeEscalator::new(interaction.clone(), shell.clone()).with_shutdown(shutdown.clone());
        Self {
            interaction,
            shell,
            escalator,
            audit,
            shutdown,
        }
    }

    /// Handle that stops any command still waiting on the console from running.
    pub fn shutdown(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Runs a command through the whole pipeline.
    ///
    /// Blocks on the console and on the child process.
    pub fn execute(&self, request: &CommandRequest) -> Result<ExecutionResult, ToolError> {
        let command = request.command.as_str();
        debug!("Command received: {command}");

        if CommandClassifier::is_dangerous(command) {
            if request.ask_for_confirmation {
                warn!("Dangerous command needs confirmation: {command}");
                return Err(ToolError::ConfirmationRequired);
            }
            self.confirm(command)?;
        }

        if command.starts_with(PRIVILEGE_PREFIX) {
            debug!("Privileged command, escalating");
            if !self.escalator.escalate() {
                return Err(ToolError::EscalationFailed);
            }
        }

        if self.shutdown.is_triggered() {
            info!("Shutting down, not executing: {command}");
            return Err(ToolError::ShuttingDown);
        }

        info!("Executing: {command}");
        let outcome = match self.shell.run(command, None) {
            Ok(output) => Self::interpret(command, output),
            Err(e) => Err(ToolError::Unknown(format!("could not start shell: {e}"))),
        };

        let logged = match &outcome {
            Ok(result) => result.text.clone(),
            Err(e) => e.to_string(),
        };
        if let Err(e) = self.audit.append(command, &logged) {
            error!("Failed to write audit log {}: {e}", self.audit.path().display());
        }

        outcome
    }

    /// Interactive yes/no for a dangerous command. Anything but yes cancels.
    fn confirm(&self, command: &str) -> Result<(), ToolError> {
        let answer = self
            .interaction
            .prompt(&format!("Execute dangerous command `{command}`? (y/n)"))
            .unwrap_or_else(|e| {
                warn!("Could not read confirmation: {e}");
                String::new()
            });

        if is_affirmative(&answer) {
            debug!("Dangerous command confirmed");
            Ok(())
        } else {
            info!("Dangerous command cancelled by user: {command}");
            Err(ToolError::UserRejected)
        }
    }

    fn interpret(command: &str, output: ShellOutput) -> Result<ExecutionResult, ToolError> {
        if output.success() {
            let text = if output.stdout.is_empty() {
                output.stderr.clone()
            } else {
                output.stdout.clone()
            };
            return Ok(ExecutionResult { output, text });
        }

        let code = output.status.unwrap_or(-1);
        warn!("Command exited with status {code}: {command}");
        Err(ToolError::SubprocessFailure(CommandClassifier::diagnose(
            command,
            code,
            &output.stderr,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::classifier::PackageManager;
    use crate::tools::testing::{exited, CountingShell, ScriptedInteraction};

    struct Fixture {
        _dir: tempfile::TempDir,
        ui: Arc<ScriptedInteraction>,
        shell: Arc<CountingShell>,
        log_path: std::path::PathBuf,
        executor: CommandExecutor,
    }

    fn fixture(answers: &[&str], outputs: Vec<ShellOutput>) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("command_history.log");
        let ui = Arc::new(ScriptedInteraction::new(answers));
        let shell = Arc::new(CountingShell::new(outputs));
        let executor = CommandExecutor::new(ui.clone(), shell.clone(), AuditLog::new(&log_path));
        Fixture {
            _dir: dir,
            ui,
            shell,
            log_path,
            executor,
        }
    }

    fn request(command: &str, ask_for_confirmation: bool) -> CommandRequest {
        CommandRequest {
            command: command.to_string(),
            ask_for_confirmation,
        }
    }

    fn audit_log(f: &Fixture) -> String {
        std::fs::read_to_string(&f.log_path).unwrap_or_default()
    }

    #[test]
    fn test_safe_command_returns_stdout() {
        let f = fixture(&[], vec![exited(0, "file.txt\n", "")]);
        let result = f.executor.execute(&request("ls", false)).unwrap();
        assert_eq!(result.text, "file.txt\n");
        assert_eq!(f.shell.calls(), 1);
        assert_eq!(f.ui.prompt_count(), 0);
    }

    #[test]
    fn test_empty_stdout_falls_back_to_stderr() {
        let f = fixture(&[], vec![exited(0, "", "warning: nothing to do\n")]);
        let result = f.executor.execute(&request("ls", false)).unwrap();
        assert_eq!(result.text, "warning: nothing to do\n");
    }

    #[test]
    fn test_dangerous_with_confirmation_flag_never_runs() {
        let f = fixture(&[], vec![]);
        let result = f.executor.execute(&request("rm -rf ./data/tmp", true));
        assert!(matches!(result, Err(ToolError::ConfirmationRequired)));
        assert_eq!(f.shell.calls(), 0);
        assert_eq!(f.ui.prompt_count(), 0);
        assert!(audit_log(&f).is_empty());
    }

    #[test]
    fn test_dangerous_rejected_by_user() {
        let f = fixture(&["n"], vec![]);
        let result = f.executor.execute(&request("rm -rf ./data/tmp", false));
        assert!(matches!(result, Err(ToolError::UserRejected)));
        assert_eq!(f.shell.calls(), 0);
        assert!(f.ui.prompts.lock().unwrap()[0].contains("rm -rf ./data/tmp"));
    }

    #[test]
    fn test_dangerous_unanswered_is_rejected() {
        let f = fixture(&[], vec![]);
        let result = f.executor.execute(&request("mv a b", false));
        assert!(matches!(result, Err(ToolError::UserRejected)));
        assert_eq!(f.shell.calls(), 0);
    }

    #[test]
    fn test_dangerous_confirmed_runs() {
        let f = fixture(&["y"], vec![exited(0, "", "")]);
        f.executor.execute(&request("rm -rf ./data/tmp", false)).unwrap();
        assert_eq!(f.shell.calls(), 1);
        assert_eq!(f.shell.commands.lock().unwrap()[0], "rm -rf ./data/tmp");
    }

    #[test]
    fn test_apt_failure_is_diagnosed_and_logged() {
        let f = fixture(
            &[],
            vec![exited(104, "", "E: Unable to locate package foo")],
        );
        let err = f.executor.execute(&request("apt install foo", false)).unwrap_err();

        match &err {
            ToolError::SubprocessFailure(d) => {
                assert_eq!(d.manager, Some(PackageManager::Apt));
                assert_eq!(d.exit_code, 104);
            }
            other => panic!("expected SubprocessFailure, got {other:?}"),
        }
        assert!(err.to_string().contains("package not found"));

        let log = audit_log(&f);
        assert!(log.contains("] apt install foo\n"));
        assert!(log.contains("package not found"));
    }

    #[test]
    fn test_success_is_logged() {
        let f = fixture(&[], vec![exited(0, "hello\n", "")]);
        f.executor.execute(&request("echo hello", false)).unwrap();
        let log = audit_log(&f);
        assert!(log.ends_with("] echo hello\nhello\n\n\n"));
    }

    #[test]
    fn test_signal_termination_is_failure() {
        let killed = ShellOutput {
            status: None,
            stdout: String::new(),
            stderr: "Killed".to_string(),
        };
        let f = fixture(&[], vec![killed]);
        let err = f.executor.execute(&request("sleep 100", false)).unwrap_err();
        assert!(err.to_string().contains("exit status -1"));
    }

    #[test]
    fn test_spawn_failure_is_unknown_error_and_logged() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("log");
        let executor = CommandExecutor::new(
            Arc::new(ScriptedInteraction::new(&[])),
            Arc::new(CountingShell::failing_spawn()),
            AuditLog::new(&log_path),
        );
        let err = executor.execute(&request("ls", false)).unwrap_err();
        assert!(matches!(err, ToolError::Unknown(_)));
        assert!(std::fs::read_to_string(&log_path).unwrap().contains("could not start shell"));
    }

    #[test]
    fn test_sudo_escalation_denied() {
        let f = fixture(&["bad password"], vec![exited(1, "", "Sorry, try again.")]);
        let result = f.executor.execute(&request("sudo apt update", false));
        assert!(matches!(result, Err(ToolError::EscalationFailed)));
        // Only the sudo check ran
        assert_eq!(f.shell.calls(), 1);
        assert!(audit_log(&f).is_empty());
    }

    #[test]
    fn test_sudo_escalation_granted_then_runs() {
        let f = fixture(
            &["good password"],
            vec![exited(0, "", ""), exited(0, "Reading package lists...\n", "")],
        );
        let result = f.executor.execute(&request("sudo apt update", false)).unwrap();
        assert_eq!(result.text, "Reading package lists...\n");
        assert_eq!(f.shell.calls(), 2);
        assert_eq!(f.shell.commands.lock().unwrap()[1], "sudo apt update");
    }

    /// A dangerous privileged command asks for confirmation before the password.
    #[test]
    fn test_dangerous_sudo_confirms_before_escalating() {
        let f = fixture(&["y", "pw"], vec![exited(0, "", ""), exited(0, "", "")]);
        f.executor.execute(&request("sudo rm /tmp/x", false)).unwrap();
        let prompts = f.ui.prompts.lock().unwrap();
        assert!(prompts[0].contains("dangerous"));
        assert!(prompts[1].contains("sudo"));
    }

    /// A verified password can still fail on the real command.
    #[test]
    fn test_privileged_command_failure_after_escalation() {
        let f = fixture(
            &["pw"],
            vec![exited(0, "", ""), exited(100, "", "E: config broken")],
        );
        let err = f.executor.execute(&request("sudo apt update", false)).unwrap_err();
        assert!(err.to_string().contains("configuration error"));
    }

    /// Ctrl-C while the confirmation prompt is up: the late "y" must not run it.
    #[test]
    fn test_confirmation_after_shutdown_does_not_run() {
        struct InterruptedConsole(std::sync::OnceLock<Shutdown>);

        impl Interaction for InterruptedConsole {
            fn prompt(&self, _text: &str) -> anyhow::Result<String> {
                if let Some(shutdown) = self.0.get() {
                    shutdown.trigger();
                }
                Ok("y".to_string())
            }

            fn prompt_secret(&self, _text: &str) -> anyhow::Result<secrecy::SecretString> {
                anyhow::bail!("no secrets here")
            }

            fn notify(&self, _text: &str) {}
        }

        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("log");
        let shell = Arc::new(CountingShell::new(vec![exited(0, "", "")]));
        let console = Arc::new(InterruptedConsole(std::sync::OnceLock::new()));
        let executor = CommandExecutor::new(console.clone(), shell.clone(), AuditLog::new(&log_path));
        console.0.set(executor.shutdown()).unwrap();

        let result = executor.execute(&request("rm -rf ./data/tmp", false));
        assert!(matches!(result, Err(ToolError::ShuttingDown)));
        assert_eq!(shell.calls(), 0);
        assert!(!log_path.exists());
    }

    #[test]
    fn test_sudo_password_after_shutdown_does_not_run() {
        let f = fixture(&["pw"], vec![exited(0, "", ""), exited(0, "", "")]);
        f.executor.shutdown().trigger();
        let result = f.executor.execute(&request("sudo apt update", false));
        assert!(matches!(result, Err(ToolError::EscalationFailed)));
        assert_eq!(f.shell.calls(), 0);
    }

    #[test]
    fn test_audit_failure_does_not_change_result() {
        let dir = tempfile::tempdir().unwrap();
        let executor = CommandExecutor::new(
            Arc::new(ScriptedInteraction::new(&[])),
            Arc::new(CountingShell::new(vec![exited(0, "ok\n", "")])),
            AuditLog::new(dir.path().join("missing").join("log")),
        );
        assert_eq!(executor.execute(&request("ls", false)).unwrap().text, "ok\n");
    }
}
