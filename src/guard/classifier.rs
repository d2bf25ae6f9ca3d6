use std::fmt;

/// Substrings that mark a command as dangerous.
///
/// Matching is a plain substring test, so `rm` also matches `firmware`
/// and `>` matches `2>&1`. Over-matching only costs a confirmation prompt.
const DANGEROUS_TOKENS: &[&str] = &["rm", "chmod", "chown", "dd", "mv", ">", ">>"];

/// Package managers whose exit codes get a dedicated diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Apt,
    Snap,
}

impl PackageManager {
    /// Detects the package manager a command invokes. `apt` wins over `snap`
    /// when both appear.
    pub fn detect(command: &str) -> Option<Self> {
        if command.contains("apt") {
            Some(Self::Apt)
        } else if command.contains("snap") {
            Some(Self::Snap)
        } else {
            None
        }
    }

    /// Looks up the human-readable meaning of an exit code.
    pub fn describe(self, code: i32) -> Option<&'static str> {
        match (self, code) {
            (Self::Apt, 100) => Some("configuration error"),
            (Self::Apt, 101) => Some("lock error (another package manager is running)"),
            (Self::Apt, 102) => Some("insufficient privileges"),
            (Self::Apt, 103) => Some("network unreachable"),
            (Self::Apt, 104) => Some("package not found"),
            (Self::Snap, 1) => Some("snapd error"),
            (Self::Snap, 2) => Some("package not found"),
            (Self::Snap, 3) => Some("insufficient privileges"),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Apt => "APT",
            Self::Snap => "SNAP",
        }
    }
}

/// Human-readable explanation of a failed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnosis {
    /// Package manager the command was attributed to, if any.
    pub manager: Option<PackageManager>,
    /// Exit code the diagnosis was built from (`-1` when killed by a signal).
    pub exit_code: i32,
    pub message: String,
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Stateless command inspection: danger detection and failure diagnosis.
pub struct CommandClassifier;

impl CommandClassifier {
    /// Returns true if the command contains any dangerous token.
    pub fn is_dangerous(command: &str) -> bool {
        DANGEROUS_TOKENS.iter().any(|token| command.contains(token))
    }

    /// Explains a non-zero exit.
    pub fn diagnose(command: &str, exit_code: i32, stderr: &str) -> Diagnosis {
        let manager = PackageManager::detect(command);
        let message = match manager {
            Some(pm) => match pm.describe(exit_code) {
                Some(text) => format!("{} error: {text}\n{stderr}", pm.label()),
                None => format!(
                    "{} error: unknown error code {exit_code}\n{stderr}",
                    pm.label()
                ),
            },
            None => format!(
                "Execution failed: command '{command}' returned non-zero exit status {exit_code}\n{stderr}"
            ),
        };

        Diagnosis {
            manager,
            exit_code,
            message,
        }
    }
}
