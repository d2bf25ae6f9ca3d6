use std::io::{self, Write};
use std::process::{Command, Stdio};

use tracing::debug;

/// Captured result of one shell invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ShellOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs command strings through the host shell.
///
/// Implementations block until the process exits. There is no timeout.
pub trait ShellRunner: Send + Sync {
    /// Runs `command` with `sh -c`. When `stdin` is given it is written to
    /// the child's standard input, which is then closed.
    fn run(&self, command: &str, stdin: Option<&str>) -> io::Result<ShellOutput>;
}

/// `sh -c` on the local machine.
pub struct SystemShell;

impl ShellRunner for SystemShell {
    fn run(&self, command: &str, stdin: Option<&str>) -> io::Result<ShellOutput> {
        debug!("Spawning sh -c ({} bytes)", command.len());

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = match stdin {
            None => cmd.stdin(Stdio::null()).output()?,
            Some(input) => {
                let mut child = cmd.stdin(Stdio::piped()).spawn()?;
                if let Some(mut pipe) = child.stdin.take() {
                    // The child may exit before reading; a broken pipe is not an error here.
                    if let Err(e) = pipe.write_all(input.as_bytes()) {
                        if e.kind() != io::ErrorKind::BrokenPipe {
                            return Err(e);
                        }
                    }
                }
                child.wait_with_output()?
            }
        };

        Ok(ShellOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
