//! Bounded external command execution.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use super::DeviceError;

/// Default per-command timeout in seconds.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 120;

/// Captured result of one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Runs commands with an argument vector (never through a shell) and a
/// fixed timeout.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    timeout: Duration,
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS))
    }
}

impl CommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `program` with `args`, killing it if it outlives the timeout.
    pub async fn run<S: AsRef<str>>(
        &self,
        program: &str,
        args: &[S],
    ) -> Result<CommandOutput, DeviceError> {
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        let rendered = format!("{} {}", program, args.join(" "));
        tracing::debug!("running: {}", rendered);

        let mut command = Command::new(program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        match timeout(self.timeout, command.output()).await {
            Err(_) => Err(DeviceError::Timeout {
                command: rendered,
                secs: self.timeout.as_secs(),
            }),
            Ok(Err(source)) => Err(DeviceError::Spawn {
                program: program.to_string(),
                source,
            }),
            Ok(Ok(output)) => {
                let result = CommandOutput {
                    status: output.status.code().unwrap_or(-1),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                };
                if !result.success() {
                    tracing::warn!("{} exited with status {}", rendered, result.status);
                }
                Ok(result)
            }
        }
    }
}
