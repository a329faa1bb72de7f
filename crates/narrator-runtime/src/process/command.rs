//! One-shot external commands (`python3`, `docker`, `pip`).

use std::ffi::OsStr;
use std::process::{Output, Stdio};

use narrator_core::SupervisorError;
use tokio::process::Command;
use tracing::debug;

/// Captured result of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// First non-empty stderr line, or `fallback`.
    pub fn error_line(&self, fallback: &str) -> String {
        first_line(&self.stderr).unwrap_or(fallback).to_string()
    }

    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

pub fn first_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|line| !line.is_empty())
}

/// Run a command to completion, capturing its output.
///
/// Failing to launch the program at all is an error; a non-zero exit is
/// reported through [`CommandOutput::success`].
pub async fn run<I, S>(program: impl AsRef<OsStr>, args: I) -> Result<CommandOutput, SupervisorError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let program = program.as_ref();
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true);

    debug!(program = %program.to_string_lossy(), "Running command");
    let output = command
        .output()
        .await
        .map_err(|e| SupervisorError::CommandFailed {
            command: program.to_string_lossy().into_owned(),
            reason: e.to_string(),
        })?;
    Ok(output.into())
}

/// Like [`run`], but a non-zero exit is also an error.
pub async fn run_checked<I, S>(
    program: impl AsRef<OsStr>,
    args: I,
) -> Result<CommandOutput, SupervisorError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let program = program.as_ref();
    let output = run(program, args).await?;
    if output.success {
        Ok(output)
    } else {
        Err(SupervisorError::CommandFailed {
            command: program.to_string_lossy().into_owned(),
            reason: output.error_line("exited with an error"),
        })
    }
}
