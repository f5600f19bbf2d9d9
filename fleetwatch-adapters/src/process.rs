//! Shared helper for running collaborator commands.

use std::process::Stdio;

use tokio::process::Command;
use tracing::trace;

use crate::AdapterError;

/// Captured result of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub status: String,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Turn an unsuccessful exit into an error.
    pub fn into_success(self, program: &str) -> Result<String, AdapterError> {
        if self.success {
            Ok(self.stdout)
        } else {
            Err(AdapterError::Command {
                program: program.to_string(),
                status: self.status,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Run a command to completion and capture its output.
///
/// The child is killed if the returned future is dropped, so wrapping this in
/// a timeout never leaves a stray probe behind.
pub async fn run<I, S>(program: &str, args: I) -> Result<CommandOutput, AdapterError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await?;

    let result = CommandOutput {
        success: output.status.success(),
        status: output.status.to_string(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    trace!(program, status = %result.status, "command finished");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_captures_stdout() {
        let output = run("sh", ["-c", "echo 42"]).await.unwrap();
        assert!(output.success);
        assert_eq!(output.stdout.trim(), "42");
    }

    #[tokio::test]
    async fn test_failure_becomes_error() {
        let output = run("sh", ["-c", "echo boom >&2; exit 3"]).await.unwrap();
        assert!(!output.success);
        let err = output.into_success("sh").unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_missing_program_is_io_error() {
        let err = run("fleetwatch-no-such-binary", Vec::<String>::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Io(_)));
    }
}
