//! External process execution.
//!
//! Every collaborator that shells out (git, the build tool) goes through the
//! [`ProcessRunner`] trait so the pipeline can be driven by scripted fakes in
//! tests.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{GraderError, Result};

/// A command to run in a working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Human-readable label used in logs.
    pub name: String,

    /// Command to execute (first element is the executable).
    pub argv: Vec<String>,

    pub working_dir: PathBuf,

    /// Timeout in seconds; zero waits indefinitely.
    pub timeout_secs: u64,
}

impl CommandSpec {
    pub fn new<I, S>(name: impl Into<String>, argv: I, working_dir: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            argv: argv.into_iter().map(Into::into).collect(),
            working_dir: working_dir.into(),
            timeout_secs: 0,
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    /// The argv joined with spaces, for display.
    pub fn display(&self) -> String {
        self.argv.join(" ")
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code (-1 when terminated by a signal).
    pub exit_code: i32,

    pub stdout: String,

    pub stderr: String,

    pub duration_ms: u64,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// stdout followed by stderr.
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout.trim_end_matches('\n'), self.stderr)
        }
    }
}

/// Runs commands to completion and captures their output.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

/// [`ProcessRunner`] backed by `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioProcessRunner;

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let start = Instant::now();

        let Some((exe, args)) = spec.argv.split_first() else {
            return Err(GraderError::CommandSpawn {
                command: spec.name.clone(),
                reason: "empty command".to_string(),
            });
        };

        debug!(command = %spec.display(), dir = %spec.working_dir.display(), "Spawning command");

        let child = Command::new(exe)
            .args(args)
            .current_dir(&spec.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| GraderError::CommandSpawn {
                command: spec.display(),
                reason: e.to_string(),
            })?;

        let output = if spec.timeout_secs > 0 {
            tokio::time::timeout(
                Duration::from_secs(spec.timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| GraderError::CommandTimeout {
                command: spec.display(),
                timeout_secs: spec.timeout_secs,
            })??
        } else {
            child.wait_with_output().await?
        };

        Ok(CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_spec_builder() {
        let spec = CommandSpec::new("build", ["ant", "compile"], "/tmp").with_timeout(30);
        assert_eq!(spec.program(), Some("ant"));
        assert_eq!(spec.display(), "ant compile");
        assert_eq!(spec.timeout_secs, 30);
    }

    #[test]
    fn test_combined_output() {
        let output = CommandOutput {
            exit_code: 1,
            stdout: "out\n".to_string(),
            stderr: "err".to_string(),
            duration_ms: 1,
        };
        assert_eq!(output.combined(), "out\nerr");
        assert!(!output.success());
    }

    #[tokio::test]
    async fn test_run_simple_command() {
        let dir = tempfile::tempdir().unwrap();
        let spec = CommandSpec::new("echo", ["echo", "hello"], dir.path());

        let output = TokioProcessRunner.run(&spec).await.expect("run failed");
        assert!(output.success());
        assert!(output.stdout.contains("hello"));
    }

    #[tokio::test]
    async fn test_run_failing_command() {
        let dir = tempfile::tempdir().unwrap();
        let spec = CommandSpec::new("false", ["false"], dir.path());

        let output = TokioProcessRunner.run(&spec).await.expect("run failed");
        assert!(!output.success());
        assert_ne!(output.exit_code, 0);
    }

    #[tokio::test]
    async fn test_run_missing_program_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let spec = CommandSpec::new("nope", ["classgrade-no-such-binary"], dir.path());

        let err = TokioProcessRunner.run(&spec).await.unwrap_err();
        assert!(matches!(err, GraderError::CommandSpawn { .. }));
    }

    #[tokio::test]
    async fn test_run_empty_command() {
        let spec = CommandSpec::new("empty", Vec::<String>::new(), ".");
        assert!(TokioProcessRunner.run(&spec).await.is_err());
    }

    #[tokio::test]
    async fn test_run_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let spec = CommandSpec::new("sleep", ["sleep", "5"], dir.path()).with_timeout(1);

        let err = TokioProcessRunner.run(&spec).await.unwrap_err();
        assert!(matches!(err, GraderError::CommandTimeout { .. }));
    }
}
