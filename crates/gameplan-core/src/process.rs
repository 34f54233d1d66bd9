//! Process spawning
//!
//! [`Spawner`] is the seam through which every external process runs: the
//! shallow clone of a gameplan repository and the module's `spawn`
//! operations. Non-zero exits become a [`SpawnError`] carrying everything
//! needed to diagnose the failure.

use crate::error::GameplanError;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;

/// How the child's standard streams are wired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stdio {
    /// Share the parent's terminal
    Inherit,
    /// Capture stdout / stderr, close stdin
    Piped,
}

/// Options for a single spawn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpawnOptions {
    /// Working directory, the parent's when `None`
    pub cwd: Option<PathBuf>,
    pub stdio: Stdio,
}

impl SpawnOptions {
    /// Captured output in the parent's working directory
    #[inline]
    #[must_use]
    pub fn captured() -> Self {
        Self {
            cwd: None,
            stdio: Stdio::Piped,
        }
    }

    /// Inherited streams in `cwd`
    #[inline]
    #[must_use]
    pub fn inherited(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: Some(cwd.into()),
            stdio: Stdio::Inherit,
        }
    }

    /// With working directory
    #[inline]
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

/// Output of a successful spawn (empty for inherited streams)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpawnOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// A process exited with a non-zero status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnError {
    pub command: String,
    pub args: Vec<String>,
    pub options: SpawnOptions,
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl SpawnError {
    /// Command line as typed in a shell
    #[must_use]
    pub fn full_command(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Captured stderr, lossily decoded
    #[must_use]
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

impl fmt::Display for SpawnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "\"{}\" exited with code {code}", self.full_command()),
            None => write!(f, "\"{}\" was terminated by a signal", self.full_command()),
        }
    }
}

impl std::error::Error for SpawnError {}

/// Process-spawn collaborator
#[async_trait]
pub trait Spawner: Send + Sync {
    /// Run `command` to completion
    ///
    /// # Errors
    /// - `GameplanError::Spawn` on a non-zero exit
    /// - `GameplanError::Io` if the process cannot be started
    async fn spawn(
        &self,
        command: &str,
        args: &[String],
        options: &SpawnOptions,
    ) -> Result<SpawnOutput, GameplanError>;
}

/// [`Spawner`] backed by `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessSpawner;

impl ProcessSpawner {
    /// Create new spawner
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Spawner for ProcessSpawner {
    async fn spawn(
        &self,
        command: &str,
        args: &[String],
        options: &SpawnOptions,
    ) -> Result<SpawnOutput, GameplanError> {
        let mut cmd = tokio::process::Command::new(command);
        cmd.args(args);
        if let Some(cwd) = &options.cwd {
            cmd.current_dir(cwd);
        }

        tracing::debug!("Spawning \"{} {}\" ({:?})", command, args.join(" "), options.stdio);

        let (status, output): (ExitStatus, SpawnOutput) = match options.stdio {
            Stdio::Inherit => {
                let status = cmd
                    .stdin(std::process::Stdio::inherit())
                    .stdout(std::process::Stdio::inherit())
                    .stderr(std::process::Stdio::inherit())
                    .status()
                    .await
                    .map_err(GameplanError::io("spawn", command))?;
                (status, SpawnOutput::default())
            }
            Stdio::Piped => {
                let output = cmd
                    .stdin(std::process::Stdio::null())
                    .output()
                    .await
                    .map_err(GameplanError::io("spawn", command))?;
                (
                    output.status,
                    SpawnOutput {
                        stdout: output.stdout,
                        stderr: output.stderr,
                    },
                )
            }
        };

        if status.success() {
            return Ok(output);
        }

        Err(SpawnError {
            command: command.to_string(),
            args: args.to_vec(),
            options: options.clone(),
            code: status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        }
        .into())
    }
}
