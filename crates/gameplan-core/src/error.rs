//! Error types for gameplan
//!
//! Every failure of a run surfaces as a [`GameplanError`]:
//! - Destination and module validation failures
//! - Sandbox violations raised while operations are declared
//! - Template rendering failures
//! - Process failures (clone or `spawn` operations)

use crate::process::SpawnError;
use std::path::{Path, PathBuf};

/// Main gameplan error type
#[derive(Debug, thiserror::Error)]
pub enum GameplanError {
    /// Destination directory already has entries
    #[error("{} is not empty", .directory.display())]
    DirectoryNotEmpty { directory: PathBuf },

    /// Option definitions returned by the module do not match the schema
    #[error("invalid option definitions")]
    InvalidOptionDefinitions {
        /// Every schema violation, not only the first
        errors: Vec<String>,
    },

    /// Module has no run entry point
    #[error("gameplan module must have a run method")]
    InvalidRunMethod,

    /// Module referenced a path outside of its sandbox root
    #[error("{} does not reside within {}", .filepath.display(), .directory.display())]
    OutOfBoundsFile {
        directory: PathBuf,
        filepath: PathBuf,
    },

    /// Template placeholder without a matching variable
    #[error("\"{0}\" found in template, but not provided in variables")]
    UndefinedTemplateVariable(String),

    /// `template` was declared with variables that are not a mapping
    #[error("template variables must be an object")]
    TemplateVariablesNotObject,

    /// External process exited unsuccessfully
    #[error(transparent)]
    Spawn(#[from] SpawnError),

    /// Cloned repository carries no gameplan manifest
    #[error("no gameplan manifest found in {}", .directory.display())]
    ModuleNotFound { directory: PathBuf },

    /// Gameplan manifest could not be read
    #[error("invalid gameplan manifest {}: {message}", .path.display())]
    Manifest { path: PathBuf, message: String },

    /// Gameplan-specific command-line arguments were rejected
    #[error("invalid gameplan arguments: {0}")]
    ModuleArguments(#[from] clap::Error),

    /// Interactive prompting failed
    #[error("prompt failed: {0}")]
    Prompt(String),

    /// Filesystem or process-start failure
    #[error("io error: {op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization failure
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GameplanError {
    /// Build a mapper from `std::io::Error` for the given operation and path
    pub fn io(op: &'static str, path: impl AsRef<Path>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        move |source| Self::Io { op, path, source }
    }

    /// Create manifest error
    pub fn manifest(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Manifest {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Process exit code a front-end should terminate with
    ///
    /// Spawn failures forward the child's code; a child killed by a signal
    /// and every other error map to `1`.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Spawn(err) => err.code.unwrap_or(1),
            _ => 1,
        }
    }

    /// Check if the module author, not the user, is responsible for the error
    #[inline]
    #[must_use]
    pub fn is_module_fault(&self) -> bool {
        matches!(
            self,
            Self::InvalidOptionDefinitions { .. }
                | Self::InvalidRunMethod
                | Self::OutOfBoundsFile { .. }
                | Self::UndefinedTemplateVariable(_)
                | Self::TemplateVariablesNotObject
                | Self::ModuleNotFound { .. }
                | Self::Manifest { .. }
        )
    }
}
