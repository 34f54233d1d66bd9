//! Run configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything a single gameplan run needs from its caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Where the project is generated; must be empty or missing
    pub destination_directory: PathBuf,
    /// Root under which the temporary source directory is created
    pub temporary_directory: PathBuf,
    /// Gameplan repository, anything `git clone` accepts
    pub repo: String,
    /// Ask for every option interactively after argument parsing
    #[serde(default)]
    pub prompt: bool,
    /// Gameplan-specific arguments (after `--`)
    #[serde(default)]
    pub args: Vec<String>,
}

impl RunConfig {
    /// Create config using the OS temporary directory
    #[must_use]
    pub fn new(repo: impl Into<String>, destination_directory: impl Into<PathBuf>) -> Self {
        Self {
            destination_directory: destination_directory.into(),
            temporary_directory: std::env::temp_dir(),
            repo: repo.into(),
            prompt: false,
            args: Vec::new(),
        }
    }

    /// With temporary directory root
    #[must_use]
    pub fn with_temporary_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.temporary_directory = directory.into();
        self
    }

    /// With interactive prompting
    #[must_use]
    pub fn with_prompt(mut self, prompt: bool) -> Self {
        self.prompt = prompt;
        self
    }

    /// With gameplan arguments
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}
