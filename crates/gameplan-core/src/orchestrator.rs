//! Gameplan orchestrator
//!
//! Drives one run end to end:
//! - Prepares an empty destination directory
//! - Clones the gameplan into a temporary source directory
//! - Loads the module and resolves its options
//! - Records the module's operations, then executes them in order
//!
//! The temporary source directory is removed on every exit path; the
//! destination is left as-is when a run fails.

use crate::config::RunConfig;
use crate::error::GameplanError;
use crate::git::{GitCli, SourceControl};
use crate::module::{ManifestLoader, ModuleLoader, OptionsContext};
use crate::operations::{execute_all, Operations};
use crate::options::{parse_arguments, prompt_for_options, validate_definitions};
use crate::process::{ProcessSpawner, Spawner};
use crate::prompt::{Prompter, TerminalPrompter};
use crate::sandbox::normalize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Prefix of temporary source directories
pub const TEMP_PREFIX: &str = "gameplan-";

/// Runs gameplans with a set of collaborators
#[derive(Clone)]
pub struct Orchestrator {
    source_control: Arc<dyn SourceControl>,
    spawner: Arc<dyn Spawner>,
    prompter: Arc<dyn Prompter>,
    loader: Arc<dyn ModuleLoader>,
}

impl Orchestrator {
    /// Create orchestrator with `git`, real processes, a terminal prompt
    /// and manifest modules
    #[must_use]
    pub fn new() -> Self {
        let spawner: Arc<dyn Spawner> = Arc::new(ProcessSpawner::new());
        Self {
            source_control: Arc::new(GitCli::with_spawner(Arc::clone(&spawner))),
            spawner,
            prompter: Arc::new(TerminalPrompter::stdio()),
            loader: Arc::new(ManifestLoader::new()),
        }
    }

    /// With source control
    #[must_use]
    pub fn with_source_control(mut self, source_control: Arc<dyn SourceControl>) -> Self {
        self.source_control = source_control;
        self
    }

    /// With spawner used by `spawn` operations
    #[must_use]
    pub fn with_spawner(mut self, spawner: Arc<dyn Spawner>) -> Self {
        self.spawner = spawner;
        self
    }

    /// With prompter
    #[must_use]
    pub fn with_prompter(mut self, prompter: Arc<dyn Prompter>) -> Self {
        self.prompter = prompter;
        self
    }

    /// With module loader
    #[must_use]
    pub fn with_loader(mut self, loader: Arc<dyn ModuleLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Run a gameplan, returning the absolute destination directory
    ///
    /// # Errors
    /// The first failure of any stage, unmodified. Failing to remove the
    /// temporary source directory is only logged.
    pub async fn run(&self, config: &RunConfig) -> Result<PathBuf, GameplanError> {
        let destination = absolute(&config.destination_directory)?;

        tokio::fs::create_dir_all(&destination)
            .await
            .map_err(GameplanError::io("create_dir_all", &destination))?;
        ensure_empty(&destination).await?;

        tokio::fs::create_dir_all(&config.temporary_directory)
            .await
            .map_err(GameplanError::io("create_dir_all", &config.temporary_directory))?;
        let source = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempdir_in(&config.temporary_directory)
            .map_err(GameplanError::io("tempdir", &config.temporary_directory))?;
        let source_path = source.path().to_path_buf();
        tracing::debug!("Using temporary source directory {}", source_path.display());

        let result = self.run_in(config, &source_path, &destination).await;

        if let Err(err) = source.close() {
            tracing::warn!(
                "Failed to remove temporary directory {}: {}",
                source_path.display(),
                err
            );
        }

        match result {
            Ok(executed) => {
                tracing::info!(
                    "Gameplan finished: {} operations in {}",
                    executed,
                    destination.display()
                );
                Ok(destination)
            }
            Err(err) => {
                tracing::debug!("Gameplan failed: {}", err);
                Err(err)
            }
        }
    }

    async fn run_in(
        &self,
        config: &RunConfig,
        source: &Path,
        destination: &Path,
    ) -> Result<usize, GameplanError> {
        self.source_control
            .clone_shallow(&config.repo, source)
            .await?;

        let gameplan = self.loader.load(source).await?;

        let raw = gameplan.options(&OptionsContext::new(destination))?;
        let definitions = validate_definitions(&raw)?;
        let mut options = parse_arguments(&definitions, &config.args, &config.repo)?;
        if config.prompt {
            options = prompt_for_options(&definitions, options, self.prompter.as_ref()).await?;
        }
        tracing::info!("Resolved {} options", options.len());

        let mut operations = Operations::new(source, destination);
        gameplan.run(&options, &mut operations).await?;
        tracing::info!("Executing {} operations", operations.len());

        execute_all(operations.into_queue(), destination, self.spawner.as_ref()).await
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator").finish_non_exhaustive()
    }
}

/// Run a gameplan with the default collaborators
///
/// # Errors
/// See [`Orchestrator::run`].
pub async fn run(config: &RunConfig) -> Result<PathBuf, GameplanError> {
    Orchestrator::new().run(config).await
}

fn absolute(path: &Path) -> Result<PathBuf, GameplanError> {
    if path.is_absolute() {
        return Ok(normalize(path));
    }
    let cwd = std::env::current_dir().map_err(GameplanError::io("current_dir", path))?;
    Ok(normalize(&cwd.join(path)))
}

/// Fail unless `directory` has no entries
async fn ensure_empty(directory: &Path) -> Result<(), GameplanError> {
    let mut entries = tokio::fs::read_dir(directory)
        .await
        .map_err(GameplanError::io("read_dir", directory))?;
    let first = entries
        .next_entry()
        .await
        .map_err(GameplanError::io("read_dir", directory))?;

    if first.is_some() {
        return Err(GameplanError::DirectoryNotEmpty {
            directory: directory.to_path_buf(),
        });
    }
    Ok(())
}
