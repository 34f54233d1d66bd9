//! Source control collaborator
//!
//! Gameplan repositories are fetched with a depth-1 clone. Output is captured
//! so a failed clone reports git's own diagnostics through [`SpawnError`].
//!
//! [`SpawnError`]: crate::process::SpawnError

use crate::error::GameplanError;
use crate::process::{ProcessSpawner, SpawnOptions, Spawner};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Fetches a gameplan repository into a local directory
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Shallow-clone `repo` into the existing, empty `destination`
    ///
    /// # Errors
    /// Any failure of the clone is fatal for the run.
    async fn clone_shallow(&self, repo: &str, destination: &Path) -> Result<(), GameplanError>;
}

/// [`SourceControl`] that shells out to the `git` executable
#[derive(Clone)]
pub struct GitCli {
    spawner: Arc<dyn Spawner>,
}

impl GitCli {
    /// Create with the default process spawner
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_spawner(Arc::new(ProcessSpawner::new()))
    }

    /// Create with custom spawner
    #[inline]
    #[must_use]
    pub fn with_spawner(spawner: Arc<dyn Spawner>) -> Self {
        Self { spawner }
    }

    /// Arguments passed to `git` for a shallow clone
    #[must_use]
    pub fn clone_args(repo: &str, destination: &Path) -> Vec<String> {
        vec![
            "clone".to_string(),
            "--depth=1".to_string(),
            repo.to_string(),
            destination.to_string_lossy().into_owned(),
        ]
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GitCli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitCli").finish_non_exhaustive()
    }
}

#[async_trait]
impl SourceControl for GitCli {
    async fn clone_shallow(&self, repo: &str, destination: &Path) -> Result<(), GameplanError> {
        tracing::info!("Cloning {} into {}", repo, destination.display());
        self.spawner
            .spawn("git", &Self::clone_args(repo, destination), &SpawnOptions::captured())
            .await?;
        Ok(())
    }
}
