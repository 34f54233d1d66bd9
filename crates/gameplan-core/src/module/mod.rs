//! Gameplan module contract
//!
//! A module is untrusted. It only sees the capabilities handed to it: an
//! [`OptionsContext`] when declaring options, then the resolved options and
//! an [`Operations`] recorder when running. Everything it records is checked
//! and executed by the orchestrator afterwards.

pub mod manifest;

pub use manifest::{ManifestGameplan, ManifestLoader, MANIFEST_FILES};

use crate::error::GameplanError;
use crate::operations::Operations;
use crate::options::OptionSet;
use crate::template::Variables;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Context passed to a module's `options` hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionsContext {
    /// Absolute destination directory
    pub directory: PathBuf,
}

impl OptionsContext {
    /// Create context for a destination directory
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Final component of the destination directory
    #[must_use]
    pub fn directory_name(&self) -> String {
        self.directory
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Context as template variables (`directory`, `directoryName`)
    #[must_use]
    pub fn variables(&self) -> Variables {
        let mut variables = Variables::new();
        variables.insert(
            "directory".to_string(),
            Value::String(self.directory.to_string_lossy().into_owned()),
        );
        variables.insert(
            "directoryName".to_string(),
            Value::String(self.directory_name()),
        );
        variables
    }
}

/// A loaded gameplan module
#[async_trait]
pub trait Gameplan: Send + Sync {
    /// Raw option definitions, validated by the caller
    ///
    /// Modules without options keep the default empty mapping.
    ///
    /// # Errors
    /// Module-specific failures.
    fn options(&self, _context: &OptionsContext) -> Result<Value, GameplanError> {
        Ok(Value::Object(Map::new()))
    }

    /// Declare operations for the resolved options
    ///
    /// # Errors
    /// Declaration failures (sandbox, template variables) or module-specific
    /// failures. Nothing recorded is executed when this fails.
    async fn run(
        &self,
        options: &OptionSet,
        operations: &mut Operations,
    ) -> Result<(), GameplanError>;
}

/// Loads the module from a cloned source directory
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    /// Load the module rooted at `source`
    ///
    /// # Errors
    /// `ModuleNotFound`, `Manifest` or `InvalidRunMethod` depending on what
    /// the source directory holds.
    async fn load(&self, source: &Path) -> Result<Box<dyn Gameplan>, GameplanError>;
}
