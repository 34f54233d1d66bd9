//! Gameplan Core - project scaffolding from gameplan repositories
//!
//! A gameplan is a repository that declares options and a list of file and
//! process operations. This crate:
//! - Clones the gameplan into a temporary source directory
//! - Validates, parses and (optionally) prompts for its options
//! - Records its operations with every path sandboxed to its root
//! - Executes the operations in declaration order into the destination
//!
//! # Example
//!
//! ```rust,ignore
//! use gameplan_core::{Orchestrator, RunConfig};
//!
//! # async fn example() -> Result<(), gameplan_core::GameplanError> {
//! let config = RunConfig::new("https://github.com/acme/node-gameplan", "my-app")
//!     .with_args(["--name", "my-app"]);
//! let destination = Orchestrator::new().run(&config).await?;
//!
//! println!("Generated {}", destination.display());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod git;
pub mod module;
pub mod operations;
pub mod options;
pub mod orchestrator;
pub mod process;
pub mod prompt;
pub mod sandbox;
pub mod template;

pub use config::RunConfig;
pub use error::GameplanError;
pub use git::{GitCli, SourceControl};
pub use module::{Gameplan, ManifestGameplan, ManifestLoader, ModuleLoader, OptionsContext};
pub use operations::{execute_all, Operation, Operations};
pub use options::{OptionDefinition, OptionDefinitions, OptionSet, OptionType};
pub use orchestrator::{run, Orchestrator};
pub use process::{ProcessSpawner, SpawnError, SpawnOptions, SpawnOutput, Spawner, Stdio};
pub use prompt::{Answers, Prompter, Question, QuestionKind, TerminalPrompter};
pub use sandbox::{resolve, Segments};
pub use template::{render, Variables};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for writing and running gameplans
    pub use crate::{
        Gameplan, GameplanError, ModuleLoader, OptionSet, Operations, Orchestrator, RunConfig,
        Segments,
    };
    pub use async_trait::async_trait;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
