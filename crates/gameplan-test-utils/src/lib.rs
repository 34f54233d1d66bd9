//! Testing utilities for the gameplan workspace
//!
//! In-code gameplans, fixture-backed source control, scripted prompting and
//! directory tree helpers.

#![allow(missing_docs)]

use async_trait::async_trait;
use gameplan_core::module::{Gameplan, ModuleLoader, OptionsContext};
use gameplan_core::prompt::{Answers, Prompter, Question};
use gameplan_core::{GameplanError, OptionSet, Operations, SourceControl};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

type RunFn = dyn Fn(&OptionSet, &mut Operations) -> Result<(), GameplanError> + Send + Sync;

/// Gameplan defined by a closure
#[derive(Clone)]
pub struct FnGameplan {
    options: Option<Value>,
    run: Arc<RunFn>,
}

impl FnGameplan {
    pub fn new<F>(run: F) -> Self
    where
        F: Fn(&OptionSet, &mut Operations) -> Result<(), GameplanError> + Send + Sync + 'static,
    {
        Self {
            options: None,
            run: Arc::new(run),
        }
    }

    /// With raw option definitions
    #[must_use]
    pub fn with_options(mut self, options: Value) -> Self {
        self.options = Some(options);
        self
    }

    /// Loader handing out this gameplan
    #[must_use]
    pub fn loader(self) -> Arc<dyn ModuleLoader> {
        Arc::new(FnLoader(self))
    }
}

#[async_trait]
impl Gameplan for FnGameplan {
    fn options(&self, _context: &OptionsContext) -> Result<Value, GameplanError> {
        Ok(self
            .options
            .clone()
            .unwrap_or_else(|| Value::Object(Map::new())))
    }

    async fn run(
        &self,
        options: &OptionSet,
        operations: &mut Operations,
    ) -> Result<(), GameplanError> {
        (self.run)(options, operations)
    }
}

struct FnLoader(FnGameplan);

#[async_trait]
impl ModuleLoader for FnLoader {
    async fn load(&self, _source: &Path) -> Result<Box<dyn Gameplan>, GameplanError> {
        Ok(Box::new(self.0.clone()))
    }
}

/// Source control that copies a local fixture directory instead of cloning
pub struct DirectorySource {
    fixture: PathBuf,
    clones: Mutex<Vec<String>>,
}

impl DirectorySource {
    pub fn new(fixture: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            fixture: fixture.into(),
            clones: Mutex::new(Vec::new()),
        })
    }

    /// Repositories "cloned" so far
    pub fn clones(&self) -> Vec<String> {
        self.clones.lock().clone()
    }
}

#[async_trait]
impl SourceControl for DirectorySource {
    async fn clone_shallow(&self, repo: &str, destination: &Path) -> Result<(), GameplanError> {
        self.clones.lock().push(repo.to_string());
        copy_tree(&self.fixture, destination).map_err(GameplanError::io("copy_tree", &self.fixture))
    }
}

/// Prompter answering from a fixed map, recording the questions asked
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: Answers,
    asked: Mutex<Vec<Question>>,
}

impl ScriptedPrompter {
    pub fn new(answers: Value) -> Arc<Self> {
        let answers = match answers {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Arc::new(Self {
            answers,
            asked: Mutex::new(Vec::new()),
        })
    }

    pub fn asked(&self) -> Vec<Question> {
        self.asked.lock().clone()
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn prompt(&self, questions: &[Question]) -> Result<Answers, GameplanError> {
        self.asked.lock().extend_from_slice(questions);
        Ok(questions
            .iter()
            .filter_map(|question| {
                self.answers
                    .get(&question.name)
                    .map(|answer| (question.name.clone(), answer.clone()))
            })
            .collect())
    }
}

/// Recursively copy `from` into `to`, skipping `.git`
pub fn copy_tree(from: &Path, to: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(to)?;
    for entry in std::fs::read_dir(from)? {
        let entry = entry?;
        if entry.file_name() == ".git" {
            continue;
        }
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Every file under `root`, keyed by `/`-separated relative path
pub fn read_tree(root: &Path) -> BTreeMap<String, String> {
    let mut tree = BTreeMap::new();
    collect_tree(root, root, &mut tree);
    tree
}

fn collect_tree(root: &Path, dir: &Path, tree: &mut BTreeMap<String, String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tree(root, &path, tree);
            continue;
        }
        let relative = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let contents = std::fs::read(&path).unwrap_or_default();
        tree.insert(relative, String::from_utf8_lossy(&contents).into_owned());
    }
}

/// Entries left in `tmp` by runs (temporary source directories)
pub fn leftover_sources(tmp: &Path) -> Vec<String> {
    std::fs::read_dir(tmp)
        .map(|entries| {
            entries
                .flatten()
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .filter(|name| name.starts_with(gameplan_core::orchestrator::TEMP_PREFIX))
                .collect()
        })
        .unwrap_or_default()
}

pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success())
}

/// Turn `dir` into a git repository with everything committed
pub fn init_git_repo(dir: &Path) -> Result<(), String> {
    let steps: [&[&str]; 3] = [
        &["init", "--quiet"],
        &["add", "--all"],
        &[
            "-c",
            "user.name=gameplan",
            "-c",
            "user.email=gameplan@example.com",
            "-c",
            "commit.gpgsign=false",
            "commit",
            "--quiet",
            "-m",
            "fixture",
        ],
    ];
    for args in steps {
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .map_err(|err| err.to_string())?;
        if !output.status.success() {
            return Err(String::from_utf8_lossy(&output.stderr).into_owned());
        }
    }
    Ok(())
}
