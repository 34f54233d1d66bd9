//! End-to-end runs of fixture gameplans.
//!
//! Each fixture under `tests/fixtures/sources` is "cloned" by copying it into
//! the temporary source directory, then run through the real manifest
//! loader, option pipeline and executor.
//!
//! Guarantees exercised here:
//! - A valid gameplan produces exactly the reference tree.
//! - Declaration failures (sandbox, template variables, options, missing
//!   run) abort before any operation executes.
//! - Operations execute strictly in declaration order and stop at the
//!   first failure.
//! - The temporary source directory never outlives a run.

use gameplan_core::{GameplanError, Orchestrator, RunConfig};
use gameplan_test_utils::{leftover_sources, read_tree, DirectorySource, ScriptedPrompter};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

fn source(name: &str) -> PathBuf {
    fixtures().join("sources").join(name)
}

/// Scratch workspace with separate destination and temporary roots
struct Scratch {
    work: TempDir,
    tmp: TempDir,
}

impl Scratch {
    fn new() -> Self {
        Self {
            work: tempfile::tempdir().unwrap(),
            tmp: tempfile::tempdir().unwrap(),
        }
    }

    fn destination(&self, name: &str) -> PathBuf {
        self.work.path().join(name)
    }

    fn config(&self, name: &str) -> RunConfig {
        RunConfig::new(format!("fixtures/{name}"), self.destination(name))
            .with_temporary_directory(self.tmp.path())
    }
}

async fn run_fixture(fixture: &str, config: &RunConfig) -> Result<PathBuf, GameplanError> {
    Orchestrator::new()
        .with_source_control(DirectorySource::new(source(fixture)))
        .run(config)
        .await
}

/// A gameplan with a templated file, a copied file and emitted JSON
/// produces the reference tree, with `name` defaulting to the folder name.
#[tokio::test]
async fn base_gameplan_matches_snapshot() {
    let scratch = Scratch::new();
    let config = scratch.config("test1");

    let destination = run_fixture("base-gameplan", &config).await.unwrap();

    assert_eq!(destination, scratch.destination("test1"));
    assert_eq!(
        read_tree(&destination),
        read_tree(&fixtures().join("snapshots").join("basic"))
    );
    assert!(leftover_sources(scratch.tmp.path()).is_empty());
}

/// Command-line arguments override option defaults.
#[tokio::test]
async fn arguments_override_defaults() {
    let scratch = Scratch::new();
    let config = scratch.config("test1").with_args(["--name", "renamed"]);

    let destination = run_fixture("base-gameplan", &config).await.unwrap();

    assert_eq!(
        std::fs::read_to_string(destination.join("foo/testfile.txt")).unwrap(),
        "Hello renamed!\n"
    );
}

/// Unknown gameplan arguments are rejected before anything is written.
#[tokio::test]
async fn unknown_arguments_are_rejected() {
    let scratch = Scratch::new();
    let config = scratch.config("test1").with_args(["--nope"]);

    let err = run_fixture("base-gameplan", &config).await.unwrap_err();

    assert!(matches!(err, GameplanError::ModuleArguments(_)));
    assert!(read_tree(&scratch.destination("test1")).is_empty());
    assert!(leftover_sources(scratch.tmp.path()).is_empty());
}

/// Every option resolves to its default, with `{{directory}}` rendered.
#[tokio::test]
async fn option_defaults_are_emitted() {
    let scratch = Scratch::new();
    let config = scratch.config("opts");

    let destination = run_fixture("lots-of-options", &config).await.unwrap();

    let emitted: Value =
        serde_json::from_str(&std::fs::read_to_string(destination.join("options.json")).unwrap())
            .unwrap();
    assert_eq!(
        emitted,
        json!({
            "directory": destination.to_string_lossy(),
            "choice": "hello",
            "boolean": false,
        })
    );
    assert!(!destination.join("boolean-was-set").exists());
}

/// Prompt answers win over argument values; questions follow declaration
/// order and carry the current values as defaults.
#[cfg(unix)]
#[tokio::test]
async fn prompt_answers_are_merged() {
    let scratch = Scratch::new();
    let prompter = ScriptedPrompter::new(json!({"choice": "bar", "boolean": true}));
    let config = scratch
        .config("opts")
        .with_args(["--choice", "foo"])
        .with_prompt(true);

    let destination = Orchestrator::new()
        .with_source_control(DirectorySource::new(source("lots-of-options")))
        .with_prompter(prompter.clone())
        .run(&config)
        .await
        .unwrap();

    let asked = serde_json::to_value(prompter.asked()).unwrap();
    assert_eq!(
        asked,
        json!([
            {"type": "string", "name": "directory", "default": destination.to_string_lossy(), "message": "The directory"},
            {"type": "list", "name": "choice", "default": "foo", "choices": ["foo", "bar", "hello"], "message": "Pick one"},
            {"type": "confirm", "name": "boolean", "default": false, "message": "boolean:"},
        ])
    );

    let emitted: Value =
        serde_json::from_str(&std::fs::read_to_string(destination.join("options.json")).unwrap())
            .unwrap();
    assert_eq!(emitted["choice"], json!("bar"));
    assert_eq!(emitted["boolean"], json!(true));
    assert!(destination.join("boolean-was-set").exists());
}

/// Schema violations are reported all at once.
#[tokio::test]
async fn invalid_option_definitions() {
    let scratch = Scratch::new();

    let err = run_fixture("invalid-options", &scratch.config("x"))
        .await
        .unwrap_err();

    match err {
        GameplanError::InvalidOptionDefinitions { errors } => {
            assert_eq!(errors.len(), 1, "{errors:?}");
            assert!(errors[0].starts_with("/boolean/type"), "{errors:?}");
        }
        other => panic!("expected invalid option definitions, got {other:?}"),
    }
    assert!(leftover_sources(scratch.tmp.path()).is_empty());
}

#[tokio::test]
async fn manifest_without_run() {
    let scratch = Scratch::new();
    let err = run_fixture("no-run", &scratch.config("x")).await.unwrap_err();
    assert!(matches!(err, GameplanError::InvalidRunMethod));
}

#[tokio::test]
async fn repository_without_manifest() {
    let scratch = Scratch::new();
    let err = run_fixture("no-manifest", &scratch.config("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, GameplanError::ModuleNotFound { .. }));
    assert!(leftover_sources(scratch.tmp.path()).is_empty());
}

/// A path escaping the source root fails at declaration: the operation
/// declared before it never executes either.
#[tokio::test]
async fn out_of_bounds_copy() {
    let scratch = Scratch::new();

    let err = run_fixture("out-of-bounds", &scratch.config("x"))
        .await
        .unwrap_err();

    match err {
        GameplanError::OutOfBoundsFile { filepath, .. } => {
            assert!(filepath.ends_with("etc/passwd"), "{}", filepath.display());
        }
        other => panic!("expected out of bounds, got {other:?}"),
    }
    assert!(read_tree(&scratch.destination("x")).is_empty());
    assert!(leftover_sources(scratch.tmp.path()).is_empty());
}

#[tokio::test]
async fn template_variables_not_an_object() {
    let scratch = Scratch::new();
    let err = run_fixture("invalid-template-call", &scratch.config("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, GameplanError::TemplateVariablesNotObject));
    assert!(read_tree(&scratch.destination("x")).is_empty());
}

#[tokio::test]
async fn template_with_unknown_variable_writes_nothing() {
    let scratch = Scratch::new();
    let err = run_fixture("template-unknown-variables", &scratch.config("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, GameplanError::UndefinedTemplateVariable(name) if name == "missing"));
    assert!(read_tree(&scratch.destination("x")).is_empty());
}

/// A failing spawn stops the queue and forwards the child's exit code.
#[cfg(unix)]
#[tokio::test]
async fn spawn_failure_stops_the_queue() {
    let scratch = Scratch::new();

    let err = run_fixture("spawn-error", &scratch.config("x"))
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), 3);
    match &err {
        GameplanError::Spawn(spawn) => {
            assert_eq!(spawn.command, "sh");
            assert_eq!(spawn.options.cwd.as_deref(), Some(scratch.destination("x").as_path()));
        }
        other => panic!("expected spawn error, got {other:?}"),
    }
    let tree = read_tree(&scratch.destination("x"));
    assert_eq!(tree.keys().collect::<Vec<_>>(), vec!["first.json"]);
    assert!(leftover_sources(scratch.tmp.path()).is_empty());
}

/// copy(A), spawn(B), template(C): the spawned process sees A but not C.
#[cfg(unix)]
#[tokio::test]
async fn operations_run_in_declaration_order() {
    let scratch = Scratch::new();

    let destination = run_fixture("ordered", &scratch.config("x")).await.unwrap();

    let tree = read_tree(&destination);
    assert_eq!(tree.keys().collect::<Vec<_>>(), vec!["A", "B", "C"]);
}

/// A destination that already has entries is refused.
#[tokio::test]
async fn non_empty_destination() {
    let scratch = Scratch::new();
    std::fs::create_dir_all(scratch.destination("x")).unwrap();
    std::fs::write(scratch.destination("x").join("keep.txt"), "keep").unwrap();
    let source = DirectorySource::new(source("base-gameplan"));

    let err = Orchestrator::new()
        .with_source_control(source.clone())
        .run(&scratch.config("x"))
        .await
        .unwrap_err();

    assert!(matches!(err, GameplanError::DirectoryNotEmpty { .. }));
    assert!(source.clones().is_empty());
    assert_eq!(
        std::fs::read_to_string(scratch.destination("x").join("keep.txt")).unwrap(),
        "keep"
    );
}

/// An existing empty destination is accepted.
#[tokio::test]
async fn existing_empty_destination() {
    let scratch = Scratch::new();
    std::fs::create_dir_all(scratch.destination("test1")).unwrap();

    let destination = run_fixture("base-gameplan", &scratch.config("test1"))
        .await
        .unwrap();
    assert!(destination.join("package.json").exists());
}
