//! Operation recorder and executor
//!
//! A gameplan module never touches the filesystem. It records [`Operation`]
//! values through [`Operations`]; paths are sandboxed and JSON is serialized
//! while recording, so a bad declaration fails before any side effect. The
//! orchestrator then drains the queue with [`execute_all`], one operation at
//! a time, in declaration order.

use crate::error::GameplanError;
use crate::process::{SpawnOptions, Spawner};
use crate::sandbox::{resolve, Segments};
use crate::template::{render, Variables};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// File mode for rendered templates and emitted JSON
pub const WRITE_MODE: u32 = 0o644;

/// A deferred unit of work
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Copy a source file verbatim
    Copy { from: PathBuf, to: PathBuf },
    /// Render a source template into the destination
    Render {
        from: PathBuf,
        to: PathBuf,
        variables: Variables,
    },
    /// Write JSON serialized at declaration time
    EmitJson { contents: String, to: PathBuf },
    /// Run a process in the destination directory
    Spawn { command: String, args: Vec<String> },
}

impl Operation {
    /// Short name used in logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Copy { .. } => "copy",
            Self::Render { .. } => "template",
            Self::EmitJson { .. } => "json",
            Self::Spawn { .. } => "spawn",
        }
    }

    /// Execute this operation
    ///
    /// # Errors
    /// Filesystem failures, template rendering failures, spawn failures.
    pub async fn execute(
        &self,
        destination: &Path,
        spawner: &dyn Spawner,
    ) -> Result<(), GameplanError> {
        match self {
            Self::Copy { from, to } => {
                create_parent(to).await?;
                tokio::fs::copy(from, to)
                    .await
                    .map_err(GameplanError::io("copy", from))?;
            }
            Self::Render {
                from,
                to,
                variables,
            } => {
                create_parent(to).await?;
                let contents = tokio::fs::read_to_string(from)
                    .await
                    .map_err(GameplanError::io("read", from))?;
                let rendered = render(&contents, variables)?;
                write_file(to, rendered.as_bytes()).await?;
            }
            Self::EmitJson { contents, to } => {
                create_parent(to).await?;
                write_file(to, contents.as_bytes()).await?;
            }
            Self::Spawn { command, args } => {
                spawner
                    .spawn(command, args, &SpawnOptions::inherited(destination))
                    .await?;
            }
        }
        Ok(())
    }
}

/// The `operations` capability handed to a gameplan module
///
/// Recording is synchronous and performs no I/O.
#[derive(Debug, Clone)]
pub struct Operations {
    source: PathBuf,
    destination: PathBuf,
    queue: Vec<Operation>,
}

impl Operations {
    /// Create recorder bound to a source and a destination root
    #[must_use]
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            queue: Vec::new(),
        }
    }

    /// Queue a verbatim copy from the source tree to the destination tree
    ///
    /// # Errors
    /// `GameplanError::OutOfBoundsFile` if either path leaves its root.
    pub fn copy(
        &mut self,
        from: impl Into<Segments>,
        to: impl Into<Segments>,
    ) -> Result<(), GameplanError> {
        let from = resolve(&self.source, &from.into())?;
        let to = resolve(&self.destination, &to.into())?;
        self.push(Operation::Copy { from, to });
        Ok(())
    }

    /// Queue a template render
    ///
    /// # Errors
    /// - `GameplanError::TemplateVariablesNotObject` if `variables` is not a
    ///   JSON object (checked first)
    /// - `GameplanError::OutOfBoundsFile` if either path leaves its root
    pub fn template(
        &mut self,
        from: impl Into<Segments>,
        to: impl Into<Segments>,
        variables: &Value,
    ) -> Result<(), GameplanError> {
        let variables = variables
            .as_object()
            .ok_or(GameplanError::TemplateVariablesNotObject)?
            .clone();
        let from = resolve(&self.source, &from.into())?;
        let to = resolve(&self.destination, &to.into())?;
        self.push(Operation::Render {
            from,
            to,
            variables,
        });
        Ok(())
    }

    /// Queue a JSON file, serialized now with two-space indentation
    ///
    /// # Errors
    /// - `GameplanError::OutOfBoundsFile` if `to` leaves the destination
    /// - `GameplanError::Json` if `value` cannot be serialized
    pub fn json<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
        to: impl Into<Segments>,
    ) -> Result<(), GameplanError> {
        let to = resolve(&self.destination, &to.into())?;
        let contents = serde_json::to_string_pretty(value)?;
        self.push(Operation::EmitJson { contents, to });
        Ok(())
    }

    /// Queue a process run in the destination directory
    pub fn spawn(&mut self, command: impl Into<String>, args: impl Into<Segments>) {
        self.push(Operation::Spawn {
            command: command.into(),
            args: args.into().into_strings(),
        });
    }

    /// Recorded operations in declaration order
    #[inline]
    #[must_use]
    pub fn queue(&self) -> &[Operation] {
        &self.queue
    }

    /// Number of recorded operations
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Check if nothing was recorded
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Source root (reads)
    #[inline]
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Destination root (writes)
    #[inline]
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Take the queue for execution
    #[inline]
    #[must_use]
    pub fn into_queue(self) -> Vec<Operation> {
        self.queue
    }

    fn push(&mut self, operation: Operation) {
        tracing::debug!("Recorded {} operation #{}", operation.kind(), self.queue.len() + 1);
        self.queue.push(operation);
    }
}

/// Execute `queue` in order, stopping at the first failure
///
/// Returns the number of operations executed.
///
/// # Errors
/// The first operation error, unmodified.
pub async fn execute_all(
    queue: Vec<Operation>,
    destination: &Path,
    spawner: &dyn Spawner,
) -> Result<usize, GameplanError> {
    let total = queue.len();
    for (index, operation) in queue.iter().enumerate() {
        tracing::debug!("Executing {} operation {}/{}", operation.kind(), index + 1, total);
        operation.execute(destination, spawner).await?;
    }
    Ok(total)
}

async fn create_parent(path: &Path) -> Result<(), GameplanError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(GameplanError::io("create_dir_all", parent))?;
    }
    Ok(())
}

async fn write_file(path: &Path, contents: &[u8]) -> Result<(), GameplanError> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(WRITE_MODE);

    let mut file = options
        .open(path)
        .await
        .map_err(GameplanError::io("open", path))?;
    file.write_all(contents)
        .await
        .map_err(GameplanError::io("write", path))?;
    file.flush().await.map_err(GameplanError::io("flush", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessSpawner;
    use serde_json::json;

    fn recorder() -> Operations {
        Operations::new("/tmp/gameplan-src", "/work/dest")
    }

    #[test]
    fn records_in_declaration_order() {
        let mut ops = recorder();
        ops.copy("a.txt", "a.txt").unwrap();
        ops.spawn("echo", ["hi"]);
        ops.template("b.tmpl", "b.txt", &json!({})).unwrap();
        ops.json(&json!({"x": 1}), "c.json").unwrap();

        let kinds: Vec<_> = ops.queue().iter().map(Operation::kind).collect();
        assert_eq!(kinds, vec!["copy", "spawn", "template", "json"]);
    }

    #[test]
    fn copy_resolves_against_both_roots() {
        let mut ops = recorder();
        ops.copy(["src", "index.js"], ["lib", "index.js"]).unwrap();
        assert_eq!(
            ops.queue()[0],
            Operation::Copy {
                from: PathBuf::from("/tmp/gameplan-src/src/index.js"),
                to: PathBuf::from("/work/dest/lib/index.js"),
            }
        );
    }

    #[test]
    fn copy_out_of_bounds_queues_nothing() {
        let mut ops = recorder();
        let err = ops.copy(["..", "..", "etc", "passwd"], ["x"]).unwrap_err();
        assert!(matches!(err, GameplanError::OutOfBoundsFile { .. }));
        assert!(ops.is_empty());
    }

    #[test]
    fn copy_destination_out_of_bounds() {
        let mut ops = recorder();
        let err = ops.copy("a.txt", ["..", "elsewhere"]).unwrap_err();
        match err {
            GameplanError::OutOfBoundsFile { directory, .. } => {
                assert_eq!(directory, PathBuf::from("/work/dest"));
            }
            other => panic!("expected out of bounds, got {other:?}"),
        }
    }

    #[test]
    fn template_rejects_non_object_variables_before_sandboxing() {
        let mut ops = recorder();
        for variables in [json!("name"), json!(["a"]), json!(null), json!(3)] {
            let err = ops
                .template(["..", "outside"], "x", &variables)
                .unwrap_err();
            assert!(matches!(err, GameplanError::TemplateVariablesNotObject));
        }
        assert!(ops.is_empty());
    }

    #[test]
    fn json_is_serialized_at_declaration() {
        let mut ops = recorder();
        let mut value = json!({"name": "before"});
        ops.json(&value, "package.json").unwrap();
        value["name"] = json!("after");

        match &ops.queue()[0] {
            Operation::EmitJson { contents, .. } => {
                assert_eq!(contents, "{\n  \"name\": \"before\"\n}");
            }
            other => panic!("expected json operation, got {other:?}"),
        }
    }

    #[test]
    fn spawn_flattens_nested_args() {
        let mut ops = recorder();
        ops.spawn(
            "node",
            vec![Segments::from("-e"), Segments::from(["a", "b"])],
        );
        assert_eq!(
            ops.queue()[0],
            Operation::Spawn {
                command: "node".to_string(),
                args: vec!["-e".to_string(), "a".to_string(), "b".to_string()],
            }
        );
    }

    #[tokio::test]
    async fn executes_writes_with_parent_directories() {
        let source = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        std::fs::write(source.path().join("greeting.tmpl"), "Hi {{who}}").unwrap();
        std::fs::write(source.path().join("raw.bin"), [0u8, 159, 146, 150]).unwrap();

        let mut ops = Operations::new(source.path(), dest.path());
        ops.template("greeting.tmpl", ["deep", "greeting.txt"], &json!({"who": "you"}))
            .unwrap();
        ops.copy("raw.bin", ["bin", "raw.bin"]).unwrap();
        ops.json(&json!({"ok": true}), ["meta", "info.json"]).unwrap();

        let executed = execute_all(ops.into_queue(), dest.path(), &ProcessSpawner::new())
            .await
            .unwrap();

        assert_eq!(executed, 3);
        assert_eq!(
            std::fs::read_to_string(dest.path().join("deep/greeting.txt")).unwrap(),
            "Hi you"
        );
        assert_eq!(
            std::fs::read(dest.path().join("bin/raw.bin")).unwrap(),
            vec![0u8, 159, 146, 150]
        );
        assert_eq!(
            std::fs::read_to_string(dest.path().join("meta/info.json")).unwrap(),
            "{\n  \"ok\": true\n}"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn written_files_use_write_mode() {
        use std::os::unix::fs::PermissionsExt;

        let source = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        let mut ops = Operations::new(source.path(), dest.path());
        ops.json(&json!([]), "out.json").unwrap();
        execute_all(ops.into_queue(), dest.path(), &ProcessSpawner::new())
            .await
            .unwrap();

        let mode = std::fs::metadata(dest.path().join("out.json"))
            .unwrap()
            .permissions()
            .mode();
        // umask may only clear bits
        assert_eq!(mode & 0o777 & !WRITE_MODE, 0);
    }

    #[tokio::test]
    async fn undefined_variable_writes_nothing() {
        let source = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        std::fs::write(source.path().join("t.tmpl"), "{{missing}}").unwrap();

        let mut ops = Operations::new(source.path(), dest.path());
        ops.template("t.tmpl", "t.txt", &json!({"present": "x"})).unwrap();

        let err = execute_all(ops.into_queue(), dest.path(), &ProcessSpawner::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GameplanError::UndefinedTemplateVariable(_)));
        assert!(!dest.path().join("t.txt").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn first_failure_stops_the_queue() {
        let source = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();

        let mut ops = Operations::new(source.path(), dest.path());
        ops.json(&json!(1), "before.json").unwrap();
        ops.spawn("sh", ["-c", "exit 4"]);
        ops.json(&json!(2), "after.json").unwrap();

        let err = execute_all(ops.into_queue(), dest.path(), &ProcessSpawner::new())
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(dest.path().join("before.json").exists());
        assert!(!dest.path().join("after.json").exists());
    }
}
