//! User-facing messages

use gameplan_core::GameplanError;
use std::path::Path;

/// Lines printed after a successful run
pub(crate) fn success(cwd: &Path, destination: &Path) -> Vec<String> {
    let mut lines = vec!["Done!".to_string()];
    if destination != cwd {
        let relative = destination
            .strip_prefix(cwd)
            .map_or_else(|_| destination.to_path_buf(), Path::to_path_buf);
        lines.push(String::new());
        lines.push("Now run:".to_string());
        lines.push(format!("  cd {}", relative.display()));
    }
    lines
}

/// Diagnostic lines for a failed run
pub(crate) fn diagnostic(err: &GameplanError) -> Vec<String> {
    let mut lines = match err {
        GameplanError::DirectoryNotEmpty { directory } => vec![format!(
            "{} is not empty; choose a new or empty folder",
            directory.display()
        )],
        GameplanError::InvalidOptionDefinitions { errors } => {
            let mut lines = vec!["The gameplan declares invalid options:".to_string()];
            lines.extend(errors.iter().map(|error| format!("  - {error}")));
            lines
        }
        GameplanError::OutOfBoundsFile {
            directory,
            filepath,
        } => vec![format!(
            "The gameplan tried to use {}, which is outside of {}",
            filepath.display(),
            directory.display()
        )],
        GameplanError::Spawn(spawn) => {
            let mut lines = vec![spawn.to_string()];
            let stderr = spawn.stderr_lossy();
            lines.extend(
                stderr
                    .lines()
                    .filter(|line| !line.trim().is_empty())
                    .map(|line| format!("  {line}")),
            );
            if let Some(cwd) = &spawn.options.cwd {
                lines.push(format!("  (in {})", cwd.display()));
            }
            lines
        }
        other => vec![other.to_string()],
    };

    if err.is_module_fault() {
        lines.push("This is a problem with the gameplan, not with your input.".to_string());
    }
    lines
        .into_iter()
        .enumerate()
        .map(|(index, line)| if index == 0 { format!("Error: {line}") } else { line })
        .collect()
}
