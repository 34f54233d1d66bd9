//! Path sandbox
//!
//! Every path a gameplan module references is a [`Segments`] value resolved
//! against exactly one root: the temporary source directory for reads or the
//! destination directory for writes. Resolution is lexical, so containment is
//! decided before anything touches the filesystem.

use crate::error::GameplanError;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Path segments, possibly nested
///
/// # Examples
/// - `"package.json"` → `package.json`
/// - `["src", ["lib", "index.js"]]` → `src/lib/index.js`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segments {
    One(String),
    Many(Vec<Segments>),
}

impl Segments {
    /// Flatten nested arrays into an ordered sequence of segments
    #[must_use]
    pub fn flatten(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::One(segment) => out.push(segment),
            Self::Many(items) => {
                for item in items {
                    item.flatten_into(out);
                }
            }
        }
    }

    /// Flatten into owned strings (process arguments)
    #[must_use]
    pub fn into_strings(self) -> Vec<String> {
        match self {
            Self::One(segment) => vec![segment],
            Self::Many(items) => items.into_iter().flat_map(Self::into_strings).collect(),
        }
    }

    /// Rewrite every leaf segment, keeping the nesting
    ///
    /// # Errors
    /// Propagates the first error returned by `f`.
    pub fn try_map<E>(&self, f: &impl Fn(&str) -> Result<String, E>) -> Result<Self, E> {
        match self {
            Self::One(segment) => f(segment).map(Self::One),
            Self::Many(items) => items
                .iter()
                .map(|item| item.try_map(f))
                .collect::<Result<_, _>>()
                .map(Self::Many),
        }
    }
}

impl Default for Segments {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl From<&str> for Segments {
    fn from(segment: &str) -> Self {
        Self::One(segment.to_string())
    }
}

impl From<String> for Segments {
    fn from(segment: String) -> Self {
        Self::One(segment)
    }
}

impl<T: Into<Segments>> From<Vec<T>> for Segments {
    fn from(items: Vec<T>) -> Self {
        Self::Many(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Segments>, const N: usize> From<[T; N]> for Segments {
    fn from(items: [T; N]) -> Self {
        Self::Many(items.into_iter().map(Into::into).collect())
    }
}

/// Resolve `segments` against `root`, rejecting anything outside of it
///
/// Segments are joined with `/`, so only a leading absolute segment restarts
/// from the filesystem root. `.` and `..` are applied lexically. A relative
/// root is taken from the current directory first.
///
/// # Errors
/// - `GameplanError::OutOfBoundsFile` carrying the root and the attempted
///   absolute path
/// - `GameplanError::Io` if a relative root cannot be made absolute
pub fn resolve(root: &Path, segments: &Segments) -> Result<PathBuf, GameplanError> {
    let joined = segments.flatten().join("/");
    let root = if root.is_absolute() {
        normalize(root)
    } else {
        let cwd = std::env::current_dir().map_err(GameplanError::io("current_dir", root))?;
        normalize(&cwd.join(root))
    };
    let absolute = normalize(&root.join(joined));

    if !absolute.starts_with(&root) {
        return Err(GameplanError::OutOfBoundsFile {
            directory: root,
            filepath: absolute,
        });
    }
    Ok(absolute)
}

/// Lexically normalize a path: drop `.`, apply `..`
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
