//! Declarative gameplan manifests
//!
//! A manifest is a `gameplan.{json,yaml,yml,toml}` file at the repository
//! root with an optional `options` mapping and a `run` list of steps:
//!
//! ```json
//! {
//!   "options": { "name": { "type": "string", "default": "{{directoryName}}" } },
//!   "run": [
//!     { "template": { "from": "README.tmpl", "to": "README.md", "variables": { "name": "{{name}}" } } },
//!     { "copy": { "from": ["src", "index.js"], "to": ["src", "index.js"] } },
//!     { "json": { "value": { "name": "{{name}}" }, "to": "package.json" } },
//!     { "spawn": { "command": "git", "args": ["init"] }, "when": "git" }
//!   ]
//! }
//! ```
//!
//! Strings in `options` are rendered against the [`OptionsContext`]; strings
//! in steps against the resolved options. A string made of a single
//! placeholder takes the variable's value as-is, so `"{{flag}}"` stays a
//! boolean.

use super::{Gameplan, ModuleLoader, OptionsContext};
use crate::error::GameplanError;
use crate::operations::Operations;
use crate::options::OptionSet;
use crate::sandbox::Segments;
use crate::template::{render, sole_placeholder, Variables};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Manifest file names, in lookup order
pub const MANIFEST_FILES: [&str; 4] = [
    "gameplan.json",
    "gameplan.yaml",
    "gameplan.yml",
    "gameplan.toml",
];

/// Loads a [`ManifestGameplan`] from the repository root
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestLoader;

impl ManifestLoader {
    /// Create loader
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// First manifest file present in `source`
    ///
    /// # Errors
    /// `GameplanError::ModuleNotFound` if there is none.
    pub async fn locate(source: &Path) -> Result<PathBuf, GameplanError> {
        for name in MANIFEST_FILES {
            let candidate = source.join(name);
            let exists = tokio::fs::try_exists(&candidate)
                .await
                .map_err(GameplanError::io("stat", &candidate))?;
            if exists {
                return Ok(candidate);
            }
        }
        Err(GameplanError::ModuleNotFound {
            directory: source.to_path_buf(),
        })
    }
}

#[async_trait]
impl ModuleLoader for ManifestLoader {
    async fn load(&self, source: &Path) -> Result<Box<dyn Gameplan>, GameplanError> {
        let path = Self::locate(source).await?;
        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(GameplanError::io("read", &path))?;
        tracing::info!("Loading gameplan manifest {}", path.display());

        let gameplan = ManifestGameplan::parse(&path, &contents)?;
        Ok(Box::new(gameplan))
    }
}

/// Gameplan described by a manifest file
#[derive(Debug, Clone)]
pub struct ManifestGameplan {
    path: PathBuf,
    options: Option<Value>,
    steps: Vec<Step>,
}

impl ManifestGameplan {
    /// Parse manifest `contents`; the format follows the extension of `path`
    ///
    /// # Errors
    /// - `GameplanError::Manifest` for syntax errors or malformed steps
    /// - `GameplanError::InvalidRunMethod` when `run` is missing or not a list
    pub fn parse(path: impl Into<PathBuf>, contents: &str) -> Result<Self, GameplanError> {
        let path = path.into();
        let document = parse_document(&path, contents)?;
        let Value::Object(mut document) = document else {
            return Err(GameplanError::manifest(&path, "expected a mapping at the top level"));
        };

        let Some(Value::Array(raw_steps)) = document.remove("run") else {
            return Err(GameplanError::InvalidRunMethod);
        };
        let steps = raw_steps
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                Step::parse(raw).map_err(|message| {
                    GameplanError::manifest(&path, format!("run[{index}]: {message}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            path,
            options: document.remove("options"),
            steps,
        })
    }

    /// Manifest file this gameplan was read from
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of declared steps
    #[inline]
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    fn deserialize<T: DeserializeOwned>(&self, value: Value) -> Result<T, GameplanError> {
        serde_json::from_value(value)
            .map_err(|err| GameplanError::manifest(&self.path, err.to_string()))
    }
}

#[async_trait]
impl Gameplan for ManifestGameplan {
    fn options(&self, context: &OptionsContext) -> Result<Value, GameplanError> {
        match &self.options {
            Some(options) => render_value(options, &context.variables()),
            None => Ok(Value::Object(Map::new())),
        }
    }

    async fn run(
        &self,
        options: &OptionSet,
        operations: &mut Operations,
    ) -> Result<(), GameplanError> {
        for step in &self.steps {
            if let Some(condition) = &step.when {
                if !condition.holds(options)? {
                    tracing::debug!("Skipping {} step, condition not met", step.action.name());
                    continue;
                }
            }

            let body = render_value(&step.body, options)?;
            match step.action {
                Action::Copy => {
                    let CopyStep { from, to } = self.deserialize(body)?;
                    operations.copy(from, to)?;
                }
                Action::Template => {
                    let TemplateStep {
                        from,
                        to,
                        variables,
                    } = self.deserialize(body)?;
                    let variables = variables.unwrap_or_else(|| Value::Object(options.clone()));
                    operations.template(from, to, &variables)?;
                }
                Action::Json => {
                    let JsonStep {
                        value,
                        options: whole,
                        to,
                    } = self.deserialize(body)?;
                    match value {
                        Some(value) => operations.json(&value, to)?,
                        None if whole => operations.json(options, to)?,
                        None => {
                            return Err(GameplanError::manifest(
                                &self.path,
                                "json step needs a value or \"options\": true",
                            ))
                        }
                    }
                }
                Action::Spawn => {
                    let SpawnStep { command, args } = self.deserialize(body)?;
                    operations.spawn(command, args);
                }
            }
        }
        Ok(())
    }
}

fn parse_document(path: &Path, contents: &str) -> Result<Value, GameplanError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();

    let parsed = match extension {
        "yaml" | "yml" => serde_yaml::from_str::<Value>(contents).map_err(|err| err.to_string()),
        "toml" => toml::from_str::<Value>(contents).map_err(|err| err.to_string()),
        _ => serde_json::from_str::<Value>(contents).map_err(|err| err.to_string()),
    };
    parsed.map_err(|message| GameplanError::manifest(path, message))
}

/// Render every string in `value`
///
/// A string that is exactly one placeholder is replaced by the variable's
/// value, keeping its JSON type.
///
/// # Errors
/// `GameplanError::UndefinedTemplateVariable` for unknown placeholders.
pub fn render_value(value: &Value, variables: &Variables) -> Result<Value, GameplanError> {
    match value {
        Value::String(text) => match sole_placeholder(text) {
            Some(name) => variables
                .get(name)
                .cloned()
                .ok_or_else(|| GameplanError::UndefinedTemplateVariable(name.to_string())),
            None => render(text, variables).map(Value::String),
        },
        Value::Array(items) => items
            .iter()
            .map(|item| render_value(item, variables))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => map
            .iter()
            .map(|(key, item)| render_value(item, variables).map(|item| (key.clone(), item)))
            .collect::<Result<Map<_, _>, _>>()
            .map(Value::Object),
        other => Ok(other.clone()),
    }
}

/// JavaScript-like truthiness of an option value
#[must_use]
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Copy,
    Template,
    Json,
    Spawn,
}

impl Action {
    const ALL: [Self; 4] = [Self::Copy, Self::Template, Self::Json, Self::Spawn];

    fn name(self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Template => "template",
            Self::Json => "json",
            Self::Spawn => "spawn",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Condition {
    option: String,
    negated: bool,
}

impl Condition {
    fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.strip_prefix('!') {
            Some(option) => Self {
                option: option.trim().to_string(),
                negated: true,
            },
            None => Self {
                option: raw.to_string(),
                negated: false,
            },
        }
    }

    fn holds(&self, options: &OptionSet) -> Result<bool, GameplanError> {
        let value = options
            .get(&self.option)
            .ok_or_else(|| GameplanError::UndefinedTemplateVariable(self.option.clone()))?;
        Ok(truthy(value) != self.negated)
    }
}

#[derive(Debug, Clone)]
struct Step {
    action: Action,
    when: Option<Condition>,
    body: Value,
}

impl Step {
    fn parse(raw: Value) -> Result<Self, String> {
        let Value::Object(mut raw) = raw else {
            return Err("expected a mapping".to_string());
        };

        let when = match raw.remove("when") {
            None => None,
            Some(Value::String(condition)) => Some(Condition::parse(&condition)),
            Some(_) => return Err("\"when\" must be an option name".to_string()),
        };

        if let Some(unknown) = raw
            .keys()
            .find(|key| !Action::ALL.iter().any(|action| action.name() == key.as_str()))
        {
            return Err(format!("unknown key \"{unknown}\""));
        }
        let mut actions = raw.into_iter();
        let (Some((name, body)), None) = (actions.next(), actions.next()) else {
            return Err("expected exactly one of copy, template, json, spawn".to_string());
        };
        let action = Action::ALL
            .into_iter()
            .find(|action| action.name() == name)
            .ok_or_else(|| format!("unknown key \"{name}\""))?;

        // shape check only, strings are rendered at run time
        let checked = match action {
            Action::Copy => serde_json::from_value::<CopyStep>(body.clone()).map(drop),
            Action::Template => serde_json::from_value::<TemplateStep>(body.clone()).map(drop),
            Action::Json => serde_json::from_value::<JsonStep>(body.clone()).map(drop),
            Action::Spawn => serde_json::from_value::<SpawnStep>(body.clone()).map(drop),
        };
        checked.map_err(|err| format!("{}: {err}", action.name()))?;

        Ok(Self { action, when, body })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CopyStep {
    from: Segments,
    to: Segments,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TemplateStep {
    from: Segments,
    to: Segments,
    /// Defaults to the whole option set
    #[serde(default)]
    variables: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct JsonStep {
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    options: bool,
    to: Segments,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SpawnStep {
    command: String,
    /// Numbers and booleans become their JSON text
    #[serde(default, deserialize_with = "spawn_args")]
    args: Segments,
}

fn spawn_args<'de, D>(deserializer: D) -> Result<Segments, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Segments::default()),
        value => arg_segments(value).map_err(serde::de::Error::custom),
    }
}

fn arg_segments(value: Value) -> Result<Segments, String> {
    match value {
        Value::String(arg) => Ok(Segments::One(arg)),
        Value::Number(_) | Value::Bool(_) => Ok(Segments::One(value.to_string())),
        Value::Array(items) => items
            .into_iter()
            .map(arg_segments)
            .collect::<Result<_, _>>()
            .map(Segments::Many),
        other => Err(format!("invalid spawn argument {other}")),
    }
}
