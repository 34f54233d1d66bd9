//! Option definitions declared by a gameplan module

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Resolved option values, keyed by option name, in declaration order
pub type OptionSet = Map<String, Value>;

/// Option definitions keyed by option name, in declaration order
pub type OptionDefinitions = IndexMap<String, OptionDefinition>;

/// Value type of an option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    String,
    Boolean,
}

/// A single configurable parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionDefinition {
    #[serde(rename = "type")]
    pub kind: OptionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Question text, preferred over `description` when prompting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Allowed values (string options only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    pub default: Value,
}

impl OptionDefinition {
    /// String option with a default
    #[must_use]
    pub fn string(default: impl Into<String>) -> Self {
        Self {
            kind: OptionType::String,
            description: None,
            prompt: None,
            choices: None,
            default: Value::String(default.into()),
        }
    }

    /// Boolean option with a default
    #[must_use]
    pub fn boolean(default: bool) -> Self {
        Self {
            kind: OptionType::Boolean,
            description: None,
            prompt: None,
            choices: None,
            default: Value::Bool(default),
        }
    }

    /// With description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// With prompt text
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// With choices
    #[must_use]
    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    /// Choices that apply to this option (ignored for booleans)
    #[must_use]
    pub fn effective_choices(&self) -> Option<&[String]> {
        match self.kind {
            OptionType::String => self.choices.as_deref(),
            OptionType::Boolean => None,
        }
    }
}

/// Option set holding every definition's default
#[must_use]
pub fn defaults(definitions: &OptionDefinitions) -> OptionSet {
    definitions
        .iter()
        .map(|(name, definition)| (name.clone(), definition.default.clone()))
        .collect()
}
