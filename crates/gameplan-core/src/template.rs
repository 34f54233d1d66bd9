//! Template renderer
//!
//! Single-pass `{{name}}` substitution. Every placeholder must have a
//! variable; there is no escaping, no recursion and no control flow.

use crate::error::GameplanError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Variables available to a template
pub type Variables = Map<String, Value>;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([^}]+)\}\}").expect("placeholder pattern is valid"));

/// Render `contents`, substituting every placeholder
///
/// # Errors
/// `GameplanError::UndefinedTemplateVariable` for the first placeholder with
/// no variable; nothing is returned in that case.
pub fn render(contents: &str, variables: &Variables) -> Result<String, GameplanError> {
    let mut rendered = String::with_capacity(contents.len());
    let mut last = 0;

    for placeholder in PLACEHOLDER.find_iter(contents) {
        let token = placeholder.as_str();
        let name = &token[2..token.len() - 2];
        let value = variables
            .get(name)
            .ok_or_else(|| GameplanError::UndefinedTemplateVariable(name.to_string()))?;

        rendered.push_str(&contents[last..placeholder.start()]);
        rendered.push_str(&stringify(value));
        last = placeholder.end();
    }

    rendered.push_str(&contents[last..]);
    Ok(rendered)
}

/// Name of the placeholder if `contents` is exactly one placeholder
#[must_use]
pub fn sole_placeholder(contents: &str) -> Option<&str> {
    let found = PLACEHOLDER.find(contents)?;
    if found.start() == 0 && found.end() == contents.len() {
        Some(&contents[2..contents.len() - 2])
    } else {
        None
    }
}

/// Check if `contents` still carries placeholder syntax
#[inline]
#[must_use]
pub fn has_placeholders(contents: &str) -> bool {
    PLACEHOLDER.is_match(contents)
}

/// Text substituted for a variable value
///
/// Strings are inserted verbatim; other values as their JSON text.
#[must_use]
pub fn stringify(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(text) => Cow::Borrowed(text),
        other => Cow::Owned(other.to_string()),
    }
}
