//! Option definition schema
//!
//! A module's option definitions are untrusted. They are checked against a
//! fixed JSON schema with every violation collected before anything is
//! deserialized. Names must also be usable as `--name` flags: the schema
//! restricts their characters and reserves `help`, and `name_violations`
//! rejects a name shadowing another boolean's `--no-` form.

use super::definition::{OptionDefinitions, OptionType};
use crate::error::GameplanError;
use jsonschema::{Draft, JSONSchema};
use once_cell::sync::Lazy;
use serde_json::{json, Value};

/// JSON schema every option definition mapping must satisfy
pub static OPTION_DEFINITIONS_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "propertyNames": {
            "pattern": "^[A-Za-z0-9_][A-Za-z0-9_.-]*$",
            "not": { "enum": ["help"] }
        },
        "additionalProperties": {
            "type": "object",
            "required": ["type", "default"],
            "additionalProperties": false,
            "properties": {
                "type": {
                    "type": "string",
                    "enum": ["string", "boolean"]
                },
                "description": { "type": "string" },
                "prompt": { "type": "string" },
                "choices": {
                    "type": "array",
                    "items": { "type": "string" }
                },
                "default": {}
            }
        }
    })
});

/// List every schema violation of `value` (empty when valid)
#[must_use]
pub fn violations(value: &Value) -> Vec<String> {
    let schema = match JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&OPTION_DEFINITIONS_SCHEMA)
    {
        Ok(schema) => schema,
        Err(err) => return vec![format!("option definition schema is invalid: {err}")],
    };

    let found: Vec<String> = match schema.validate(value) {
        Ok(()) => Vec::new(),
        Err(errors) => errors
            .map(|error| {
                let path = error.instance_path.to_string();
                let path = if path.is_empty() { "/".to_string() } else { path };
                format!("{path}: {error}")
            })
            .collect(),
    };
    found
}

/// List option names that cannot become distinct `--name` flags
///
/// Covers the names the schema already rejects, for definitions built in
/// code, plus any name equal to `no-<boolean option>`.
#[must_use]
pub fn name_violations(definitions: &OptionDefinitions) -> Vec<String> {
    let mut found = Vec::new();
    for name in definitions.keys() {
        let malformed = name.is_empty()
            || name.starts_with('-')
            || name.contains(|c: char| c == '=' || c.is_whitespace());
        if malformed {
            found.push(format!("/{name}: {name:?} is not a valid option name"));
        } else if name == "help" {
            found.push(format!("/{name}: \"help\" is reserved"));
        } else if let Some(negated) = name.strip_prefix("no-") {
            if definitions
                .get(negated)
                .is_some_and(|definition| definition.kind == OptionType::Boolean)
            {
                found.push(format!(
                    "/{name}: collides with --no-{negated} of boolean option \"{negated}\""
                ));
            }
        }
    }
    found
}

/// Validate and deserialize a module's option definitions
///
/// # Errors
/// `GameplanError::InvalidOptionDefinitions` carrying every violation.
pub fn validate_definitions(value: &Value) -> Result<OptionDefinitions, GameplanError> {
    let errors = violations(value);
    if !errors.is_empty() {
        tracing::debug!("Option definitions rejected: {:?}", errors);
        return Err(GameplanError::InvalidOptionDefinitions { errors });
    }

    let definitions: OptionDefinitions =
        serde_json::from_value(value.clone()).map_err(|err| {
            GameplanError::InvalidOptionDefinitions {
                errors: vec![err.to_string()],
            }
        })?;

    let errors = name_violations(&definitions);
    if !errors.is_empty() {
        tracing::debug!("Option names rejected: {:?}", errors);
        return Err(GameplanError::InvalidOptionDefinitions { errors });
    }
    Ok(definitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::definition::OptionDefinition;

    #[test]
    fn empty_mapping_is_valid() {
        assert!(violations(&json!({})).is_empty());
        assert!(validate_definitions(&json!({})).unwrap().is_empty());
    }

    #[test]
    fn full_definition_is_valid() {
        let value = json!({
            "directory": {"type": "string", "description": "The directory", "default": "/x"},
            "choice": {"type": "string", "choices": ["foo", "bar"], "default": "foo"},
            "boolean": {"type": "boolean", "prompt": "Yes or no", "default": true},
            "anything": {"type": "string", "default": null},
        });
        let definitions = validate_definitions(&value).unwrap();
        assert_eq!(definitions.len(), 4);
        assert_eq!(definitions["boolean"].kind, OptionType::Boolean);
    }

    #[test]
    fn invalid_type_enum_is_reported() {
        let err = validate_definitions(&json!({"boolean": {"type": "integer", "default": 1}}))
            .unwrap_err();
        match err {
            GameplanError::InvalidOptionDefinitions { errors } => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].starts_with("/boolean/type"), "{errors:?}");
            }
            other => panic!("expected invalid definitions, got {other:?}"),
        }
    }

    #[test]
    fn every_violation_is_collected() {
        let errors = violations(&json!({
            "missing": {"type": "string"},
            "extra": {"type": "boolean", "default": false, "color": "red"},
            "choices": {"type": "string", "default": "a", "choices": [1]},
        }));
        assert_eq!(errors.len(), 3, "{errors:?}");
    }

    fn rejected(value: Value) -> Vec<String> {
        match validate_definitions(&value).unwrap_err() {
            GameplanError::InvalidOptionDefinitions { errors } => errors,
            other => panic!("expected invalid definitions, got {other:?}"),
        }
    }

    #[test]
    fn reserved_help_name_is_rejected() {
        let errors = rejected(json!({"help": {"type": "boolean", "default": false}}));
        assert_eq!(errors.len(), 1, "{errors:?}");
    }

    #[test]
    fn names_that_are_not_flags_are_rejected() {
        let errors = rejected(json!({
            "-x": {"type": "string", "default": ""},
            "a=b": {"type": "string", "default": ""},
            "two words": {"type": "string", "default": ""},
        }));
        assert_eq!(errors.len(), 3, "{errors:?}");
    }

    #[test]
    fn negated_boolean_collision_is_rejected() {
        let errors = rejected(json!({
            "git": {"type": "boolean", "default": true},
            "no-git": {"type": "boolean", "default": false},
        }));
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert!(errors[0].starts_with("/no-git:"), "{errors:?}");
    }

    #[test]
    fn negated_prefix_without_boolean_is_accepted() {
        let definitions = validate_definitions(&json!({
            "git": {"type": "string", "default": "x"},
            "no-git": {"type": "boolean", "default": false},
            "snake_case.name-1": {"type": "string", "default": ""},
        }))
        .unwrap();
        assert_eq!(definitions.len(), 3);
    }

    #[test]
    fn name_violations_cover_definitions_built_in_code() {
        let mut definitions = OptionDefinitions::new();
        definitions.insert("help".to_string(), OptionDefinition::boolean(false));
        definitions.insert(String::new(), OptionDefinition::string(""));
        definitions.insert("flag".to_string(), OptionDefinition::boolean(true));
        definitions.insert("no-flag".to_string(), OptionDefinition::string(""));
        let errors = name_violations(&definitions);
        assert_eq!(errors.len(), 3, "{errors:?}");
    }

    #[test]
    fn non_object_mapping_is_rejected() {
        let errors = violations(&json!(["name"]));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("/:"), "{errors:?}");
    }
}
