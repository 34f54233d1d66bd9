//! Command-line parsing of gameplan-declared options
//!
//! Option definitions are projected into a `clap` command at runtime. Parsing
//! is strict: unknown flags and values outside `choices` are rejected.

use super::definition::{OptionDefinition, OptionDefinitions, OptionSet, OptionType};
use super::schema::name_violations;
use crate::error::GameplanError;
use clap::builder::PossibleValuesParser;
use clap::{value_parser, Arg, ArgAction, Command};
use serde_json::Value;

/// Build the parser for a module's options
///
/// String options take `--name <value>`; boolean options accept `--name`,
/// `--name=<true|false>` and `--no-name`.
#[must_use]
pub fn build_command(definitions: &OptionDefinitions, repo: &str) -> Command {
    let mut command = Command::new("gameplan")
        .no_binary_name(true)
        .disable_version_flag(true)
        .override_usage(format!("gameplan {repo} <folder> -- [gameplan-options]"));

    for (name, definition) in definitions {
        command = command.arg(option_arg(name, definition));
        if definition.kind == OptionType::Boolean {
            command = command.arg(
                Arg::new(negated_id(name))
                    .long(negated_id(name))
                    .action(ArgAction::SetTrue)
                    .overrides_with(name.clone())
                    .hide(true),
            );
        }
    }
    command
}

fn option_arg(name: &str, definition: &OptionDefinition) -> Arg {
    let mut arg = Arg::new(name.to_string()).long(name.to_string());
    if let Some(description) = &definition.description {
        arg = arg.help(description.clone());
    }

    match definition.kind {
        OptionType::String => {
            arg = arg.action(ArgAction::Set).num_args(1);
            if let Some(choices) = definition.effective_choices() {
                arg = arg.value_parser(PossibleValuesParser::new(choices.to_vec()));
            }
            arg
        }
        OptionType::Boolean => arg
            .action(ArgAction::Set)
            .num_args(0..=1)
            .default_missing_value("true")
            .value_parser(value_parser!(bool))
            .overrides_with(negated_id(name)),
    }
}

fn negated_id(name: &str) -> String {
    format!("no-{name}")
}

/// Parse `args` into an option set covering every definition
///
/// Options absent from `args` take their definition's default.
///
/// # Errors
/// - `GameplanError::InvalidOptionDefinitions` if a name cannot be a flag
/// - `GameplanError::ModuleArguments` for unknown flags, bad values, or a
///   help request
pub fn parse_arguments(
    definitions: &OptionDefinitions,
    args: &[String],
    repo: &str,
) -> Result<OptionSet, GameplanError> {
    let errors = name_violations(definitions);
    if !errors.is_empty() {
        return Err(GameplanError::InvalidOptionDefinitions { errors });
    }

    let matches = build_command(definitions, repo).try_get_matches_from(args)?;

    let mut options = OptionSet::new();
    for (name, definition) in definitions {
        let parsed = match definition.kind {
            OptionType::String => matches
                .get_one::<String>(name)
                .map(|value| Value::String(value.clone())),
            OptionType::Boolean => {
                let negated = matches
                    .get_one::<bool>(&negated_id(name))
                    .copied()
                    .unwrap_or(false);
                if negated {
                    Some(Value::Bool(false))
                } else {
                    matches.get_one::<bool>(name).map(|value| Value::Bool(*value))
                }
            }
        };
        options.insert(
            name.clone(),
            parsed.unwrap_or_else(|| definition.default.clone()),
        );
    }
    Ok(options)
}
