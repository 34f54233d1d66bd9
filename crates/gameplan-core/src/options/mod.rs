//! Option pipeline
//!
//! Definitions are validated against a schema, then resolved to an
//! [`OptionSet`] from defaults, command-line arguments and (optionally)
//! interactive answers, in that order of precedence.

pub mod args;
pub mod definition;
pub mod interactive;
pub mod schema;

pub use args::{build_command, parse_arguments};
pub use definition::{defaults, OptionDefinition, OptionDefinitions, OptionSet, OptionType};
pub use interactive::{build_questions, merge_answers, prompt_for_options};
pub use schema::{name_violations, validate_definitions, violations, OPTION_DEFINITIONS_SCHEMA};
