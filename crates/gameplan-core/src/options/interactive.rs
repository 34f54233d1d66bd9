//! Interactive option refinement

use super::definition::{OptionDefinitions, OptionSet, OptionType};
use crate::error::GameplanError;
use crate::prompt::{Answers, Prompter, Question, QuestionKind};

/// One question per definition, in declaration order
///
/// Each question defaults to the option's current value, so answering
/// nothing leaves the option set unchanged.
#[must_use]
pub fn build_questions(definitions: &OptionDefinitions, options: &OptionSet) -> Vec<Question> {
    definitions
        .iter()
        .map(|(name, definition)| {
            let choices = definition.effective_choices().map(<[String]>::to_vec);
            let kind = match definition.kind {
                OptionType::String if choices.is_some() => QuestionKind::List,
                OptionType::String => QuestionKind::String,
                OptionType::Boolean => QuestionKind::Confirm,
            };
            let message = definition
                .prompt
                .clone()
                .or_else(|| definition.description.clone())
                .unwrap_or_else(|| format!("{name}:"));

            Question {
                kind,
                name: name.clone(),
                default: options
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| definition.default.clone()),
                choices,
                message,
            }
        })
        .collect()
}

/// Overlay answers on an option set
///
/// Answers naming no definition are dropped.
#[must_use]
pub fn merge_answers(
    definitions: &OptionDefinitions,
    mut options: OptionSet,
    answers: Answers,
) -> OptionSet {
    for (name, answer) in answers {
        if definitions.contains_key(&name) {
            options.insert(name, answer);
        } else {
            tracing::debug!("Ignoring answer for undefined option: {}", name);
        }
    }
    options
}

/// Ask every option and merge the answers over `options`
///
/// # Errors
/// Whatever the prompter reports.
pub async fn prompt_for_options(
    definitions: &OptionDefinitions,
    options: OptionSet,
    prompter: &dyn Prompter,
) -> Result<OptionSet, GameplanError> {
    let questions = build_questions(definitions, &options);
    if questions.is_empty() {
        return Ok(options);
    }
    tracing::debug!("Prompting for {} options", questions.len());

    let answers = prompter.prompt(&questions).await?;
    Ok(merge_answers(definitions, options, answers))
}
