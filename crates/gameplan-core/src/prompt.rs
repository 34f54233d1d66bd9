//! Prompt collaborator
//!
//! Questions are plain data ([`Question`]); a [`Prompter`] turns an ordered
//! list of them into answers. [`TerminalPrompter`] is a line-based prompter
//! over any async reader / writer pair.

use crate::error::GameplanError;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stderr, Stdin};
use tokio::sync::Mutex;

/// Answers keyed by question name
pub type Answers = Map<String, Value>;

/// How a question is asked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    /// Free text
    String,
    /// Single selection among `choices`
    List,
    /// Yes / no
    Confirm,
}

/// A single interactive question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub name: String,
    pub default: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    pub message: String,
}

impl Question {
    /// Interpret one line of user input
    ///
    /// Empty input takes the default. Lists accept a 1-based index or the
    /// literal choice; confirms accept y / yes / n / no. `None` means the
    /// input is invalid and the question should be asked again.
    #[must_use]
    pub fn interpret(&self, input: &str) -> Option<Value> {
        let input = input.trim();
        if input.is_empty() {
            return Some(self.default.clone());
        }

        match self.kind {
            QuestionKind::String => Some(Value::String(input.to_string())),
            QuestionKind::List => {
                let choices = self.choices.as_deref().unwrap_or_default();
                if let Ok(index) = input.parse::<usize>() {
                    if (1..=choices.len()).contains(&index) {
                        return Some(Value::String(choices[index - 1].clone()));
                    }
                }
                choices
                    .iter()
                    .find(|choice| choice.as_str() == input)
                    .map(|choice| Value::String(choice.clone()))
            }
            QuestionKind::Confirm => match input.to_ascii_lowercase().as_str() {
                "y" | "yes" | "true" => Some(Value::Bool(true)),
                "n" | "no" | "false" => Some(Value::Bool(false)),
                _ => None,
            },
        }
    }

    /// Text shown before reading an answer
    #[must_use]
    pub fn render(&self) -> String {
        let mut text = format!("? {}", self.message);
        match self.kind {
            QuestionKind::String => {
                if let Some(default) = self.default.as_str().filter(|d| !d.is_empty()) {
                    text.push_str(&format!(" ({default})"));
                }
            }
            QuestionKind::List => {
                for (index, choice) in self.choices.iter().flatten().enumerate() {
                    let marker = if self.default.as_str() == Some(choice.as_str()) {
                        '>'
                    } else {
                        ' '
                    };
                    text.push_str(&format!("\n {marker} {}) {choice}", index + 1));
                }
                text.push_str("\n  Answer");
            }
            QuestionKind::Confirm => {
                let hint = if self.default.as_bool() == Some(true) {
                    "Y/n"
                } else {
                    "y/N"
                };
                text.push_str(&format!(" ({hint})"));
            }
        }
        text.push_str(": ");
        text
    }
}

/// Prompt collaborator
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Ask `questions` in order
    ///
    /// # Errors
    /// `GameplanError::Prompt` when the terminal cannot be used.
    async fn prompt(&self, questions: &[Question]) -> Result<Answers, GameplanError>;
}

/// Line-based prompter
pub struct TerminalPrompter<R, W> {
    io: Mutex<PromptIo<R, W>>,
}

struct PromptIo<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompter<BufReader<Stdin>, Stderr> {
    /// Prompt on stdin, writing questions to stderr
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stderr())
    }
}

impl<R, W> TerminalPrompter<R, W> {
    /// Create prompter over the given streams
    #[must_use]
    pub fn new(input: R, output: W) -> Self {
        Self {
            io: Mutex::new(PromptIo { input, output }),
        }
    }
}

impl<R, W> std::fmt::Debug for TerminalPrompter<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalPrompter").finish_non_exhaustive()
    }
}

impl<R, W> PromptIo<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn ask(&mut self, question: &Question) -> Result<Value, GameplanError> {
        loop {
            self.write(&question.render()).await?;

            let mut line = String::new();
            let read = self
                .input
                .read_line(&mut line)
                .await
                .map_err(|err| GameplanError::Prompt(err.to_string()))?;
            if read == 0 {
                // end of input
                self.write("\n").await?;
                return Ok(question.default.clone());
            }

            match question.interpret(&line) {
                Some(answer) => return Ok(answer),
                None => self.write("  Please enter a valid answer\n").await?,
            }
        }
    }

    async fn write(&mut self, text: &str) -> Result<(), GameplanError> {
        self.output
            .write_all(text.as_bytes())
            .await
            .map_err(|err| GameplanError::Prompt(err.to_string()))?;
        self.output
            .flush()
            .await
            .map_err(|err| GameplanError::Prompt(err.to_string()))
    }
}

#[async_trait]
impl<R, W> Prompter for TerminalPrompter<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn prompt(&self, questions: &[Question]) -> Result<Answers, GameplanError> {
        let mut io = self.io.lock().await;
        let mut answers = Answers::new();
        for question in questions {
            let answer = io.ask(question).await?;
            answers.insert(question.name.clone(), answer);
        }
        Ok(answers)
    }
}
