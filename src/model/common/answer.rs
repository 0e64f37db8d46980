use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use super::question::QuestionType;

/// An answer exactly as it arrived in a submission: JSON strings and numbers
/// are both accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAnswer {
    Integer(i64),
    Float(f64),
    Text(String),
}

/// Reasons a raw answer does not fit its question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerError {
    Empty,
    NotAnOption,
    NotAWholeNumber,
}

impl Display for AnswerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Self::Empty => "The answer field is required.",
            Self::NotAnOption => "The selected answer is not one of the available options.",
            Self::NotAWholeNumber => "The answer must be a whole number.",
        };
        write!(f, "{msg}")
    }
}

/// An answer that has been checked against the type of its question.
/// Each variant holds the text that gets stored, which is the submitted
/// value unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerValue {
    Choice(String),
    FreeText(String),
    Scale(String),
}

impl AnswerValue {
    /// Check a raw answer against a question of the given type and options.
    pub fn parse(
        raw: RawAnswer,
        kind: QuestionType,
        options: &[String],
    ) -> Result<Self, AnswerError> {
        match kind {
            QuestionType::Choice => {
                let text = Self::non_empty_text(raw)?;
                if options.iter().any(|option| *option == text) {
                    Ok(Self::Choice(text))
                } else {
                    Err(AnswerError::NotAnOption)
                }
            }
            QuestionType::FreeText => Self::non_empty_text(raw).map(Self::FreeText),
            QuestionType::Scale => match raw {
                RawAnswer::Integer(n) => Ok(Self::Scale(n.to_string())),
                RawAnswer::Float(_) => Err(AnswerError::NotAWholeNumber),
                RawAnswer::Text(text) => {
                    let trimmed = text.trim();
                    if trimmed.is_empty() {
                        Err(AnswerError::Empty)
                    } else if trimmed.parse::<i64>().is_ok() {
                        Ok(Self::Scale(text))
                    } else {
                        Err(AnswerError::NotAWholeNumber)
                    }
                }
            },
        }
    }

    fn non_empty_text(raw: RawAnswer) -> Result<String, AnswerError> {
        match raw {
            RawAnswer::Text(text) if text.trim().is_empty() => Err(AnswerError::Empty),
            RawAnswer::Text(text) => Ok(text),
            RawAnswer::Integer(n) => Ok(n.to_string()),
            RawAnswer::Float(n) => Ok(n.to_string()),
        }
    }

    /// The value as it is stored.
    pub fn into_stored(self) -> String {
        match self {
            Self::Choice(text) | Self::FreeText(text) | Self::Scale(text) => text,
        }
    }
}
