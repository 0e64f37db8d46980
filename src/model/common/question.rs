use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Stable question identifier.
pub type QuestionId = u32;

/// The kind of a question, controlling both its input and how it is aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    /// Select exactly one of a fixed set of options.
    Choice,
    /// Unconstrained text.
    FreeText,
    /// Whole-number rating.
    Scale,
}

impl Display for QuestionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Choice => "choice",
            Self::FreeText => "free-text",
            Self::Scale => "scale",
        };
        write!(f, "{name}")
    }
}
