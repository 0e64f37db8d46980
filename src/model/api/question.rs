use serde::{Deserialize, Serialize};

use crate::model::{
    common::question::{QuestionId, QuestionType},
    db::question::Question,
};

/// A question as presented to clients. `options` is `null` unless the question
/// is a choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDesc {
    pub id: QuestionId,
    pub number: u32,
    pub body: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub options: Option<Vec<String>>,
}

impl From<Question> for QuestionDesc {
    fn from(question: Question) -> Self {
        let options = (question.kind == QuestionType::Choice).then_some(question.options);
        Self {
            id: question.id,
            number: question.number,
            body: question.body,
            kind: question.kind,
            options,
        }
    }
}

#[cfg(test)]
mod tests {
    use rocket::serde::json::{json, serde_json};

    use super::*;

    #[test]
    fn serialization() {
        let choice = QuestionDesc::from(Question::example_choice(4, 2));
        assert_eq!(
            serde_json::to_value(&choice).unwrap(),
            json!({
                "id": 4,
                "number": 2,
                "body": "Which do you prefer?",
                "type": "choice",
                "options": ["A", "B"],
            })
        );

        let scale = QuestionDesc::from(Question::example_scale(5, 3));
        assert_eq!(serde_json::to_value(&scale).unwrap()["options"], json!(null));
        assert_eq!(serde_json::to_value(&scale).unwrap()["type"], json!("scale"));
    }
}
