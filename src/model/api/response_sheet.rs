use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{
    api::question::QuestionDesc,
    common::token::ResponseToken,
    db::{answer::Answer, question::Question, respondent::Respondent},
};

/// Everything a token holder can see: who responded, and the whole catalog
/// annotated with their answers.
#[derive(Debug, Serialize)]
pub struct ResponseSheet {
    pub user: RespondentDesc,
    pub questions: Vec<AnsweredQuestion>,
}

/// The public view of a respondent.
#[derive(Debug, Serialize)]
pub struct RespondentDesc {
    pub email: String,
    pub token: ResponseToken,
    pub created_at: DateTime<Utc>,
}

impl From<Respondent> for RespondentDesc {
    fn from(respondent: Respondent) -> Self {
        let core = respondent.respondent;
        Self {
            email: core.email,
            token: core.token,
            created_at: core.created_at,
        }
    }
}

/// A catalog question with the respondent's answer, or `null` if they gave none.
#[derive(Debug, Serialize)]
pub struct AnsweredQuestion {
    #[serde(flatten)]
    pub question: QuestionDesc,
    pub answer: Option<String>,
}

impl ResponseSheet {
    /// Join a respondent's answers against the catalog.
    ///
    /// Questions keep the catalog's order and none are dropped. Answers that
    /// belong to another respondent are ignored, and if a question somehow has
    /// several answers the most recently written one wins.
    pub fn assemble(
        respondent: Respondent,
        mut catalog: Vec<Question>,
        mut answers: Vec<Answer>,
    ) -> Self {
        answers.retain(|answer| answer.respondent_id == respondent.id);
        answers.sort_by_key(|answer| (answer.created_at, answer.id));
        let mut by_question = HashMap::new();
        for answer in answers {
            by_question.insert(answer.question_id, answer.answer.value);
        }

        catalog.sort_by_key(|question| question.number);
        let questions = catalog
            .into_iter()
            .map(|question| AnsweredQuestion {
                answer: by_question.remove(&question.id),
                question: question.into(),
            })
            .collect();

        Self {
            user: respondent.into(),
            questions,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rocket::serde::json::{json, serde_json};

    use super::*;
    use crate::model::mongodb::Id;

    #[test]
    fn full_catalog_in_order() {
        let respondent = Respondent::example();
        let mut catalog = Question::example_catalog();
        catalog.reverse();
        let answers = vec![Answer::example(respondent.id, 12, "5")];

        let sheet = ResponseSheet::assemble(respondent.clone(), catalog, answers);
        assert_eq!(sheet.user.email, respondent.email);
        assert_eq!(sheet.user.token, respondent.token);

        let numbers = sheet.questions.iter().map(|q| q.question.number).collect::<Vec<_>>();
        assert_eq!(numbers, vec![1, 2, 3]);
        let answers = sheet.questions.iter().map(|q| q.answer.as_deref()).collect::<Vec<_>>();
        assert_eq!(answers, vec![None, Some("5"), None]);
    }

    #[test]
    fn ignores_other_respondents() {
        let respondent = Respondent::example();
        let answers = vec![
            Answer::example(Id::new(), 11, "B"),
            Answer::example(respondent.id, 13, "Nothing to add"),
        ];
        let sheet = ResponseSheet::assemble(respondent, Question::example_catalog(), answers);
        assert_eq!(sheet.questions[0].answer, None);
        assert_eq!(sheet.questions[2].answer.as_deref(), Some("Nothing to add"));
    }

    #[test]
    fn latest_answer_wins() {
        let respondent = Respondent::example();
        let mut first = Answer::example(respondent.id, 11, "A");
        let second = Answer::example(respondent.id, 11, "B");
        first.answer.created_at = second.created_at - Duration::seconds(1);

        let sheet =
            ResponseSheet::assemble(respondent, Question::example_catalog(), vec![second, first]);
        assert_eq!(sheet.questions[0].answer.as_deref(), Some("B"));
    }

    #[test]
    fn serialization() {
        let respondent = Respondent::example();
        let answers = vec![Answer::example(respondent.id, 11, "A")];
        let sheet = ResponseSheet::assemble(respondent, Question::example_catalog(), answers);
        let value = serde_json::to_value(&sheet).unwrap();

        assert_eq!(value["user"]["email"], json!("viewer@example.com"));
        assert_eq!(value["questions"][0]["id"], json!(11));
        assert_eq!(value["questions"][0]["answer"], json!("A"));
        assert_eq!(value["questions"][1]["answer"], json!(null));
        assert_eq!(value["questions"][1]["options"], json!(null));
    }
}
