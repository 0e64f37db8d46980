use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{
    api::id::ApiId,
    common::{question::QuestionId, token::ResponseToken},
    db::{answer::Answer, question::Question, respondent::Respondent},
    mongodb::Id,
};

/// A respondent and all their raw answers, for the admin listing.
#[derive(Debug, Serialize)]
pub struct RespondentRecord {
    pub id: ApiId,
    pub email: String,
    pub token: ResponseToken,
    pub created_at: DateTime<Utc>,
    /// Ordered by question number.
    pub answers: Vec<AnswerRecord>,
}

/// One raw answer joined with its question.
#[derive(Debug, Serialize)]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    pub question_number: u32,
    pub question_body: String,
    pub answer: String,
}

impl RespondentRecord {
    /// Group answers under their respondents, preserving the respondents' order.
    pub fn assemble(
        respondents: Vec<Respondent>,
        catalog: &[Question],
        answers: Vec<Answer>,
    ) -> Vec<Self> {
        let questions = catalog
            .iter()
            .map(|question| (question.id, question))
            .collect::<HashMap<_, _>>();

        let mut by_respondent: HashMap<Id, Vec<AnswerRecord>> = HashMap::new();
        for answer in answers {
            let answer = answer.answer;
            // Catalog questions are never deleted, so this only skips corrupt rows.
            let Some(question) = questions.get(&answer.question_id) else {
                continue;
            };
            by_respondent
                .entry(answer.respondent_id)
                .or_default()
                .push(AnswerRecord {
                    question_id: answer.question_id,
                    question_number: question.number,
                    question_body: question.body.clone(),
                    answer: answer.value,
                });
        }

        respondents
            .into_iter()
            .map(|respondent| {
                let mut answers = by_respondent.remove(&respondent.id).unwrap_or_default();
                answers.sort_by_key(|answer| answer.question_number);
                let core = respondent.respondent;
                Self {
                    id: respondent.id.into(),
                    email: core.email,
                    token: core.token,
                    created_at: core.created_at,
                    answers,
                }
            })
            .collect()
    }
}
