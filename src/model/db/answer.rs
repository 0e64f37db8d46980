use std::ops::Deref;

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{common::question::QuestionId, mongodb::Id};

/// Core answer data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerCore {
    /// The owning respondent.
    pub respondent_id: Id,
    pub question_id: QuestionId,
    /// The value as submitted.
    pub value: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl AnswerCore {
    pub fn new(respondent_id: Id, question_id: QuestionId, value: String) -> Self {
        Self {
            respondent_id,
            question_id,
            value,
            created_at: Utc::now(),
        }
    }
}

/// An answer without an ID.
pub type NewAnswer = AnswerCore;

/// An answer from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub answer: AnswerCore,
}

impl Deref for Answer {
    type Target = AnswerCore;

    fn deref(&self) -> &Self::Target {
        &self.answer
    }
}
