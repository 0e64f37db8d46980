use std::ops::Deref;

use chrono::{DateTime, Utc};
use mongodb::bson::{doc, serde_helpers::chrono_datetime_as_bson_datetime, Document};
use serde::{Deserialize, Serialize};

use crate::model::{common::token::ResponseToken, mongodb::Id};

/// Core respondent data, as stored in the database. One is created per
/// successful submission and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespondentCore {
    /// Free-form, unverified.
    pub email: String,
    /// The only capability needed to read this respondent's answers.
    pub token: ResponseToken,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl RespondentCore {
    /// A new respondent with a freshly minted token.
    pub fn new(email: String) -> Self {
        Self {
            email,
            token: ResponseToken::generate(),
            created_at: Utc::now(),
        }
    }
}

/// A respondent without an ID.
pub type NewRespondent = RespondentCore;

/// A respondent from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Respondent {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub respondent: RespondentCore,
}

impl Respondent {
    /// A filter document matching exactly the given token.
    pub fn with_token(token: &ResponseToken) -> Document {
        doc! { "token": token.as_str() }
    }
}

impl Deref for Respondent {
    type Target = RespondentCore;

    fn deref(&self) -> &Self::Target {
        &self.respondent
    }
}
