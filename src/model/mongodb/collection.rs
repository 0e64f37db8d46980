use std::{ops::Deref, time::Duration};

use log::debug;
use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};
use rocket::{
    request::{self, FromRequest, Request},
    State,
};

use crate::model::db::{
    admin::{Admin, NewAdmin},
    answer::{Answer, NewAnswer},
    question::Question,
    respondent::Respondent,
    session::AdminSession,
};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r, T> FromRequest<'r> for Coll<T>
where
    T: MongoCollection,
{
    type Error = ();

    /// Get the database connection from the managed state and wrap it in a collection.
    ///
    /// Panics iff the [`Database`] is not managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let db = req.guard::<&State<Database>>().await.unwrap();
        request::Outcome::Success(Coll::from_db(db))
    }
}

// Admin collections
const ADMINS: &str = "admins";
impl MongoCollection for Admin {
    const NAME: &'static str = ADMINS;
}
impl MongoCollection for NewAdmin {
    const NAME: &'static str = ADMINS;
}

// Admin session collection
const ADMIN_SESSIONS: &str = "admin_sessions";
impl MongoCollection for AdminSession {
    const NAME: &'static str = ADMIN_SESSIONS;
}

// Question collection
const QUESTIONS: &str = "questions";
impl MongoCollection for Question {
    const NAME: &'static str = QUESTIONS;
}

// Respondent collection
const RESPONDENTS: &str = "respondents";
impl MongoCollection for Respondent {
    const NAME: &'static str = RESPONDENTS;
}

// Answer collections
const ANSWERS: &str = "answers";
impl MongoCollection for Answer {
    const NAME: &'static str = ANSWERS;
}
impl MongoCollection for NewAnswer {
    const NAME: &'static str = ANSWERS;
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = IndexOptions::builder().unique(true).build();

    // Admin collection.
    let admin_index = IndexModel::builder()
        .keys(doc! {"username": 1})
        .options(unique.clone())
        .build();
    Coll::<Admin>::from_db(db)
        .create_index(admin_index, None)
        .await?;

    // Admin session collection: expired sessions are reaped by the server.
    let session_expiry = IndexModel::builder()
        .keys(doc! {"expire_at": 1})
        .options(
            IndexOptions::builder()
                .expire_after(Duration::from_secs(0))
                .build(),
        )
        .build();
    Coll::<AdminSession>::from_db(db)
        .create_index(session_expiry, None)
        .await?;

    // Question collection.
    let question_index = IndexModel::builder()
        .keys(doc! {"number": 1})
        .options(unique.clone())
        .build();
    Coll::<Question>::from_db(db)
        .create_index(question_index, None)
        .await?;

    // Respondent collection.
    let token_index = IndexModel::builder()
        .keys(doc! {"token": 1})
        .options(unique.clone())
        .build();
    Coll::<Respondent>::from_db(db)
        .create_index(token_index, None)
        .await?;

    // Answer collection: one answer per respondent per question.
    let answer_index = IndexModel::builder()
        .keys(doc! {"respondent_id": 1, "question_id": 1})
        .options(unique)
        .build();
    let by_question = IndexModel::builder()
        .keys(doc! {"question_id": 1})
        .build();
    Coll::<Answer>::from_db(db)
        .create_indexes([answer_index, by_question], None)
        .await?;

    Ok(())
}
