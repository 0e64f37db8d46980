use mongodb::{bson::doc, options::FindOptions};
use rocket::{futures::TryStreamExt, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        api::response_sheet::ResponseSheet,
        common::token::ResponseToken,
        db::{answer::Answer, question::Question, respondent::Respondent},
        mongodb::Coll,
    },
};

pub fn routes() -> Vec<Route> {
    routes![get_response]
}

/// Read back a respondent's answers, given their response token.
///
/// Unknown and malformed tokens are reported identically.
#[get("/responses/<token>")]
pub async fn get_response(
    token: ResponseToken,
    respondents: Coll<Respondent>,
    questions: Coll<Question>,
    answers: Coll<Answer>,
) -> Result<Json<ResponseSheet>> {
    let respondent = respondents
        .find_one(Respondent::with_token(&token), None)
        .await?
        .ok_or_else(|| Error::not_found("Response".to_string()))?;

    let catalog = Question::catalog(&questions).await?;
    let oldest_first = FindOptions::builder()
        .sort(doc! { "created_at": 1, "_id": 1 })
        .build();
    let respondent_answers = answers
        .find(doc! { "respondent_id": respondent.id }, oldest_first)
        .await?
        .try_collect()
        .await?;

    Ok(Json(ResponseSheet::assemble(
        respondent,
        catalog,
        respondent_answers,
    )))
}
