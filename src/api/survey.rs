use log::info;
use mongodb::Client;
use rocket::{
    response::status::Created,
    serde::json::{Error as JsonError, Json},
    Route, State,
};

use crate::{
    error::Result,
    logging::RequestId,
    model::{
        api::{
            question::QuestionDesc,
            submission::{SubmissionReceipt, SurveySubmission},
        },
        common::token::ResponseToken,
        db::{
            answer::NewAnswer,
            question::Question,
            respondent::{NewRespondent, Respondent},
        },
        mongodb::{Coll, Id},
    },
    Config,
};

pub fn routes() -> Vec<Route> {
    routes![get_survey, submit_survey]
}

/// The question catalog, in display order.
#[get("/survey")]
pub async fn get_survey(questions: Coll<Question>) -> Result<Json<Vec<QuestionDesc>>> {
    let catalog = Question::catalog(&questions).await?;
    Ok(Json(catalog.into_iter().map(QuestionDesc::from).collect()))
}

/// Store a complete set of answers under a new respondent.
///
/// Nothing is written unless the whole submission is valid, and the
/// respondent and their answers become visible together or not at all.
#[post("/survey", data = "<submission>", format = "json")]
#[allow(clippy::too_many_arguments)]
pub async fn submit_survey(
    request_id: &RequestId,
    submission: std::result::Result<Json<SurveySubmission>, JsonError<'_>>,
    questions: Coll<Question>,
    respondents: Coll<Respondent>,
    answers: Coll<NewAnswer>,
    db_client: &State<Client>,
    config: &State<Config>,
) -> Result<Created<Json<SubmissionReceipt>>> {
    let catalog = Question::catalog(&questions).await?;
    let submission = submission?.into_inner().validate(&catalog)?;

    let respondent = Respondent {
        id: Id::new(),
        respondent: NewRespondent::new(submission.email.clone()),
    };
    let rows = submission.answer_rows(respondent.id);
    {
        let mut session = db_client.start_session(None).await?;
        session.start_transaction(None).await?;

        respondents
            .insert_one_with_session(&respondent, None, &mut session)
            .await?;
        // The driver rejects an empty batch.
        if !rows.is_empty() {
            answers
                .insert_many_with_session(&rows, None, &mut session)
                .await?;
        }

        session.commit_transaction().await?;
    }
    info!(
        "req{request_id}: stored {} answers for respondent {}",
        rows.len(),
        respondent.id
    );

    let token: ResponseToken = respondent.token.clone();
    let location = uri!(crate::api::responses::get_response(token));
    let response_url = format!("{}{location}", config.base_url());
    let receipt = SubmissionReceipt::new(response_url.clone());
    Ok(Created::new(response_url).body(Json(receipt)))
}
