use log::debug;
use mongodb::{
    bson::doc,
    options::{FindOptions, SessionOptions},
    Client,
};
use rocket::{futures::TryStreamExt, serde::json::Json, Route, State};

use crate::{
    error::Result,
    model::{
        api::{
            auth::AuthToken,
            pagination::{Paginated, PaginationRequest},
            question::QuestionDesc,
            report::{Dashboard, Tally},
            respondent::RespondentRecord,
        },
        db::{answer::Answer, question::Question, respondent::Respondent},
        mongodb::Coll,
    },
    Config,
};

pub fn routes() -> Vec<Route> {
    routes![dashboard, questions, responses]
}

/// Aggregated statistics over every stored answer.
#[get("/admin")]
pub async fn dashboard(
    _token: AuthToken,
    questions: Coll<Question>,
    answers: Coll<Answer>,
    db_client: &State<Client>,
    config: &State<Config>,
) -> Result<Json<Dashboard>> {
    // Ensure the catalog and answers are read from a consistent snapshot.
    let summaries = {
        let session_options = SessionOptions::builder().snapshot(true).build();
        let mut session = db_client.start_session(Some(session_options)).await?;

        let mut catalog = Vec::new();
        let mut cursor = questions
            .find_with_session(None, Question::in_display_order(), &mut session)
            .await?;
        while let Some(question) = cursor.next(&mut session).await {
            catalog.push(question?);
        }

        let mut tally = Tally::new(&catalog);
        let mut count = 0_u64;
        let mut cursor = answers.find_with_session(None, None, &mut session).await?;
        while let Some(answer) = cursor.next(&mut session).await {
            let answer = answer?;
            tally.record(&answer);
            count += 1;
        }
        debug!("Aggregated {count} answers");
        tally.finish()
    };

    Ok(Json(Dashboard::new(summaries, config.dashboard())))
}

/// The question catalog, in display order.
#[get("/admin/questions")]
pub async fn questions(
    _token: AuthToken,
    questions: Coll<Question>,
) -> Result<Json<Vec<QuestionDesc>>> {
    let catalog = Question::catalog(&questions).await?;
    Ok(Json(catalog.into_iter().map(QuestionDesc::from).collect()))
}

/// Every respondent with their raw answers, oldest respondent first.
#[get("/admin/responses?<page_num>&<page_size>")]
pub async fn responses(
    _token: AuthToken,
    page_num: Option<u32>,
    page_size: Option<u32>,
    respondents: Coll<Respondent>,
    questions: Coll<Question>,
    answers: Coll<Answer>,
) -> Result<Json<Paginated<RespondentRecord>>> {
    let pagination = PaginationRequest::from_query(page_num, page_size);

    let total = respondents.count_documents(None, None).await?;
    let page_options = FindOptions::builder()
        .sort(doc! { "created_at": 1, "_id": 1 })
        .skip(pagination.skip())
        .limit(i64::from(pagination.page_size()))
        .build();
    let page: Vec<Respondent> = respondents
        .find(None, page_options)
        .await?
        .try_collect()
        .await?;

    let ids = page.iter().map(|respondent| respondent.id).collect::<Vec<_>>();
    let page_answers = answers
        .find(doc! { "respondent_id": { "$in": ids } }, None)
        .await?
        .try_collect()
        .await?;
    let catalog = Question::catalog(&questions).await?;

    let records = RespondentRecord::assemble(page, &catalog, page_answers);
    Ok(Json(pagination.to_paginated(total, records)))
}

#[cfg(all(test, feature = "mongodb-tests"))]
mod tests {
    use rocket::{
        http::{Header, Status},
        local::asynchronous::Client,
        serde::json::Value,
    };

    use crate::model::db::{answer::NewAnswer, respondent::NewRespondent};
    use crate::model::mongodb::Id;

    use super::*;

    /// Store a respondent answering the given `(question_id, value)` pairs.
    async fn insert_response(
        respondents: &Coll<Respondent>,
        answers: &Coll<NewAnswer>,
        email: &str,
        pairs: &[(u32, &str)],
    ) -> Respondent {
        let respondent = Respondent {
            id: Id::new(),
            respondent: NewRespondent::new(email.to_string()),
        };
        respondents.insert_one(&respondent, None).await.unwrap();
        let rows = pairs
            .iter()
            .map(|(question_id, value)| NewAnswer::new(respondent.id, *question_id, value.to_string()))
            .collect::<Vec<_>>();
        if !rows.is_empty() {
            answers.insert_many(rows, None).await.unwrap();
        }
        respondent
    }

    #[backend_test]
    async fn dashboard_requires_admin(client: Client) {
        let response = client.get(uri!(dashboard)).dispatch().await;
        assert_eq!(Status::Unauthorized, response.status());

        let response = client.get(uri!(responses(_, _))).dispatch().await;
        assert_eq!(Status::Unauthorized, response.status());
    }

    #[backend_test(admin)]
    async fn dashboard_aggregates(
        client: Client,
        auth: Header,
        respondents: Coll<Respondent>,
        answers: Coll<NewAnswer>,
    ) {
        // Question 5 is the headset choice, 10 a quality rating.
        let responses = [
            [(5, "Oculus Quest"), (10, "1")],
            [(5, "HTC Vive"), (10, "3")],
            [(5, "Oculus Quest"), (10, "5")],
            [(5, "Oculus Quest"), (10, "not a number")],
        ];
        for (i, pairs) in responses.iter().enumerate() {
            let email = format!("viewer{i}@example.com");
            insert_response(&respondents, &answers, &email, pairs).await;
        }

        let response = client.get(uri!(dashboard)).header(auth).dispatch().await;
        assert_eq!(Status::Ok, response.status());

        let body = response.into_json::<Value>().await.unwrap();
        assert_eq!(body["headsetData"]["Oculus Quest"], 3);
        assert_eq!(body["headsetData"]["HTC Vive"], 1);
        assert_eq!(body["headsetData"]["Valve Index"], 0);
        assert_eq!(body["qualityData"]["10"], 3.0);
        assert_eq!(body["qualityData"]["11"], Value::Null);
        assert!(body["storeData"].is_object());
        assert_eq!(body["questions"].as_array().unwrap().len(), 20);
    }

    #[backend_test(admin)]
    async fn admin_questions(client: Client, auth: Header) {
        let response = client.get(uri!(questions)).header(auth).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let catalog = response.into_json::<Vec<QuestionDesc>>().await.unwrap();
        assert_eq!(catalog.len(), 20);
        assert_eq!(catalog[0].number, 1);
    }

    #[backend_test(admin)]
    async fn responses_are_paginated(
        client: Client,
        auth: Header,
        respondents: Coll<Respondent>,
        answers: Coll<NewAnswer>,
    ) {
        for i in 0..3 {
            let email = format!("viewer{i}@example.com");
            insert_response(&respondents, &answers, &email, &[(2, "Female"), (1, "30")]).await;
        }

        let response = client
            .get(uri!(responses(Some(2), Some(2))))
            .header(auth)
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        let body = response.into_json::<Value>().await.unwrap();
        assert_eq!(body["pagination"]["total"], 3);
        assert_eq!(body["pagination"]["page_num"], 2);
        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["email"], "viewer2@example.com");
        let numbers = items[0]["answers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|answer| answer["question_number"].as_u64().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(numbers, vec![1, 2]);
    }
}
