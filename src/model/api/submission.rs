//! The survey submission payload and its validation against the catalog.

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use log::error;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationErrors;
use crate::model::{
    common::{
        answer::{AnswerValue, RawAnswer},
        question::QuestionId,
    },
    db::{answer::NewAnswer, question::Question},
    mongodb::Id,
};

pub const MAX_EMAIL_LENGTH: usize = 255;

/// A submission body, exactly as posted by the survey form.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SurveySubmission {
    #[serde(default)]
    pub email: Option<String>,
    /// Keyed by question ID.
    #[serde(default)]
    pub responses: HashMap<String, ResponseSpec>,
}

/// One posted answer.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseSpec {
    #[serde(default)]
    pub answer: Option<RawAnswer>,
}

/// A submission that answers every catalog question with a value fitting
/// that question's type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSubmission {
    pub email: String,
    pub answers: BTreeMap<QuestionId, AnswerValue>,
}

/// Pattern an email must match. `None` only if the pattern fails to build, in
/// which case no email is accepted.
fn email_pattern() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| {
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$")
                .map_err(|e| error!("Failed to build email pattern: {e}"))
                .ok()
        })
        .as_ref()
}

impl SurveySubmission {
    /// Check the submission against the catalog, collecting every problem
    /// rather than stopping at the first.
    pub fn validate(self, catalog: &[Question]) -> Result<ValidSubmission, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let email = self.email.unwrap_or_default();
        if email.trim().is_empty() {
            errors.add("email", "The email field is required.");
        } else if email.chars().count() > MAX_EMAIL_LENGTH {
            errors.add(
                "email",
                format!("The email may not be greater than {MAX_EMAIL_LENGTH} characters."),
            );
        } else if !email_pattern().is_some_and(|pattern| pattern.is_match(&email)) {
            errors.add("email", "The email must be a valid email address.");
        }

        let by_id = catalog
            .iter()
            .map(|question| (question.id, question))
            .collect::<HashMap<_, _>>();

        let mut answers = BTreeMap::new();
        for (key, spec) in self.responses {
            let question = match key.trim().parse::<QuestionId>() {
                Ok(id) => by_id.get(&id),
                Err(_) => None,
            };
            let Some(question) = question else {
                errors.add(format!("responses.{key}"), "The selected question is invalid.");
                continue;
            };
            if answers.contains_key(&question.id) {
                errors.add(
                    format!("responses.{key}"),
                    "The question was answered more than once.",
                );
                continue;
            }
            let Some(raw) = spec.answer else {
                errors.add(format!("responses.{key}.answer"), "The answer field is required.");
                continue;
            };
            match AnswerValue::parse(raw, question.kind, &question.options) {
                Ok(value) => {
                    answers.insert(question.id, value);
                }
                Err(e) => errors.add(format!("responses.{key}.answer"), e.to_string()),
            }
        }

        for question in catalog {
            if !answers.contains_key(&question.id) {
                let field = format!("responses.{}.answer", question.id);
                if errors.field(&field).is_none() {
                    errors.add(field, "The answer field is required.");
                }
            }
        }

        errors.into_result(ValidSubmission { email, answers })
    }
}

impl ValidSubmission {
    /// The answer rows to store for the given respondent.
    pub fn answer_rows(&self, respondent_id: Id) -> Vec<NewAnswer> {
        self.answers
            .iter()
            .map(|(&question_id, value)| {
                NewAnswer::new(respondent_id, question_id, value.clone().into_stored())
            })
            .collect()
    }
}

/// Shown to respondents once their answers are stored.
pub const THANK_YOU_MESSAGE: &str = "Thank you for your participation!";

/// Response to a successful submission.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub message: String,
    /// Where the respondent can read their answers back.
    pub response_url: String,
}

impl SubmissionReceipt {
    pub fn new(response_url: String) -> Self {
        Self {
            message: THANK_YOU_MESSAGE.to_string(),
            response_url,
        }
    }
}


#[cfg(test)]
mod tests {
    use rocket::serde::json::serde_json;

    use super::*;

    #[test]
    fn valid_submission() {
        let valid = SurveySubmission::example()
            .validate(&Question::example_catalog())
            .unwrap();
        assert_eq!(valid.email, "viewer@example.com");
        assert_eq!(valid.answers.len(), 3);
        assert_eq!(valid.answers[&12], AnswerValue::Scale("4".to_string()));

        let respondent_id = Id::new();
        let rows = valid.answer_rows(respondent_id);
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|row| row.respondent_id == respondent_id));
        let values = rows.iter().map(|row| row.value.as_str()).collect::<Vec<_>>();
        assert_eq!(values, vec!["A", "4", "More cinemas please"]);
    }

    #[test]
    fn values_are_stored_as_submitted() {
        let valid = SurveySubmission::from_pairs(
            "viewer@example.com",
            &[
                ("11", RawAnswer::Text("B".into())),
                ("12", RawAnswer::Text(" 03 ".into())),
                ("13", RawAnswer::Float(34.5)),
            ],
        )
        .validate(&Question::example_catalog())
        .unwrap();
        let rows = valid.answer_rows(Id::new());
        let values = rows.iter().map(|row| row.value.as_str()).collect::<Vec<_>>();
        assert_eq!(values, vec!["B", " 03 ", "34.5"]);
    }

    #[test]
    fn accepts_ordinary_emails() {
        assert!(email_pattern().is_some());
        let catalog = Question::example_catalog();
        for email in ["viewer@example.com", "first.last+vr@mail.example.co.uk"] {
            let mut submission = SurveySubmission::example();
            submission.email = Some(email.to_string());
            assert!(submission.validate(&catalog).is_ok(), "rejected {email:?}");
        }
    }

    #[test]
    fn rejects_bad_emails() {
        let catalog = Question::example_catalog();
        for email in ["", "   ", "not-an-email", "two@@example.com", "me@localhost"] {
            let mut submission = SurveySubmission::example();
            submission.email = Some(email.to_string());
            let errors = submission.validate(&catalog).unwrap_err();
            assert!(errors.field("email").is_some(), "accepted {email:?}");
        }

        let mut submission = SurveySubmission::example();
        submission.email = None;
        assert!(submission.validate(&catalog).unwrap_err().field("email").is_some());

        let mut submission = SurveySubmission::example();
        submission.email = Some(format!("{}@example.com", "a".repeat(250)));
        let errors = submission.validate(&catalog).unwrap_err();
        assert_eq!(
            errors.field("email").unwrap(),
            ["The email may not be greater than 255 characters."]
        );
    }

    #[test]
    fn requires_every_question() {
        let submission = SurveySubmission::from_pairs(
            "viewer@example.com",
            &[("11", RawAnswer::Text("B".into()))],
        );
        let errors = submission.validate(&Question::example_catalog()).unwrap_err();
        assert!(errors.field("responses.11.answer").is_none());
        assert!(errors.field("responses.12.answer").is_some());
        assert!(errors.field("responses.13.answer").is_some());
    }

    #[test]
    fn rejects_unknown_questions() {
        let mut submission = SurveySubmission::example();
        submission.responses.insert(
            "999".to_string(),
            ResponseSpec {
                answer: Some(RawAnswer::Text("A".into())),
            },
        );
        submission.responses.insert(
            "headset".to_string(),
            ResponseSpec {
                answer: Some(RawAnswer::Text("A".into())),
            },
        );
        let errors = submission.validate(&Question::example_catalog()).unwrap_err();
        assert!(errors.field("responses.999").is_some());
        assert!(errors.field("responses.headset").is_some());
    }

    #[test]
    fn rejects_duplicate_keys_for_one_question() {
        let mut submission = SurveySubmission::example();
        submission.responses.insert(
            "011".to_string(),
            ResponseSpec {
                answer: Some(RawAnswer::Text("B".into())),
            },
        );
        let errors = submission.validate(&Question::example_catalog()).unwrap_err();
        let duplicate = ["responses.11", "responses.011"]
            .iter()
            .filter(|field| errors.field(field).is_some())
            .count();
        assert_eq!(duplicate, 1);
    }

    #[test]
    fn rejects_empty_and_mistyped_answers() {
        let submission = SurveySubmission::from_pairs(
            "viewer@example.com",
            &[
                ("11", RawAnswer::Text("C".into())),
                ("12", RawAnswer::Text("great".into())),
                ("13", RawAnswer::Text("".into())),
            ],
        );
        let errors = submission.validate(&Question::example_catalog()).unwrap_err();
        for field in ["responses.11.answer", "responses.12.answer", "responses.13.answer"] {
            assert_eq!(errors.field(field).map(<[String]>::len), Some(1), "{field}");
        }
    }

    #[test]
    fn missing_answer_field() {
        let submission: SurveySubmission = serde_json::from_str(
            r#"{"email": "viewer@example.com", "responses": {"11": {}, "12": {"answer": 3}, "13": {"answer": "ok"}}}"#,
        )
        .unwrap();
        let errors = submission.validate(&Question::example_catalog()).unwrap_err();
        assert_eq!(
            errors.field("responses.11.answer").unwrap(),
            ["The answer field is required."]
        );
    }

    #[test]
    fn rejects_unknown_fields() {
        let parsed = serde_json::from_str::<SurveySubmission>(
            r#"{"email": "viewer@example.com", "responses": {}, "admin": true}"#,
        );
        assert!(parsed.is_err());

        let parsed = serde_json::from_str::<SurveySubmission>(
            r#"{"email": "viewer@example.com", "responses": {"11": {"answer": "A", "extra": 1}}}"#,
        );
        assert!(parsed.is_err());
    }
}
