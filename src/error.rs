use std::collections::BTreeMap;

use argon2::Error as Argon2Error;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind as JwtErrorKind};
use log::error;
use mongodb::error::Error as DbError;
use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::{json, Error as JsonError, Json},
    Request,
};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Message shown to clients in place of any internal failure.
pub const GENERIC_SERVER_ERROR: &str = "Something went wrong on our side, please try again later.";

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Argon2(#[from] Argon2Error),
    #[error("The given data was invalid: {0}")]
    Validation(ValidationErrors),
    #[error("{1}")]
    Status(Status, String),
}

impl Error {
    pub fn not_found(what: String) -> Self {
        Self::Status(Status::NotFound, format!("Not found: {what}"))
    }

    pub fn unauthorized(why: impl Into<String>) -> Self {
        Self::Status(Status::Unauthorized, why.into())
    }

    /// The HTTP status this error is reported with.
    pub fn status(&self) -> Status {
        match self {
            Self::Db(_) | Self::Argon2(_) => Status::InternalServerError,
            Self::Jwt(_) => Status::Unauthorized,
            Self::Validation(_) => Status::UnprocessableEntity,
            Self::Status(status, _) => *status,
        }
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

/// A request body that could not be read as JSON of the expected shape.
/// Shape errors are reported against the `body` field.
impl From<JsonError<'_>> for Error {
    fn from(err: JsonError<'_>) -> Self {
        match err {
            JsonError::Parse(_, e) => {
                let mut errors = ValidationErrors::new();
                errors.add("body", e.to_string());
                Self::Validation(errors)
            }
            JsonError::Io(e) => Self::Status(
                Status::BadRequest,
                format!("Failed to read request body: {e}"),
            ),
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        let body = match self {
            Self::Validation(errors) => json!({
                "message": "The given data was invalid.",
                "errors": errors,
            }),
            Self::Jwt(err) => {
                let message = match err.kind() {
                    JwtErrorKind::ExpiredSignature => "Authentication token has expired.",
                    _ => "Invalid authentication token.",
                };
                json!({ "message": message })
            }
            Self::Status(status, message) if status.code < 500 => {
                json!({ "message": message })
            }
            err => {
                // Internal detail stays in the logs.
                error!("{err}");
                json!({ "message": GENERIC_SERVER_ERROR })
            }
        };
        (status, Json(body)).respond_to(req)
    }
}

/// Field-level validation failures, keyed by the path of the offending field
/// (e.g. `email` or `responses.3.answer`).
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure against the given field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The messages recorded against a field, if any.
    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Succeed with `value` only if nothing was recorded.
    pub fn into_result<T>(self, value: T) -> std::result::Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields = self.0.keys().map(String::as_str).collect::<Vec<_>>();
        write!(f, "invalid fields [{}]", fields.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_group_by_field() {
        let mut errors = ValidationErrors::new();
        assert!(errors.is_empty());

        errors.add("email", "The email field is required.");
        errors.add("email", "The email must be a valid email address.");
        errors.add("responses.3.answer", "The answer field is required.");

        assert_eq!(errors.field("email").unwrap().len(), 2);
        assert_eq!(errors.field("responses.3.answer").unwrap().len(), 1);
        assert_eq!(errors.field("responses.4.answer"), None);
        assert_eq!(
            errors.to_string(),
            "invalid fields [email, responses.3.answer]"
        );
        assert!(errors.into_result(()).is_err());
    }

    #[test]
    fn malformed_bodies_report_the_body_field() {
        let input = r#"{"responses": {"1": {"answer": true}}}"#;
        let parse_error = rocket::serde::json::serde_json::from_str::<
            crate::model::api::submission::SurveySubmission,
        >(input)
        .unwrap_err();
        let err = Error::from(JsonError::Parse(input, parse_error));
        assert_eq!(err.status(), Status::UnprocessableEntity);
        match err {
            Error::Validation(errors) => assert_eq!(errors.field("body").map(<[String]>::len), Some(1)),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn statuses() {
        assert_eq!(
            Error::from(ValidationErrors::new()).status(),
            Status::UnprocessableEntity
        );
        assert_eq!(Error::not_found("x".into()).status(), Status::NotFound);
        assert_eq!(Error::unauthorized("no").status(), Status::Unauthorized);
    }
}
